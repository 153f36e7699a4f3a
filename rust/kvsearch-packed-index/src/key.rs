use std::{cmp::Ordering, fmt};

use kvsearch_common::{Result, error::Error};
use kvsearch_memory::MemoryCursor;

use crate::collation::Collation;

/// A key type that can be stored in a packed lookup table and a BST blob.
///
/// Text keys are serialized as a `u8` byte length followed by UTF-8 bytes;
/// integer keys as a big-endian `u32`.
pub trait PackedKey: fmt::Debug + fmt::Display + Send + Sync {
    /// The borrowed form decoded straight out of a blob.
    type Ref<'a>;

    /// Decodes a key at the cursor position.
    fn read<'a>(cursor: &mut MemoryCursor<'a>) -> Result<Self::Ref<'a>>;

    /// Compares `self` against a key decoded from a blob.
    fn compare_ref(&self, other: &Self::Ref<'_>, collation: &dyn Collation) -> Ordering;

    /// Compares two keys of the same table.
    fn compare(&self, other: &Self, collation: &dyn Collation) -> Ordering;
}

impl PackedKey for String {
    type Ref<'a> = &'a str;

    fn read<'a>(cursor: &mut MemoryCursor<'a>) -> Result<&'a str> {
        let offset = cursor.position();
        let bytes = cursor.read_u8_prefixed()?;
        std::str::from_utf8(bytes).map_err(|e| {
            Error::from(kvsearch_common::ErrorKind::InvalidFormat {
                element: "text key".to_string(),
                message: format!("at offset {offset}: {e}"),
            })
        })
    }

    fn compare_ref(&self, other: &&str, collation: &dyn Collation) -> Ordering {
        collation.compare(self, other)
    }

    fn compare(&self, other: &String, collation: &dyn Collation) -> Ordering {
        collation.compare(self, other)
    }
}

impl PackedKey for u32 {
    type Ref<'a> = u32;

    fn read<'a>(cursor: &mut MemoryCursor<'a>) -> Result<u32> {
        cursor.read_u32_be()
    }

    fn compare_ref(&self, other: &u32, _collation: &dyn Collation) -> Ordering {
        self.cmp(other)
    }

    fn compare(&self, other: &u32, _collation: &dyn Collation) -> Ordering {
        self.cmp(other)
    }
}
