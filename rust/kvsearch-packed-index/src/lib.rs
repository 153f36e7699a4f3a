//! Disk index access over packed blobs in the key-value store.
//!
//! Two levels: an in-memory sorted [`LookupTable`] picks the package blob that
//! covers a key, and [`bst::find`] walks the binary search tree serialized
//! inside that blob to the exact key. A missing key is `Ok(None)`.

pub mod bst;
pub mod collation;
pub mod key;
pub mod lookup_table;
pub mod reader;

pub use collation::{Collation, CollationKind};
pub use key::PackedKey;
pub use lookup_table::{LookupEntry, LookupTable};
pub use reader::PackedIndexReader;
