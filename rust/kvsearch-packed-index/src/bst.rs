//! Traversal of a binary search tree serialized into one blob.
//!
//! Node layout (all integers big-endian):
//!
//! ```text
//! key          (see `PackedKey`)
//! left         i32, offset of the left child or -1
//! right        i32, offset of the right child or -1
//! value_len    u32
//! value        [u8; value_len]
//! ```

use std::cmp::Ordering;

use kvsearch_common::{Result, error::Error};
use kvsearch_memory::MemoryCursor;

use crate::{collation::Collation, key::PackedKey};

/// Marks an absent child.
pub const NO_CHILD: i32 = -1;

/// Looks up `key` starting at the node at `anchor`.
///
/// Returns the value bytes on an exact match and `None` when the descent
/// reaches a missing child.
pub fn find<'a, K: PackedKey>(
    blob: &'a [u8],
    anchor: usize,
    key: &K,
    collation: &dyn Collation,
) -> Result<Option<&'a [u8]>> {
    let mut node = MemoryCursor::at(blob, anchor);
    // A well-formed tree is visited at most once per node; anything longer is a cycle.
    let mut budget = blob.len();
    loop {
        let node_key = K::read(&mut node)?;
        let left = node.read_i32_be()?;
        let right = node.read_i32_be()?;
        let value_len = node.read_u32_be()? as usize;

        let next = match key.compare_ref(&node_key, collation) {
            Ordering::Equal => return node.read_slice(value_len).map(Some),
            Ordering::Less => left,
            Ordering::Greater => right,
        };
        if next == NO_CHILD {
            return Ok(None);
        }
        if next < 0 || budget == 0 {
            return Err(Error::invalid_format(
                "bst node",
                format!("child offset {next} at {}", node.position()),
            ));
        }
        budget -= 1;
        node.jump_to(next as usize);
    }
}

#[cfg(test)]
mod tests {
    use kvsearch_testkit::packer::{BstPacker, PackedKeyBytes};

    use super::find;
    use crate::collation::BinaryCollation;

    fn numeric_blob() -> (Vec<u8>, usize) {
        let entries = [1u32, 5, 9, 20]
            .into_iter()
            .map(|k| (PackedKeyBytes::U32(k), format!("v{k}").into_bytes()))
            .collect::<Vec<_>>();
        let packed = BstPacker::new().pack(&entries);
        (packed.bytes, packed.root as usize)
    }

    #[test]
    fn test_numeric_hits_and_misses() {
        let (blob, root) = numeric_blob();
        for k in [1u32, 5, 9, 20] {
            let value = find(&blob, root, &k, &BinaryCollation).unwrap();
            assert_eq!(value, Some(format!("v{k}").as_bytes()));
        }
        for k in [0u32, 3, 6, 10, 21, u32::MAX] {
            assert_eq!(find(&blob, root, &k, &BinaryCollation).unwrap(), None);
        }
    }

    #[test]
    fn test_text_keys() {
        let entries = ["apple", "banana", "cherry", "date", "elder"]
            .into_iter()
            .map(|k| (PackedKeyBytes::Text(k.to_string()), k.to_uppercase().into_bytes()))
            .collect::<Vec<_>>();
        let packed = BstPacker::new().pack(&entries);
        let root = packed.root as usize;
        let hit = find(&packed.bytes, root, &"cherry".to_string(), &BinaryCollation).unwrap();
        assert_eq!(hit, Some(&b"CHERRY"[..]));
        let miss = find(&packed.bytes, root, &"coconut".to_string(), &BinaryCollation).unwrap();
        assert_eq!(miss, None);
    }

    #[test]
    fn test_truncated_blob_fails() {
        let (blob, root) = numeric_blob();
        assert!(find(&blob[..blob.len() - 1], root, &20u32, &BinaryCollation).is_err());
        assert!(find(&blob, blob.len() + 4, &1u32, &BinaryCollation).is_err());
    }

    #[test]
    fn test_cycle_is_detected() {
        // A single node whose right child points back at itself.
        let mut blob = Vec::new();
        blob.extend_from_slice(&7u32.to_be_bytes());
        blob.extend_from_slice(&(-1i32).to_be_bytes());
        blob.extend_from_slice(&0i32.to_be_bytes());
        blob.extend_from_slice(&0u32.to_be_bytes());
        assert!(find(&blob, 0, &8u32, &BinaryCollation).is_err());
        assert_eq!(find(&blob, 0, &7u32, &BinaryCollation).unwrap(), Some(&[][..]));
    }
}
