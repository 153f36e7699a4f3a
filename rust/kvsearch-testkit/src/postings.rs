//! Postings lists in the serialized roaring format the query engine consumes.

use roaring::RoaringBitmap;

pub fn serialize(bitmap: &RoaringBitmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(bitmap.serialized_size());
    bitmap
        .serialize_into(&mut out)
        .expect("serializing into a Vec cannot fail");
    out
}

/// Serializes a postings list from document ids.
pub fn from_ids(ids: impl IntoIterator<Item = u32>) -> Vec<u8> {
    serialize(&ids.into_iter().collect())
}
