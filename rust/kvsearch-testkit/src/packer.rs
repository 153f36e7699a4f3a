//! Writers for the packed binary layouts read by the search service: BST
//! blobs and the lookup table entries pointing into them.

use std::cmp::Ordering;

/// A serialized key: `u8` length + UTF-8 bytes for text, big-endian `u32`
/// for document ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackedKeyBytes {
    Text(String),
    U32(u32),
}

impl PackedKeyBytes {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            PackedKeyBytes::Text(s) => {
                let len = u8::try_from(s.len()).expect("text keys are at most 255 bytes");
                out.push(len);
                out.extend_from_slice(s.as_bytes());
            }
            PackedKeyBytes::U32(v) => out.extend_from_slice(&v.to_be_bytes()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PackedKeyBytes::Text(s) => serde_json::Value::from(s.as_str()),
            PackedKeyBytes::U32(v) => serde_json::Value::from(*v),
        }
    }
}

impl PartialOrd for PackedKeyBytes {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackedKeyBytes {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (PackedKeyBytes::Text(a), PackedKeyBytes::Text(b)) => a.cmp(b),
            (PackedKeyBytes::U32(a), PackedKeyBytes::U32(b)) => a.cmp(b),
            (PackedKeyBytes::Text(_), PackedKeyBytes::U32(_)) => Ordering::Greater,
            (PackedKeyBytes::U32(_), PackedKeyBytes::Text(_)) => Ordering::Less,
        }
    }
}

/// A serialized tree and the offset of its root node.
#[derive(Debug, Clone)]
pub struct PackedBst {
    pub bytes: Vec<u8>,
    pub root: u32,
}

/// Serializes sorted `(key, value)` pairs into a balanced BST.
///
/// Children are written before their parent, so every child offset is known
/// when the parent node is emitted; the root ends up last.
#[derive(Debug, Default)]
pub struct BstPacker {
    bytes: Vec<u8>,
}

impl BstPacker {
    pub fn new() -> BstPacker {
        Default::default()
    }

    /// Appends the tree to the blob under construction and returns its root offset.
    pub fn append(&mut self, entries: &[(PackedKeyBytes, Vec<u8>)]) -> u32 {
        assert!(!entries.is_empty(), "a package holds at least one entry");
        assert!(
            entries.windows(2).all(|w| w[0].0 < w[1].0),
            "entries must be sorted and unique"
        );
        self.write_subtree(entries)
    }

    /// Packs a single tree into its own blob.
    pub fn pack(mut self, entries: &[(PackedKeyBytes, Vec<u8>)]) -> PackedBst {
        let root = self.append(entries);
        PackedBst {
            bytes: self.bytes,
            root,
        }
    }

    fn write_subtree(&mut self, entries: &[(PackedKeyBytes, Vec<u8>)]) -> u32 {
        let mid = entries.len() / 2;
        let left = if mid > 0 {
            self.write_subtree(&entries[..mid]) as i32
        } else {
            -1
        };
        let right = if mid + 1 < entries.len() {
            self.write_subtree(&entries[mid + 1..]) as i32
        } else {
            -1
        };

        let offset = self.bytes.len() as u32;
        let (key, value) = &entries[mid];
        key.write_to(&mut self.bytes);
        self.bytes.extend_from_slice(&left.to_be_bytes());
        self.bytes.extend_from_slice(&right.to_be_bytes());
        self.bytes.extend_from_slice(&(value.len() as u32).to_be_bytes());
        self.bytes.extend_from_slice(value);
        offset
    }
}

/// A lookup table entry: the package's smallest key, its blob id and the
/// offset of its BST root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    pub key: PackedKeyBytes,
    pub blob_id: u32,
    pub root: u32,
}

impl PackageEntry {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!([self.key.to_json(), self.blob_id, self.root])
    }
}

/// Splits sorted entries into packages of at most `per_package` entries, one
/// blob per package.
pub fn pack_packages(
    entries: &[(PackedKeyBytes, Vec<u8>)],
    per_package: usize,
) -> (Vec<Vec<u8>>, Vec<PackageEntry>) {
    assert!(per_package > 0);
    let mut blobs = Vec::new();
    let mut table = Vec::new();
    for (blob_id, chunk) in entries.chunks(per_package).enumerate() {
        let packed = BstPacker::new().pack(chunk);
        table.push(PackageEntry {
            key: chunk[0].0.clone(),
            blob_id: blob_id as u32,
            root: packed.root,
        });
        blobs.push(packed.bytes);
    }
    (blobs, table)
}
