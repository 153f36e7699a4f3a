//! Text collation strategies for key comparison within packed lookup tables
//! and BST blobs.
//!
//! The collation must match the order the index packer sorted the keys in;
//! binary search and BST descent are only correct under that same order.

use std::cmp::Ordering;

use serde::Deserialize;

/// Trait defining comparison rules for text keys.
pub trait Collation: Send + Sync + 'static {
    /// Returns the collation kind for identification and configuration.
    fn kind(&self) -> CollationKind;

    /// Returns the human-readable name of this collation strategy.
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Compares two keys. Must be a total order.
    fn compare(&self, left: &str, right: &str) -> Ordering;
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollationKind {
    /// Unicode code point order (the order of Rust's `str::cmp`).
    #[default]
    Binary,
    /// Case-insensitive primary order with case as the tie-breaker, close to
    /// the default ordering of locale-aware comparison.
    UnicodeCasePreserving,
}

impl CollationKind {
    pub const fn name(&self) -> &'static str {
        match self {
            CollationKind::Binary => "binary",
            CollationKind::UnicodeCasePreserving => "unicode-case-preserving",
        }
    }

    pub fn create(&self) -> Box<dyn Collation> {
        match self {
            CollationKind::Binary => Box::new(BinaryCollation),
            CollationKind::UnicodeCasePreserving => Box::new(UnicodeCasePreservingCollation),
        }
    }
}

pub struct BinaryCollation;

impl Collation for BinaryCollation {
    fn kind(&self) -> CollationKind {
        CollationKind::Binary
    }

    fn compare(&self, left: &str, right: &str) -> Ordering {
        left.cmp(right)
    }
}

/// Compares case-insensitively first and falls back to a character-by-character
/// comparison when the strings differ only in case.
pub struct UnicodeCasePreservingCollation;

impl Collation for UnicodeCasePreservingCollation {
    fn kind(&self) -> CollationKind {
        CollationKind::UnicodeCasePreserving
    }

    fn compare(&self, left: &str, right: &str) -> Ordering {
        compare_chars_by(left, right, |l, r| to_upper(l).cmp(&to_upper(r)))
            .then_with(|| left.cmp(right))
    }
}

/// Upper-cases a character, keeping characters whose upper case form expands
/// to several code points as they are.
fn to_upper(c: char) -> char {
    if c.is_lowercase() {
        let mut upper = c.to_uppercase();
        match (upper.next(), upper.next()) {
            (Some(ch), None) => ch,
            _ => c,
        }
    } else {
        c
    }
}

fn compare_chars_by<P>(lhs: &str, rhs: &str, cmp: P) -> Ordering
where
    P: Fn(char, char) -> Ordering,
{
    let mut lhs = lhs.chars();
    let mut rhs = rhs.chars();
    loop {
        match (lhs.next(), rhs.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => match cmp(l, r) {
                Ordering::Equal => (),
                non_eq => return non_eq,
            },
        }
    }
}
