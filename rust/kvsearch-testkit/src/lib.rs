//! Test utilities for the kvsearch workspace.
//!
//! This crate provides:
//! - Writers for the packed BST blob and lookup table layouts
//! - Postings list serialization
//! - Fixture corpora loaded into an in-memory store, along with the matching
//!   service configuration
//!
//! It stands in for the index build in tests; production blobs come from the
//! build pipeline.

pub mod corpus;
pub mod packer;
pub mod postings;

pub use corpus::{CorpusBuilder, FixtureEncoding, PackedCorpus, foo_bar_corpus};
