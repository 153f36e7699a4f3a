//! Offset-indexed views over flat byte buffers.
//!
//! - `MemoryCursor`: sequential reader over `&[u8]`, with pointer dereference
//!   and forking for buffers that embed absolute offsets (engine linear memory,
//!   packed index blobs).
//! - `MemoryWriter`: sequential writer over `&mut [u8]`.
//!
//! Every access is bounds-checked and fails with an `InvalidFormat` error
//! instead of reading past the end of the buffer.

pub mod cursor;
pub mod writer;

pub use cursor::MemoryCursor;
pub use writer::MemoryWriter;
