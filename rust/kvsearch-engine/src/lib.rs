//! The set-operations query engine and the binary protocol used to drive it.
//!
//! The engine is a separate component with its own flat linear memory. The
//! host talks to it only through a handful of entry points that exchange
//! 32-bit offsets into that memory ([`QueryEngine`]); the engine talks back
//! through two diagnostic callbacks ([`EngineHost`]) whose arguments are
//! `printf`-style varargs laid out in its memory.
//!
//! An engine instance is not reentrant: one query at a time, and `reset`
//! before each query. [`EnginePool`] hands out exclusive leases.

pub mod host;
pub mod native;
pub mod pool;
pub mod protocol;
pub mod role;

use kvsearch_common::{Result, error::Error};

pub use host::DiagnosticHost;
pub use native::{NativeEngine, NativeEngineOptions};
pub use pool::{EngineLease, EnginePool};
pub use protocol::{QueryResult, build_query_request, execute_query, request_size};
pub use role::{ByRole, Role};

/// The engine's exported entry points.
///
/// Offsets returned by the engine are absolute positions in [`memory`](Self::memory);
/// `0` is the null offset and never a valid allocation.
pub trait QueryEngine: Send + 'static {
    /// Clears all per-query state, including every allocation.
    fn reset(&mut self);

    /// Allocates `size` bytes of engine memory for a serialized postings list.
    fn allocate(&mut self, size: u32) -> Result<u32>;

    /// Returns the offset of the slot the request must be written to.
    fn init_query_buffer(&mut self) -> Result<u32>;

    /// Size in bytes of the slot returned by `init_query_buffer`. Requests
    /// larger than this must not be written.
    fn input_capacity(&self) -> usize;

    /// Runs the request stored at `input`.
    ///
    /// Returns the offset of the result structure, or `0` for "no result".
    /// Diagnostics are reported through `host`; a fatal diagnostic aborts the
    /// query with the error produced by [`EngineHost::log_fatal`].
    fn run_query(&mut self, input: u32, host: &dyn EngineHost) -> Result<u32>;

    fn memory(&self) -> &[u8];

    fn memory_mut(&mut self) -> &mut [u8];
}

/// The host callbacks imported by the engine.
///
/// `args` is the offset of a varargs area in `memory`: a pointer to the
/// format string followed by the packed arguments.
pub trait EngineHost: Send + Sync {
    /// Informational diagnostic; processing continues.
    fn log_info(&self, memory: &[u8], args: u32) -> Result<()>;

    /// Fatal diagnostic; returns the error that terminates the request.
    fn log_fatal(&self, memory: &[u8], args: u32) -> Error;
}
