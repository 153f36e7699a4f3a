//! Binary request/response contract between the host and a [`QueryEngine`].
//!
//! Request layout, for each role in the order require, contain, exclude:
//!
//! ```text
//! (len: u32 LE, ptr: u32 LE) * n, 0u32
//! ```
//!
//! where `ptr` is an engine allocation holding the serialized bitmap.
//!
//! Result layout at the offset returned by `run_query`:
//!
//! ```text
//! count: u8, more: u8, pad: [u8; 2], ids: [u32 LE; count]
//! ```

use kvsearch_common::{Result, error::Error, verify_data};
use kvsearch_memory::{MemoryCursor, MemoryWriter};

use crate::{ByRole, EngineHost, QueryEngine, Role};

/// Decoded engine response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryResult {
    /// The engine stopped at its result limit; more documents matched.
    pub more: bool,
    /// Matching document ids, in engine order.
    pub documents: Vec<u32>,
}

/// Bytes taken by a request carrying `bitmaps` postings lists.
pub fn request_size(bitmaps: usize) -> usize {
    (bitmaps * 2 + Role::ALL.len()) * 4
}

/// Copies every bitmap into engine memory and returns the request bytes.
///
/// The engine must have been reset by the caller; allocations made here live
/// until the next reset.
pub fn build_query_request<E>(engine: &mut E, bitmaps: &ByRole<Vec<u8>>) -> Result<Vec<u8>>
where
    E: QueryEngine + ?Sized,
{
    let mut request = Vec::with_capacity(request_size(bitmaps.len()));
    for role in Role::ALL {
        for bitmap in bitmaps.get(role) {
            verify_data!(bitmap, !bitmap.is_empty());
            let len = u32::try_from(bitmap.len()).map_err(|_| {
                Error::invalid_arg("bitmap", "larger than the engine address space")
            })?;
            let ptr = engine.allocate(len)?;
            MemoryWriter::at(engine.memory_mut(), ptr as usize).write_all(bitmap)?;
            request.extend_from_slice(&len.to_le_bytes());
            request.extend_from_slice(&ptr.to_le_bytes());
        }
        request.extend_from_slice(&0u32.to_le_bytes());
    }
    Ok(request)
}

/// Writes `request` into the engine's input slot and runs it.
///
/// Returns `None` when the engine produced no result. A request larger than
/// the input slot is rejected before anything is written.
pub fn execute_query<E>(
    engine: &mut E,
    host: &dyn EngineHost,
    request: &[u8],
) -> Result<Option<QueryResult>>
where
    E: QueryEngine + ?Sized,
{
    let capacity = engine.input_capacity();
    if request.len() > capacity {
        return Err(Error::invalid_arg(
            "request",
            format!(
                "{} bytes exceed the engine input slot of {capacity} bytes",
                request.len()
            ),
        ));
    }
    let input = engine.init_query_buffer()?;
    MemoryWriter::at(engine.memory_mut(), input as usize).write_all(request)?;
    let output = engine.run_query(input, host)?;
    if output == 0 {
        return Ok(None);
    }
    decode_query_result(MemoryCursor::at(engine.memory(), output as usize)).map(Some)
}

pub fn decode_query_result(mut cursor: MemoryCursor<'_>) -> Result<QueryResult> {
    let count = cursor.read_u8()?;
    let more = cursor.read_bool()?;
    cursor.skip(2)?;
    let documents = (0..count)
        .map(|_| cursor.read_u32_le())
        .collect::<Result<Vec<_>>>()?;
    Ok(QueryResult { more, documents })
}
