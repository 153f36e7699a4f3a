//! In-process implementation of the engine ABI.
//!
//! Linear memory layout:
//!
//! ```text
//! [0, 8)          reserved, offset 0 is null
//! [8, data)       query input slot
//! [data, scratch) constant data: diagnostic formats and role names
//! [scratch, heap) varargs area for host callbacks
//! [heap, len)     bump heap, rewound by `reset`
//! ```

use kvsearch_common::{Result, error::Error, verify_arg, verify_data};
use kvsearch_memory::{MemoryCursor, MemoryWriter};
use roaring::RoaringBitmap;

use crate::{EngineHost, QueryEngine, Role, protocol::request_size};

const INPUT_SLOT: usize = 8;
const VARARGS_SIZE: usize = 64;
const HEAP_ALIGN: usize = 8;

const QUERY_FORMAT: &str =
    "run_query: require=%u contain=%u exclude=%u matched=%llu returned=%u";
const BITMAP_FORMAT: &str = "run_query: undecodable %s bitmap #%u at 0x%x (%u bytes)";
const OOM_FORMAT: &str = "run_query: out of memory allocating %u bytes (%u free)";

#[derive(Debug, Clone)]
pub struct NativeEngineOptions {
    /// Size of the linear memory in bytes.
    pub memory_size: usize,
    /// Maximum number of document ids in one result, at most 255.
    pub max_results: usize,
    /// Ids `[0, document_count)` form the universe of exclude-only queries.
    pub document_count: u32,
    /// Sizes the input slot.
    pub max_query_terms: usize,
}

impl Default for NativeEngineOptions {
    fn default() -> Self {
        NativeEngineOptions {
            memory_size: 16 * 1024 * 1024,
            max_results: 50,
            document_count: 0,
            max_query_terms: 50,
        }
    }
}

/// Offsets of the constant data written at construction.
#[derive(Debug, Clone, Copy)]
struct DataSegment {
    query_format: u32,
    bitmap_format: u32,
    oom_format: u32,
    role_names: [u32; 3],
}

enum Arg {
    U32(u32),
    U64(u64),
    Ptr(u32),
}

pub struct NativeEngine {
    memory: Vec<u8>,
    options: NativeEngineOptions,
    data: DataSegment,
    input_capacity: usize,
    varargs: usize,
    heap_start: usize,
    heap_top: usize,
}

impl NativeEngine {
    pub fn new(options: NativeEngineOptions) -> Result<NativeEngine> {
        verify_arg!(max_results, options.max_results <= u8::MAX as usize);
        verify_arg!(memory_size, options.memory_size <= u32::MAX as usize);

        let input_capacity = request_size(options.max_query_terms);
        let mut memory = vec![0u8; options.memory_size];
        let mut writer = MemoryWriter::at(&mut memory, INPUT_SLOT + input_capacity);
        let mut put = |text: &str| -> Result<u32> {
            let offset = writer.position() as u32;
            writer.write_all(text.as_bytes())?.write_all(&[0])?;
            Ok(offset)
        };
        let data = DataSegment {
            query_format: put(QUERY_FORMAT)?,
            bitmap_format: put(BITMAP_FORMAT)?,
            oom_format: put(OOM_FORMAT)?,
            role_names: [
                put(Role::Require.name())?,
                put(Role::Contain.name())?,
                put(Role::Exclude.name())?,
            ],
        };
        let varargs = align_up(writer.position(), HEAP_ALIGN);
        let heap_start = varargs + VARARGS_SIZE;
        if heap_start >= options.memory_size {
            return Err(Error::invalid_arg(
                "memory_size",
                format!("{} bytes leave no room for the heap", options.memory_size),
            ));
        }

        Ok(NativeEngine {
            memory,
            options,
            data,
            input_capacity,
            varargs,
            heap_start,
            heap_top: heap_start,
        })
    }

    pub fn options(&self) -> &NativeEngineOptions {
        &self.options
    }

    /// Bytes left on the heap.
    pub fn available(&self) -> usize {
        self.memory.len() - align_up(self.heap_top, HEAP_ALIGN).min(self.memory.len())
    }

    fn bump(&mut self, size: usize) -> Option<u32> {
        let start = align_up(self.heap_top, HEAP_ALIGN);
        let end = start.checked_add(size)?;
        if end > self.memory.len() {
            return None;
        }
        self.heap_top = end;
        Some(start as u32)
    }

    /// Lays out `format` and `args` in the varargs area and returns its offset.
    fn emit(&mut self, format: u32, args: &[Arg]) -> Result<u32> {
        let mut writer = MemoryWriter::at(&mut self.memory, self.varargs);
        writer.write_u32_le(format)?;
        for arg in args {
            match *arg {
                Arg::U32(v) | Arg::Ptr(v) => writer.write_u32_le(v)?,
                Arg::U64(v) => writer.write_all(&v.to_le_bytes())?,
            };
        }
        verify_data!(varargs, writer.position() <= self.heap_start);
        Ok(self.varargs as u32)
    }

    fn fatal(&mut self, host: &dyn EngineHost, format: u32, args: &[Arg]) -> Error {
        match self.emit(format, args) {
            Ok(ptr) => host.log_fatal(&self.memory, ptr),
            Err(e) => e,
        }
    }

    fn read_request(&self, input: u32) -> Result<[Vec<(u32, u32)>; 3]> {
        let mut cursor = MemoryCursor::at(&self.memory, input as usize);
        let max_pairs = self.options.max_query_terms;
        let mut total = 0;
        let mut request: [Vec<(u32, u32)>; 3] = Default::default();
        for pairs in request.iter_mut() {
            loop {
                let len = cursor.read_u32_le()?;
                if len == 0 {
                    break;
                }
                let ptr = cursor.read_u32_le()?;
                total += 1;
                verify_data!(request, total <= max_pairs);
                pairs.push((len, ptr));
            }
        }
        Ok(request)
    }

    fn decode_bitmaps(
        &mut self,
        host: &dyn EngineHost,
        role: Role,
        pairs: &[(u32, u32)],
    ) -> Result<Vec<RoaringBitmap>> {
        let mut bitmaps = Vec::with_capacity(pairs.len());
        for (index, &(len, ptr)) in pairs.iter().enumerate() {
            let decoded = MemoryCursor::at(&self.memory, ptr as usize)
                .read_slice(len as usize)
                .ok()
                .and_then(|bytes| RoaringBitmap::deserialize_from(bytes).ok());
            match decoded {
                Some(bitmap) => bitmaps.push(bitmap),
                None => {
                    let args = [
                        Arg::Ptr(self.data.role_names[role as usize]),
                        Arg::U32(index as u32),
                        Arg::U32(ptr),
                        Arg::U32(len),
                    ];
                    return Err(self.fatal(host, self.data.bitmap_format, &args));
                }
            }
        }
        Ok(bitmaps)
    }

    fn write_result(&mut self, host: &dyn EngineHost, ids: &[u32], more: bool) -> Result<u32> {
        let size = 4 + ids.len() * 4;
        let Some(ptr) = self.bump(size) else {
            let args = [Arg::U32(size as u32), Arg::U32(self.available() as u32)];
            return Err(self.fatal(host, self.data.oom_format, &args));
        };
        let mut writer = MemoryWriter::at(&mut self.memory, ptr as usize);
        writer.write_all(&[ids.len() as u8, more as u8, 0, 0])?;
        for &id in ids {
            writer.write_u32_le(id)?;
        }
        Ok(ptr)
    }
}

/// `(AND require) & (OR contain) - (OR exclude)`, where a missing
/// require/contain side leaves the other one alone and both missing means
/// every id below `document_count`.
pub fn combine(
    require: Vec<RoaringBitmap>,
    contain: Vec<RoaringBitmap>,
    exclude: Vec<RoaringBitmap>,
    document_count: u32,
) -> RoaringBitmap {
    let required = require.into_iter().reduce(|acc, b| acc & b);
    let contained = contain.into_iter().reduce(|acc, b| acc | b);
    let mut matched = match (required, contained) {
        (Some(r), Some(c)) => r & c,
        (Some(r), None) => r,
        (None, Some(c)) => c,
        (None, None) => {
            let mut universe = RoaringBitmap::new();
            universe.insert_range(0..document_count);
            universe
        }
    };
    for excluded in exclude {
        matched -= excluded;
    }
    matched
}

impl QueryEngine for NativeEngine {
    fn reset(&mut self) {
        self.heap_top = self.heap_start;
    }

    fn allocate(&mut self, size: u32) -> Result<u32> {
        self.bump(size as usize).ok_or_else(|| {
            log::error!(
                "Engine allocation of {size} bytes failed, {} bytes free",
                self.available()
            );
            Error::engine_failure(format!("out of engine memory allocating {size} bytes"))
        })
    }

    fn init_query_buffer(&mut self) -> Result<u32> {
        Ok(INPUT_SLOT as u32)
    }

    fn input_capacity(&self) -> usize {
        self.input_capacity
    }

    fn run_query(&mut self, input: u32, host: &dyn EngineHost) -> Result<u32> {
        let [require, contain, exclude] = self.read_request(input)?;
        let counts = [require.len(), contain.len(), exclude.len()];
        if counts.iter().all(|&n| n == 0) {
            return Ok(0);
        }

        let require = self.decode_bitmaps(host, Role::Require, &require)?;
        let contain = self.decode_bitmaps(host, Role::Contain, &contain)?;
        let exclude = self.decode_bitmaps(host, Role::Exclude, &exclude)?;
        let matched = combine(require, contain, exclude, self.options.document_count);

        let ids = matched
            .iter()
            .take(self.options.max_results)
            .collect::<Vec<_>>();
        let more = matched.len() > ids.len() as u64;

        let args = [
            Arg::U32(counts[0] as u32),
            Arg::U32(counts[1] as u32),
            Arg::U32(counts[2] as u32),
            Arg::U64(matched.len()),
            Arg::U32(ids.len() as u32),
        ];
        let ptr = self.emit(self.data.query_format, &args)?;
        host.log_info(&self.memory, ptr)?;

        self.write_result(host, &ids, more)
    }

    fn memory(&self) -> &[u8] {
        &self.memory
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }
}

fn align_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}
