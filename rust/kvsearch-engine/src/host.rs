use kvsearch_common::{Result, error::Error};
use kvsearch_memory::MemoryCursor;
use kvsearch_printf::format_varargs;

use crate::EngineHost;

/// Host side of the engine's diagnostic callbacks: renders the varargs into a
/// line and routes it to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiagnosticHost;

impl DiagnosticHost {
    pub fn format(memory: &[u8], args: u32) -> Result<String> {
        format_varargs(MemoryCursor::at(memory, args as usize))
    }
}

impl EngineHost for DiagnosticHost {
    fn log_info(&self, memory: &[u8], args: u32) -> Result<()> {
        let line = Self::format(memory, args)?;
        log::info!(target: "kvsearch::engine", "{line}");
        Ok(())
    }

    fn log_fatal(&self, memory: &[u8], args: u32) -> Error {
        match Self::format(memory, args) {
            Ok(line) => {
                log::error!(target: "kvsearch::engine", "{line}");
                Error::engine_failure(format!("[fprintf] {line}"))
            }
            Err(e) => {
                log::error!(target: "kvsearch::engine", "Undecodable fatal diagnostic at {args}: {e}");
                e
            }
        }
    }
}
