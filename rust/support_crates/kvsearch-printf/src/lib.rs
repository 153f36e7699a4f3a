//! Rendering of `printf`-style diagnostics emitted by the query engine.
//!
//! The engine does not produce text; it passes the host a pointer to a
//! varargs area in its linear memory. The first slot of that area points to
//! the format string, the following slots hold the arguments packed in order
//! (4 bytes for default-width integers, 8 bytes for `ll`/`j` integers and
//! doubles, a 4-byte pointer for `%s`).
//!
//! Only the bare `%[length]type` form is accepted. Flags, width and precision
//! are rejected with a `FormatSpecifier` error since the engine never emits
//! them.

pub mod specifier;
pub mod value;

use kvsearch_common::{Result, error::Error};
use kvsearch_memory::MemoryCursor;

pub use specifier::Specifier;
pub use value::Value;

/// Formats the varargs area at the cursor position into a single line.
pub fn format_varargs(mut args: MemoryCursor<'_>) -> Result<String> {
    let format = args.read_pointer()?.read_c_str()?;
    format_with(format, &mut args)
}

/// Formats `format`, pulling one argument from `args` per specifier.
pub fn format_with(format: &str, args: &mut MemoryCursor<'_>) -> Result<String> {
    let mut out = String::with_capacity(format.len());
    let mut rest = format;
    while let Some(idx) = rest.find('%') {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        match Specifier::parse(tail) {
            Some(spec) => {
                if spec.has_modifiers() {
                    return Err(Error::format_specifier(
                        spec.text,
                        "unsupported format specifier",
                    ));
                }
                let value = value::decode(&spec, args)?;
                out.push_str(&value::render(spec.conversion, &value));
                rest = &tail[spec.text.len()..];
            }
            None => {
                out.push('%');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}
