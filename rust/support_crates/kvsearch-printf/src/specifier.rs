//! Tokenizer for `%[flags][width][.precision][length]type` conversion specifiers.

const FLAGS: &[u8] = b"-+ 0'#";

/// Length modifiers, longest first so that `ll` wins over `l` and `I64` over `I`.
const LENGTHS: &[&str] = &["hh", "ll", "I32", "I64", "h", "l", "L", "z", "j", "t", "I", "q"];

const CONVERSIONS: &[u8] = b"%diufFeEgGxXoscpaA";

/// A single conversion specifier found in a format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Specifier<'a> {
    /// The full specifier text, starting with `%`.
    pub text: &'a str,
    pub flags: &'a str,
    pub width: &'a str,
    pub precision: &'a str,
    pub length: &'a str,
    pub conversion: char,
}

impl<'a> Specifier<'a> {
    /// Parses a specifier at the start of `input`, which must begin with `%`.
    ///
    /// Returns `None` when the text does not form a specifier; callers copy the
    /// `%` through literally in that case.
    pub fn parse(input: &'a str) -> Option<Specifier<'a>> {
        let bytes = input.as_bytes();
        if bytes.first() != Some(&b'%') {
            return None;
        }
        let mut pos = 1;

        let flags_start = pos;
        while pos < bytes.len() && FLAGS.contains(&bytes[pos]) {
            pos += 1;
        }
        let flags = &input[flags_start..pos];

        let width_start = pos;
        pos = skip_count(bytes, pos);
        let width = &input[width_start..pos];

        let precision_start = pos;
        if bytes.get(pos) == Some(&b'.') {
            let after = skip_count(bytes, pos + 1);
            if after > pos + 1 {
                pos = after;
            }
        }
        let precision = &input[precision_start..pos];

        let rest = &input[pos..];
        let length = LENGTHS
            .iter()
            .copied()
            .find(|len| {
                rest.strip_prefix(len)
                    .and_then(|r| r.as_bytes().first())
                    .is_some_and(|c| CONVERSIONS.contains(c))
            })
            .unwrap_or("");
        pos += length.len();

        let conversion = *bytes.get(pos).filter(|c| CONVERSIONS.contains(*c))?;
        pos += 1;

        Some(Specifier {
            text: &input[..pos],
            flags,
            width,
            precision,
            length,
            conversion: conversion as char,
        })
    }

    /// Whether any of the flags, width or precision fields are present.
    pub fn has_modifiers(&self) -> bool {
        !self.flags.is_empty() || !self.width.is_empty() || !self.precision.is_empty()
    }
}

/// Skips a width or precision count: either `*` or a run of digits.
fn skip_count(bytes: &[u8], pos: usize) -> usize {
    match bytes.get(pos) {
        Some(b'*') => pos + 1,
        _ => {
            let mut end = pos;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            end
        }
    }
}
