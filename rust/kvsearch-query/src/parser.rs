//! Query string grammar:
//!
//! ```text
//! query   := "?q=" segment*
//! segment := role "_" term ("&" | end)
//! role    := "0" | "1" | "2"
//! term    := percent-encoded UTF-8, one or more bytes other than "&"
//! ```

use kvsearch_common::{Result, error::Error};
use kvsearch_engine::{ByRole, Role};
use percent_encoding::percent_decode_str;

pub const QUERY_PREFIX: &str = "?q=";

/// Parses a raw query string, `?` included, into per-role term lists.
///
/// Nothing is returned for a query that is only partly valid.
pub fn parse_query(query: &str) -> Result<ByRole<String>> {
    let malformed = || Error::malformed_query(query);
    let mut rest = query.strip_prefix(QUERY_PREFIX).ok_or_else(malformed)?;

    let mut terms = ByRole::new();
    while !rest.is_empty() {
        let (segment, tail) = match rest.find('&') {
            Some(pos) => (&rest[..pos], &rest[pos + 1..]),
            None => (rest, ""),
        };
        let (role, term) = parse_segment(segment).ok_or_else(malformed)?;
        terms.push(role, term);
        rest = tail;
    }
    Ok(terms)
}

fn parse_segment(segment: &str) -> Option<(Role, String)> {
    let bytes = segment.as_bytes();
    if bytes.len() < 3 || bytes[1] != b'_' {
        return None;
    }
    let role = Role::from_digit(bytes[0])?;
    let term = decode_term(&segment[2..])?;
    Some((role, term))
}

/// Percent-decodes a term. Stray `%` signs and non-UTF-8 results are rejected.
fn decode_term(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    for (i, _) in bytes.iter().enumerate().filter(|(_, b)| **b == b'%') {
        let escape = bytes.get(i + 1..i + 3)?;
        if !escape.iter().all(u8::is_ascii_hexdigit) {
            return None;
        }
    }
    percent_decode_str(encoded)
        .decode_utf8()
        .ok()
        .map(|term| term.into_owned())
}
