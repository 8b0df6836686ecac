//! store::scalar
//!
//! Codec for the TOML string-scalar subset used by the metadata file.
//!
//! # Design
//!
//! The metadata file only ever stores strings (versions, checksums, URLs,
//! repository slugs), so this module understands exactly three quoted forms:
//!
//! - basic strings: `"..."` with `\n \r \t \\ \"` escapes
//! - literal strings: `'...'`, contents verbatim
//! - multi-line literal strings: `'''...'''`, contents verbatim
//!
//! Anything else decodes as-is. `encode` picks the form that needs the least
//! escaping and never emits escape sequences: a value that cannot be written
//! as a basic string without escapes is written as a literal instead.
//!
//! # Round-trip
//!
//! For every value `encode` accepts, `decode(encode(v)) == v`. See the
//! property test in `tests/property_tests.rs`.

use thiserror::Error;

/// Errors from scalar encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScalarError {
    /// The value fits none of the supported literal forms.
    #[error("value has no representable scalar form: {0:?}")]
    Unrepresentable(String),
}

/// Decode a raw scalar into its logical string value.
///
/// Recognizes, in order: triple-quoted literal, single-quoted literal,
/// double-quoted basic string. Unquoted input is returned unchanged.
pub fn decode(raw: &str) -> String {
    if let Some(inner) = strip_delimited(raw, "'''") {
        return inner.to_string();
    }
    if let Some(inner) = strip_delimited(raw, "'") {
        return inner.to_string();
    }
    if let Some(inner) = strip_delimited(raw, "\"") {
        return unescape_basic(inner);
    }
    raw.to_string()
}

/// Encode a logical string value as a raw scalar, minimal escaping first.
///
/// Preference order: basic string when no escaping would be needed, then
/// single-quoted literal, then triple-quoted literal. A value containing
/// `'''` fits none of these and is rejected.
pub fn encode(value: &str) -> Result<String, ScalarError> {
    if !value.contains(['\\', '"', '\n', '\r', '\t']) {
        return Ok(format!("\"{value}\""));
    }
    if !value.contains('\'') {
        return Ok(format!("'{value}'"));
    }
    if !value.contains("'''") {
        return Ok(format!("'''{value}'''"));
    }
    Err(ScalarError::Unrepresentable(value.to_string()))
}

/// Strip a matching delimiter pair, or None if `raw` is not wrapped in it.
fn strip_delimited<'a>(raw: &'a str, delim: &str) -> Option<&'a str> {
    if raw.len() >= delim.len() * 2 && raw.starts_with(delim) && raw.ends_with(delim) {
        Some(&raw[delim.len()..raw.len() - delim.len()])
    } else {
        None
    }
}

/// Process basic-string escapes in a single left-to-right scan.
///
/// Unknown escape sequences (and a trailing lone backslash) pass through
/// unchanged rather than failing: the store never writes them, but hand
/// edited files should not break lookup.
fn unescape_basic(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_basic_string() {
        assert_eq!(decode("\"1.2.3\""), "1.2.3");
        assert_eq!(decode("\"a\\tb\\nc\""), "a\tb\nc");
        assert_eq!(decode("\"quote \\\" backslash \\\\\""), "quote \" backslash \\");
    }

    #[test]
    fn decode_literal_forms() {
        assert_eq!(decode("'raw \\n stays'"), "raw \\n stays");
        assert_eq!(decode("'''it's literal'''"), "it's literal");
    }

    #[test]
    fn decode_unquoted_is_verbatim() {
        assert_eq!(decode("1.2.3"), "1.2.3");
        assert_eq!(decode(""), "");
    }

    #[test]
    fn decode_sequential_escapes_are_not_reinterpreted() {
        // A backslash escape followed by a char that looks like another
        // escape must decode in one pass: `\\n` is backslash + 'n'.
        assert_eq!(decode("\"\\\\n\""), "\\n");
    }

    #[test]
    fn encode_prefers_basic() {
        assert_eq!(encode("1.2.3").unwrap(), "\"1.2.3\"");
        assert_eq!(encode("").unwrap(), "\"\"");
    }

    #[test]
    fn encode_falls_back_to_literal() {
        assert_eq!(encode("has\"quote").unwrap(), "'has\"quote'");
        assert_eq!(
            encode("has'quote and \\ backslash").unwrap(),
            "'''has'quote and \\ backslash'''"
        );
    }

    #[test]
    fn encode_rejects_triple_quote() {
        let err = encode("contains ''' inside \"too\"").unwrap_err();
        assert!(matches!(err, ScalarError::Unrepresentable(_)));
    }

    #[test]
    fn round_trip_spot_checks() {
        for v in ["", "v1.2.3", "a b\tc", "owner/repo", "it's", "\"both\" 'kinds'"] {
            assert_eq!(decode(&encode(v).unwrap()), v);
        }
    }
}
