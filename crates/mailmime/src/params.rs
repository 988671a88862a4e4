//! Header-body parameter handling: `value; name=x; other="quoted"`.
//!
//! The grammar here is deliberately the permissive split-on-`;` form that
//! real mail traffic demands, not a strict RFC 2045 parameter parser:
//! segments without an `=` are skipped silently and nothing in this
//! module returns an error.

use crate::rfc2047::decode_encoded_words;
use std::collections::HashMap;

/// Remove embedded CR/LF ("unfolding").
pub fn unfold(s: &str) -> String {
    s.chars().filter(|&c| c != '\r' && c != '\n').collect()
}

/// Unfold `s`, then decode any RFC 2047 encoded-words.
/// `fallback_charset` supplies charset context for malformed words (for
/// example from the enclosing message's declared charset); decoding never
/// fails, malformed input is returned as literal text.
pub fn unfold_and_decode(s: &str, fallback_charset: Option<&str>) -> String {
    decode_encoded_words(&unfold(s), fallback_charset)
}

/// The primary value of a header body: the trimmed text before the first
/// `;`. `header_value("text/html; charset=utf-8")` is `"text/html"`.
pub fn header_value(header_body: &str) -> String {
    let unfolded = unfold(header_body);
    unfolded
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_string()
}

/// Look up a single named parameter, case-insensitive. Returns None when
/// the parameter is absent.
pub fn header_parameter(header_body: &str, name: &str) -> Option<String> {
    all_parameters(header_body).remove(&name.to_ascii_lowercase())
}

/// The full parameter map of a header body, with names lower-cased.
/// Segments without an `=` are skipped; quoted values are dequoted. An
/// empty parameter list is not an error: the map is simply empty.
pub fn all_parameters(header_body: &str) -> HashMap<String, String> {
    let unfolded = unfold(header_body);
    let mut parameters = HashMap::new();

    for segment in unfolded.split(';').skip(1) {
        let Some((name, value)) = segment.split_once('=') else {
            continue;
        };
        parameters.insert(
            name.trim().to_ascii_lowercase(),
            unquote(value.trim()).to_string(),
        );
    }

    parameters
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
