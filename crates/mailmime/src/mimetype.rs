//! Case-insensitive MIME type predicates and wildcard matching.

/// True when both types are present and equal, ignoring ASCII case.
/// An absent type never matches anything, not even another absent type.
pub fn is_same_mime_type(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

pub fn is_multipart(mime_type: &str) -> bool {
    mime_type.len() >= 10 && mime_type.as_bytes()[..10].eq_ignore_ascii_case(b"multipart/")
}

/// True for `message/rfc822` specifically.
pub fn is_message(mime_type: &str) -> bool {
    is_same_mime_type(Some(mime_type), Some("message/rfc822"))
}

/// True for any `message/*` type.
pub fn is_message_type(mime_type: &str) -> bool {
    mime_type.len() >= 8 && mime_type.as_bytes()[..8].eq_ignore_ascii_case(b"message/")
}

/// Match `mime_type` against a pattern that may contain `*` wildcards,
/// e.g. `image/*` or `*/*`. The pattern is translated literally
/// (`*` -> `.*`) into a case-insensitive full-match regex, so callers
/// must not pass patterns containing other regex metacharacters and
/// expect literal behavior.
pub fn mime_type_matches(mime_type: &str, pattern: &str) -> bool {
    let pattern = format!("(?i)^{}$", pattern.replace('*', ".*"));
    match regex::Regex::new(&pattern) {
        Ok(re) => re.is_match(mime_type),
        Err(_) => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn same_type_null_asymmetry() {
        assert!(is_same_mime_type(Some("text/plain"), Some("TEXT/Plain")));
        assert!(!is_same_mime_type(None, Some("text/plain")));
        assert!(!is_same_mime_type(Some("text/plain"), None));
        assert!(!is_same_mime_type(None, None));
    }

    #[test]
    fn predicates() {
        assert!(is_multipart("multipart/MIXED"));
        assert!(!is_multipart("text/plain"));
        assert!(is_message("MESSAGE/rfc822"));
        assert!(!is_message("message/partial"));
        assert!(is_message_type("message/partial"));
        assert!(!is_message_type("multipart/digest"));
    }

    #[test]
    fn wildcard_matching() {
        assert!(mime_type_matches("image/png", "image/*"));
        assert!(mime_type_matches("IMAGE/PNG", "image/png"));
        assert!(mime_type_matches("anything/at-all", "*/*"));
        assert!(!mime_type_matches("text/plain", "image/*"));
    }
}
