//! RFC 2047 encoded-word encoding and decoding.
//!
//! Decoding is deliberately forgiving: header values are produced by many
//! non-conformant senders, so anything that fails to parse or decode is
//! passed through as literal text rather than reported as an error.

use charset::Charset;

static HEX_CHARS: &[u8] = &[
    b'0', b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b'A', b'B', b'C', b'D', b'E', b'F',
];

/// Encode `s` as one or more Q-encoded words, wrapping with a
/// `\r\n\t` continuation whenever a word would exceed the standard
/// header width. `charset` selects the target charset label; None or an
/// unknown label selects UTF-8.
pub fn encode_word(s: &str, charset: Option<&str>) -> String {
    let encoding = charset
        .and_then(|label| encoding_rs::Encoding::for_label(label.as_bytes()))
        .unwrap_or(encoding_rs::UTF_8);
    let (bytes, _, _) = encoding.encode(s);

    let prefix = format!("=?{}?q?", encoding.name());
    let suffix = b"?=";
    let limit = 74 - (prefix.len() + suffix.len());

    let mut result = Vec::with_capacity(s.len());

    result.extend_from_slice(prefix.as_bytes());
    let mut line_length = 0;

    enum Byte {
        Passthru(u8),
        Encode(u8),
    }

    for &c in bytes.iter() {
        let b = if (c.is_ascii_alphanumeric() || c.is_ascii_punctuation())
            && c != b'?'
            && c != b'='
            && c != b'_'
        {
            Byte::Passthru(c)
        } else if c == b' ' {
            Byte::Passthru(b'_')
        } else {
            Byte::Encode(c)
        };

        let need_len = match b {
            Byte::Passthru(_) => 1,
            Byte::Encode(_) => 3,
        };

        if need_len > limit - line_length {
            // Need to wrap
            result.extend_from_slice(suffix);
            result.extend_from_slice(b"\r\n\t");
            result.extend_from_slice(prefix.as_bytes());
            line_length = 0;
        }

        match b {
            Byte::Passthru(c) => {
                result.push(c);
            }
            Byte::Encode(c) => {
                result.push(b'=');
                result.push(HEX_CHARS[(c as usize) >> 4]);
                result.push(HEX_CHARS[(c as usize) & 0x0f]);
            }
        }

        line_length += need_len;
    }

    if line_length > 0 {
        result.extend_from_slice(suffix);
    }

    // Safety: we ensured that everything we output is in the ASCII
    // range, therefore the string is valid UTF-8
    unsafe { String::from_utf8_unchecked(result) }
}

/// One parsed encoded-word: `=?charset?encoding?text?=`
struct EncodedWord<'a> {
    charset: &'a str,
    payload: Vec<u8>,
    /// Span of the word in the input, for literal fallback
    raw: &'a str,
    /// Number of input bytes consumed, including the closing `?=`
    consumed: usize,
}

fn parse_encoded_word(input: &str) -> Option<EncodedWord<'_>> {
    let body = input.strip_prefix("=?")?;
    let (charset, rest) = body.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let end = rest.find("?=")?;
    let text = &rest[..end];

    if charset.is_empty()
        || charset.contains(|c: char| c.is_ascii_whitespace())
        || text.contains(|c: char| c.is_ascii_whitespace() || !c.is_ascii_graphic())
    {
        return None;
    }

    let payload = match encoding {
        "B" | "b" => data_encoding::BASE64_MIME.decode(text.as_bytes()).ok()?,
        // Substitute "=20" rather than a literal space so an underscore at
        // the end of the word is not stripped as trailing whitespace by the
        // quoted-printable decoder.
        "Q" | "q" => quoted_printable::decode(
            text.replace('_', "=20"),
            quoted_printable::ParseMode::Robust,
        )
        .ok()?,
        _ => return None,
    };

    let consumed = 2 + charset.len() + 1 + encoding.len() + 1 + end + 2;
    Some(EncodedWord {
        charset,
        payload,
        raw: &input[..consumed],
        consumed,
    })
}

/// Decode all RFC 2047 encoded-words in `s`. Adjacent encoded words with
/// the same charset have their payloads concatenated before charset
/// conversion, so multi-byte characters split across a word boundary
/// survive; whitespace between adjacent encoded words is elided.
/// `fallback_charset` is consulted for words whose own charset label is
/// unusable. Never fails: malformed words are emitted literally.
pub fn decode_encoded_words(s: &str, fallback_charset: Option<&str>) -> String {
    let mut result = String::with_capacity(s.len());

    // Payload run awaiting charset conversion
    let mut run_charset: Option<&str> = None;
    let mut run_bytes: Vec<u8> = vec![];
    let mut run_raw = String::new();

    let flush = |charset: Option<&str>, bytes: &mut Vec<u8>, raw: &mut String, out: &mut String| {
        if bytes.is_empty() && raw.is_empty() {
            return;
        }
        let resolved = charset
            .and_then(|label| Charset::for_label_no_replacement(label.as_bytes()))
            .or_else(|| {
                fallback_charset.and_then(|label| Charset::for_label_no_replacement(label.as_bytes()))
            });
        match resolved {
            Some(cs) => {
                let (decoded, _malformed) = cs.decode_without_bom_handling(bytes);
                out.push_str(&decoded);
            }
            None => {
                tracing::warn!(
                    "unsupported encoded-word charset {charset:?}, keeping literal text"
                );
                out.push_str(raw);
            }
        }
        bytes.clear();
        raw.clear();
    };

    let mut rest = s;
    while !rest.is_empty() {
        let Some(start) = rest.find("=?") else {
            flush(run_charset, &mut run_bytes, &mut run_raw, &mut result);
            result.push_str(rest);
            break;
        };

        match parse_encoded_word(&rest[start..]) {
            Some(word) => {
                let before = &rest[..start];
                // Whitespace separating two adjacent encoded words is not
                // part of the decoded text
                let ws_separator =
                    !run_bytes.is_empty() && before.chars().all(|c| c.is_ascii_whitespace());
                if !ws_separator {
                    flush(run_charset, &mut run_bytes, &mut run_raw, &mut result);
                    result.push_str(before);
                }
                if run_charset != Some(word.charset) {
                    flush(run_charset, &mut run_bytes, &mut run_raw, &mut result);
                    run_charset = Some(word.charset);
                }
                run_bytes.extend_from_slice(&word.payload);
                run_raw.push_str(word.raw);
                rest = &rest[start + word.consumed..];
            }
            None => {
                // Not a well-formed encoded word; emit up to and including
                // the `=?` literally and keep scanning
                flush(run_charset, &mut run_bytes, &mut run_raw, &mut result);
                result.push_str(&rest[..start + 2]);
                rest = &rest[start + 2..];
            }
        }
    }
    flush(run_charset, &mut run_bytes, &mut run_raw, &mut result);

    result
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encode_ascii_stays_readable() {
        k9::snapshot!(
            encode_word("hello there", None),
            "=?UTF-8?q?hello_there?="
        );
    }

    #[test]
    fn encode_wraps_long_values() {
        let encoded = encode_word(
            "hello, I am a line that is this long, or maybe a little \
             bit longer than this, and that should get wrapped by the encoder",
            None,
        );
        assert!(encoded.contains("?=\r\n\t=?UTF-8?q?"), "wrapped: {encoded}");
        for line in encoded.split("\r\n") {
            assert!(line.len() <= 78, "line too long: {line}");
        }
        assert_eq!(
            decode_encoded_words(&encoded, None),
            "hello, I am a line that is this long, or maybe a little \
             bit longer than this, and that should get wrapped by the encoder"
        );
    }

    #[test]
    fn decode_q_and_b() {
        assert_eq!(
            decode_encoded_words("=?UTF-8?q?Andr=C3=A9?= Pirard", None),
            "Andr\u{e9} Pirard"
        );
        assert_eq!(
            decode_encoded_words("=?utf-8?B?QW5kcsOp?= Pirard", None),
            "Andr\u{e9} Pirard"
        );
        assert_eq!(
            decode_encoded_words("=?ISO-8859-1?Q?caf=E9?=", None),
            "caf\u{e9}"
        );
    }

    #[test]
    fn trailing_underscore_decodes_to_space() {
        assert_eq!(decode_encoded_words("=?UTF-8?q?one_?=", None), "one ");
        assert_eq!(decode_encoded_words("=?UTF-8?q?_lead_?=", None), " lead ");
    }

    #[test]
    fn adjacent_words_join_and_ws_is_elided() {
        assert_eq!(
            decode_encoded_words("=?UTF-8?q?one_?=\r\n\t=?UTF-8?q?two?=", None),
            "one two"
        );
        // A multi-byte character split across the word boundary survives
        // because payloads are joined before charset conversion
        assert_eq!(
            decode_encoded_words("=?UTF-8?q?caf=C3?= =?UTF-8?q?=A9?=", None),
            "caf\u{e9}"
        );
    }

    #[test]
    fn malformed_words_stay_literal() {
        assert_eq!(decode_encoded_words("=?broken", None), "=?broken");
        assert_eq!(
            decode_encoded_words("=?UTF-8?x?unknown?=", None),
            "=?UTF-8?x?unknown?="
        );
        assert_eq!(
            decode_encoded_words("100% =? plain", None),
            "100% =? plain"
        );
    }

    #[test]
    fn fallback_charset_applies_to_unusable_labels() {
        assert_eq!(
            decode_encoded_words("=?x-nonsense?q?caf=E9?=", Some("ISO-8859-1")),
            "caf\u{e9}"
        );
        // Without a fallback the literal text is preserved
        assert_eq!(
            decode_encoded_words("=?x-nonsense?q?caf=E9?=", None),
            "=?x-nonsense?q?caf=E9?="
        );
    }

    #[test]
    fn round_trip() {
        for case in ["hello there", "Andr\u{e9} Pirard", "\u{6f22}\u{5b57} kanji"] {
            let encoded = encode_word(case, None);
            assert_eq!(decode_encoded_words(&encoded, None), case, "{case}");
        }
    }
}
