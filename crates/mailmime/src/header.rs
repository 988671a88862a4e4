use crate::rfc2047::encode_word;
use crate::{MimeError, Result};

/// The payload of a header entry. A header is either constructed from a
/// name/value pair, or ingested as an already-formatted raw line whose
/// value is derived lazily on demand.
#[derive(Clone, Debug, PartialEq)]
pub enum HeaderValue {
    /// A structured name/value entry; the value is encoded on write
    Structured(String),
    /// A raw entry holding the complete formatted line (without the
    /// trailing CRLF); emitted verbatim on write
    Raw(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    name: String,
    value: HeaderValue,
}

impl Header {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            value: HeaderValue::Structured(value.into()),
        })
    }

    /// Construct from an already-formatted header line such as
    /// `"Received: from mx.example.com ..."`. The line is stored and
    /// written back verbatim; the value is recovered by stripping the
    /// `name:` prefix.
    pub fn raw<N: Into<String>, R: Into<String>>(name: N, raw: R) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            value: HeaderValue::Raw(raw.into()),
        })
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// The header value. For raw entries this strips the `name:` prefix
    /// (when present) and trims surrounding whitespace.
    pub fn get_value(&self) -> &str {
        match &self.value {
            HeaderValue::Structured(v) => v,
            HeaderValue::Raw(raw) => {
                let bytes = raw.as_bytes();
                let n = self.name.len();
                let rest = if bytes.len() > n
                    && bytes[..n].eq_ignore_ascii_case(self.name.as_bytes())
                    && bytes[n] == b':'
                {
                    &raw[n + 1..]
                } else {
                    raw
                };
                rest.trim()
            }
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(&self.value, HeaderValue::Raw(_))
    }

    /// Format the header into the provided output stream, as though
    /// writing it out as part of a mime part. `charset` selects the
    /// encoded-word charset used when the value is not transport-safe.
    pub fn write_header<W: std::io::Write>(
        &self,
        out: &mut W,
        charset: Option<&str>,
    ) -> std::io::Result<()> {
        match &self.value {
            HeaderValue::Raw(raw) => {
                out.write_all(raw.as_bytes())?;
            }
            HeaderValue::Structured(value) => {
                out.write_all(self.name.as_bytes())?;
                out.write_all(b": ")?;
                if needs_encoding(value) {
                    out.write_all(encode_word(value, charset).as_bytes())?;
                } else {
                    out.write_all(value.as_bytes())?;
                }
            }
        }
        out.write_all(b"\r\n")
    }

    /// Convenience method wrapping write_header that returns the
    /// formatted header as a standalone string
    pub fn to_header_string(&self) -> String {
        let mut out = vec![];
        self.write_header(&mut out, None)
            .expect("writing to a Vec cannot fail");
        String::from_utf8_lossy(&out).to_string()
    }
}

/// A value is transport-safe when every character is printable US-ASCII,
/// TAB, CR or LF; anything else forces encoded-word encoding on write.
fn needs_encoding(value: &str) -> bool {
    value
        .chars()
        .any(|c| !matches!(c, '\t' | '\r' | '\n' | ' '..='~'))
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MimeError::InvalidHeader(
            "header name must not be empty".to_string(),
        ));
    }
    for b in name.bytes() {
        if !(33..=126).contains(&b) || b == b':' {
            return Err(MimeError::InvalidHeader(format!(
                "header name must be comprised of printable US-ASCII characters. Found {:?}",
                b as char
            )));
        }
    }
    Ok(())
}
