use crate::body::{Body, RawBody, TextBody};
use crate::ctencoding::{default_transfer_encoding, BASE64_RFC2045};
use crate::headermap::HeaderMap;
use crate::multipart::MultipartBody;
use crate::{params, Result};
use std::io::Write;

/// A node in the message tree: a header block plus a body. Leaf parts
/// carry raw or text bodies; containers carry multipart or embedded
/// message bodies.
#[derive(Debug)]
pub struct MimePart {
    headers: HeaderMap,
    body: Body,
}

fn set_known_header<V: Into<String>>(headers: &mut HeaderMap, name: &str, value: V) {
    headers
        .set_header(name, value)
        .expect("header name is a valid token");
}

impl MimePart {
    pub fn new(headers: HeaderMap, body: Body) -> Self {
        Self { headers, body }
    }

    /// A `text/plain` leaf with the default text transfer encoding.
    pub fn new_text_plain<S: Into<String>>(text: S) -> Self {
        Self::new_text("text/plain", text)
    }

    /// A `text/html` leaf with the default text transfer encoding.
    pub fn new_html<S: Into<String>>(text: S) -> Self {
        Self::new_text("text/html", text)
    }

    fn new_text<S: Into<String>>(content_type: &str, text: S) -> Self {
        let body = TextBody::new(text);
        let mut headers = HeaderMap::default();
        set_known_header(
            &mut headers,
            "Content-Type",
            format!("{content_type}; charset={}", body.charset().to_ascii_lowercase()),
        );
        set_known_header(
            &mut headers,
            "Content-Transfer-Encoding",
            body.encoding().as_str(),
        );
        Self {
            headers,
            body: Body::Text(body),
        }
    }

    /// A binary leaf holding `bytes`, base64-encoded for transport.
    pub fn new_binary(content_type: &str, bytes: &[u8]) -> Self {
        let mut headers = HeaderMap::default();
        set_known_header(&mut headers, "Content-Type", content_type);
        set_known_header(&mut headers, "Content-Transfer-Encoding", "base64");
        let mut encoded = BASE64_RFC2045.encode(bytes);
        if !encoded.is_empty() && !encoded.ends_with("\r\n") {
            encoded.push_str("\r\n");
        }
        Self {
            headers,
            body: Body::Raw(RawBody::new("base64", encoded.into_bytes())),
        }
    }

    /// A `multipart/*` container with a freshly generated boundary.
    /// Anything that is not a `multipart/` type falls back to
    /// `multipart/mixed`.
    pub fn new_multipart(mime_type: &str) -> Self {
        let subtype = match mime_type.split_once('/') {
            Some((main, sub)) if main.eq_ignore_ascii_case("multipart") && !sub.is_empty() => sub,
            _ => {
                tracing::warn!("{mime_type} is not a multipart type, using multipart/mixed");
                "mixed"
            }
        };
        let multipart = MultipartBody::new_subtype(subtype);
        let content_type = multipart.mime_type();
        let mut headers = HeaderMap::default();
        set_known_header(
            &mut headers,
            "Content-Type",
            format!("{content_type};\r\n boundary=\"{}\"", multipart.boundary()),
        );
        set_known_header(
            &mut headers,
            "Content-Transfer-Encoding",
            default_transfer_encoding(Some(&content_type)).as_str(),
        );
        Self {
            headers,
            body: Body::Multipart(multipart),
        }
    }

    /// Wrap `message` as an embedded `message/rfc822` part.
    pub fn new_message(message: MimePart) -> Self {
        let mut headers = HeaderMap::default();
        set_known_header(&mut headers, "Content-Type", "message/rfc822");
        set_known_header(
            &mut headers,
            "Content-Transfer-Encoding",
            default_transfer_encoding(Some("message/rfc822")).as_str(),
        );
        Self {
            headers,
            body: Body::Message(Box::new(message)),
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// The primary value of the `Content-Type` header, if present.
    pub fn mime_type(&self) -> Option<String> {
        let header = self.headers.get_first("Content-Type")?;
        Some(params::header_value(header.get_value()))
    }

    /// A named parameter of the `Content-Type` header, if present.
    pub fn content_type_parameter(&self, name: &str) -> Option<String> {
        let header = self.headers.get_first("Content-Type")?;
        params::header_parameter(header.get_value(), name)
    }

    pub fn is_mime_type(&self, mime_type: &str) -> bool {
        crate::is_same_mime_type(self.mime_type().as_deref(), Some(mime_type))
    }

    /// The declared `Content-Transfer-Encoding`, unfolded.
    pub fn transfer_encoding(&self) -> Option<String> {
        self.headers
            .get_first("Content-Transfer-Encoding")
            .map(|h| params::unfold(h.get_value()).trim().to_string())
    }

    /// The children of a multipart body, or an empty slice for any
    /// other body kind.
    pub fn children(&self) -> &[MimePart] {
        match &self.body {
            Body::Multipart(mp) => mp.parts(),
            _ => &[],
        }
    }

    /// Mutable access to the multipart container, when this part is
    /// one.
    pub fn multipart_mut(&mut self) -> Option<&mut MultipartBody> {
        match &mut self.body {
            Body::Multipart(mp) => Some(mp),
            _ => None,
        }
    }

    /// Append a child part. No-op with a warning if this part is not a
    /// multipart container.
    pub fn attach(&mut self, part: MimePart) {
        match self.multipart_mut() {
            Some(mp) => mp.attach(part),
            None => {
                tracing::warn!("attach on a non-multipart part was ignored");
            }
        }
    }

    /// Serialize the header block, a blank separator line, then the
    /// body.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        self.headers.write_to(out)?;
        out.write_all(b"\r\n")?;
        self.body.write_to(out)
    }

    /// The exact byte count `write_to` will produce.
    pub fn len(&self) -> Result<u64> {
        let mut counter = crate::ctencoding::CountingWriter::new();
        self.write_to(&mut counter)?;
        Ok(counter.count())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn serialized(part: &MimePart) -> String {
        let mut out = vec![];
        part.write_to(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn text_part_serialization() {
        let part = MimePart::new_text_plain("hello there");
        k9::snapshot!(
            serialized(&part),
            r#"
Content-Type: text/plain; charset=utf-8\r
Content-Transfer-Encoding: quoted-printable\r
\r
hello there
"#
        );
    }

    #[test]
    fn mime_type_ignores_parameters() {
        let part = MimePart::new_text_plain("x");
        assert_eq!(part.mime_type().as_deref(), Some("text/plain"));
        assert_eq!(
            part.content_type_parameter("charset").as_deref(),
            Some("utf-8")
        );
        assert!(part.is_mime_type("TEXT/PLAIN"));
    }

    #[test]
    fn multipart_part_carries_boundary_parameter() {
        let mut part = MimePart::new_multipart("multipart/mixed");
        part.attach(MimePart::new_text_plain("inner"));
        let boundary = part.content_type_parameter("boundary").unwrap();
        let text = serialized(&part);
        assert!(text.contains(&format!("--{boundary}\r\n")));
        assert!(text.contains(&format!("--{boundary}--\r\n")));
        assert_eq!(part.transfer_encoding().as_deref(), Some("8bit"));
    }

    #[test]
    fn non_multipart_container_type_falls_back_to_mixed() {
        let part = MimePart::new_multipart("text/plain");
        assert_eq!(part.mime_type().as_deref(), Some("multipart/mixed"));
        let signed = MimePart::new_multipart("multipart/signed");
        assert_eq!(signed.mime_type().as_deref(), Some("multipart/signed"));
        assert_eq!(signed.transfer_encoding().as_deref(), Some("7bit"));
    }

    #[test]
    fn part_size_matches_written_bytes() {
        let mut outer = MimePart::new_multipart("multipart/mixed");
        outer.attach(MimePart::new_text_plain("caf\u{e9}"));
        outer.attach(MimePart::new_binary(
            "application/octet-stream",
            &[0u8, 1, 2, 254, 255],
        ));
        let mut out = vec![];
        outer.write_to(&mut out).unwrap();
        assert_eq!(outer.len().unwrap(), out.len() as u64);
    }

    #[test]
    fn embedded_message_serializes_inline() {
        let mut inner = MimePart::new_text_plain("the original");
        inner
            .headers_mut()
            .set_header("Subject", "fwd: hello")
            .unwrap();
        let wrapper = MimePart::new_message(inner);
        assert!(wrapper.is_mime_type("message/rfc822"));
        let text = serialized(&wrapper);
        assert!(text.contains("Content-Type: message/rfc822\r\n"));
        assert!(text.contains("Subject: fwd: hello\r\n"));
        assert!(text.contains("the original"));
    }

    #[test]
    fn attach_to_leaf_is_ignored() {
        let mut leaf = MimePart::new_text_plain("x");
        leaf.attach(MimePart::new_text_plain("y"));
        assert!(leaf.children().is_empty());
    }
}
