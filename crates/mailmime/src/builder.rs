use crate::body::Body;
use crate::headermap::HeaderMap;
use crate::part::MimePart;
use crate::Result;

/// Incrementally compose an outgoing message. Text and HTML content are
/// combined into a `multipart/alternative` group; attachments promote
/// the whole message to `multipart/mixed`.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    headers: Vec<(String, String)>,
    text_plain: Option<String>,
    text_html: Option<String>,
    attachments: Vec<MimePart>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_subject(&mut self, subject: &str) {
        self.push_header("Subject", subject);
    }

    pub fn set_from(&mut self, from: &str) {
        self.push_header("From", from);
    }

    pub fn set_to(&mut self, to: &str) {
        self.push_header("To", to);
    }

    /// Add an arbitrary top-level header. Values containing non-ASCII
    /// text are encoded-word encoded at write time.
    pub fn push_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    pub fn text_plain(&mut self, text: &str) {
        self.text_plain = Some(text.to_string());
    }

    pub fn text_html(&mut self, html: &str) {
        self.text_html = Some(html.to_string());
    }

    pub fn attach(&mut self, part: MimePart) {
        self.attachments.push(part);
    }

    /// Assemble the part tree and apply the accumulated headers to its
    /// root.
    pub fn build(self) -> Result<MimePart> {
        if self.text_plain.is_none() && self.text_html.is_none() && self.attachments.is_empty() {
            return Err(crate::MimeError::BuildError(
                "message has no content and no attachments",
            ));
        }
        let content = match (self.text_plain, self.text_html) {
            (Some(plain), Some(html)) => {
                let mut alternative = MimePart::new_multipart("multipart/alternative");
                alternative.attach(MimePart::new_text_plain(plain));
                alternative.attach(MimePart::new_html(html));
                Some(alternative)
            }
            (Some(plain), None) => Some(MimePart::new_text_plain(plain)),
            (None, Some(html)) => Some(MimePart::new_html(html)),
            (None, None) => None,
        };

        let mut root = match (content, self.attachments.is_empty()) {
            (Some(content), true) => content,
            (content, _) => {
                let mut mixed = MimePart::new_multipart("multipart/mixed");
                if let Some(content) = content {
                    mixed.attach(content);
                }
                for attachment in self.attachments {
                    mixed.attach(attachment);
                }
                mixed
            }
        };

        apply_headers(root.headers_mut(), &self.headers)?;
        root.headers_mut().set_header("MIME-Version", "1.0")?;
        Ok(root)
    }
}

fn apply_headers(target: &mut HeaderMap, headers: &[(String, String)]) -> Result<()> {
    for (name, value) in headers {
        target.add_header(name.as_str(), value.as_str())?;
    }
    Ok(())
}

/// An attachment part with a `Content-Disposition` carrying the file
/// name, typed from the name's extension when `content_type` is None.
pub fn attachment(
    file_name: &str,
    content: &[u8],
    content_type: Option<&str>,
) -> Result<MimePart> {
    let content_type = match content_type {
        Some(t) => t.to_string(),
        None => mime_type_map::mime_type_by_extension(file_name),
    };
    let mut part = MimePart::new_binary(&content_type, content);
    part.headers_mut().set_header(
        "Content-Disposition",
        format!("attachment;\r\n filename=\"{file_name}\""),
    )?;
    Ok(part)
}

/// True when classification would treat `part` as an attachment rather
/// than renderable content.
pub fn is_attachment(part: &MimePart) -> bool {
    if part
        .headers()
        .get_first("Content-Disposition")
        .map(|h| crate::params::header_value(h.get_value()))
        .is_some_and(|d| d.eq_ignore_ascii_case("attachment"))
    {
        return true;
    }
    !matches!(part.body(), Body::Multipart(_) | Body::Message(_))
        && !part.is_mime_type("text/plain")
        && !part.is_mime_type("text/html")
}
