use crate::ctencoding::CountingWriter;
use crate::part::MimePart;
use crate::{MimeError, Result};
use std::io::{Read, Write};

/// An assembled multipart container: an ordered sequence of child parts
/// delimited by a boundary token, plus optional preamble/epilogue bytes
/// outside the boundaries.
///
/// This is a compose-side structure. It serializes; it does not read
/// back. Parsed multiparts arrive as part trees through a separate path,
/// and [`reader`](Self::reader) fails rather than pretending otherwise.
#[derive(Debug)]
pub struct MultipartBody {
    subtype: String,
    boundary: String,
    parts: Vec<MimePart>,
    preamble: Option<Vec<u8>>,
    epilogue: Option<Vec<u8>>,
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBody {
    /// Create an empty `multipart/mixed` container with a freshly
    /// generated boundary. The boundary carries enough entropy that it
    /// is assumed not to collide with child content; this layer does
    /// not scan for collisions.
    pub fn new() -> Self {
        Self::new_subtype("mixed")
    }

    pub fn new_subtype<S: Into<String>>(subtype: S) -> Self {
        let uuid = uuid::Uuid::new_v4();
        Self {
            subtype: subtype.into(),
            boundary: data_encoding::BASE64_NOPAD.encode(uuid.as_bytes()),
            parts: vec![],
            preamble: None,
            epilogue: None,
        }
    }

    pub fn with_boundary<S: Into<String>>(boundary: S) -> Self {
        Self {
            boundary: boundary.into(),
            ..Self::new()
        }
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// The full content type implied by this container, eg.
    /// `multipart/mixed`.
    pub fn mime_type(&self) -> String {
        format!("multipart/{}", self.subtype)
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[MimePart] {
        &self.parts
    }

    pub fn parts_mut(&mut self) -> &mut Vec<MimePart> {
        &mut self.parts
    }

    pub fn attach(&mut self, part: MimePart) {
        self.parts.push(part);
    }

    pub fn set_preamble<B: Into<Vec<u8>>>(&mut self, preamble: B) {
        self.preamble = Some(preamble.into());
    }

    pub fn set_epilogue<B: Into<Vec<u8>>>(&mut self, epilogue: B) {
        self.epilogue = Some(epilogue.into());
    }

    /// Serialize the container. CRLF placement here is a wire contract;
    /// downstream multipart parsers are sensitive to every byte of it.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        if let Some(preamble) = &self.preamble {
            out.write_all(preamble)?;
            out.write_all(b"\r\n")?;
        }
        if self.parts.is_empty() {
            // Degenerate but valid: a multipart with no body parts
            write!(out, "--{}\r\n", self.boundary)?;
        } else {
            for part in &self.parts {
                write!(out, "--{}\r\n", self.boundary)?;
                part.write_to(out)?;
                out.write_all(b"\r\n")?;
            }
        }
        write!(out, "--{}--\r\n", self.boundary)?;
        if let Some(epilogue) = &self.epilogue {
            out.write_all(epilogue)?;
        }
        Ok(())
    }

    pub fn len(&self) -> Result<u64> {
        let mut counter = CountingWriter::new();
        self.write_to(&mut counter)?;
        Ok(counter.count())
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Always fails: assembled multiparts are write-only.
    pub fn reader(&self) -> Result<Box<dyn Read + '_>> {
        Err(MimeError::WriteOnlyBody)
    }
}
