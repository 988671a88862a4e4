use crate::ctencoding::{decode_stream, ContentTransferEncoding, CountingWriter, SignSafeQpWriter};
use crate::multipart::MultipartBody;
use crate::part::MimePart;
use crate::tempbody::TempFileBody;
use crate::{MimeError, Result};
use std::borrow::Cow;
use std::io::{Cursor, Read, Write};

/// The content of a MIME part.
#[derive(Debug)]
pub enum Body {
    /// Bytes as they appear on the wire, together with their declared
    /// transfer encoding
    Raw(RawBody),
    /// Unencoded text that will be charset- and transfer-encoded on
    /// write
    Text(TextBody),
    /// An assembled multipart container. Write-only; see
    /// [`MultipartBody`]
    Multipart(MultipartBody),
    /// An embedded `message/rfc822` part
    Message(Box<MimePart>),
}

impl Body {
    /// The number of bytes [`write_to`](Self::write_to) will produce.
    pub fn len(&self) -> Result<u64> {
        match self {
            Self::Raw(raw) => raw.len(),
            Self::Text(text) => text.len(),
            Self::Multipart(mp) => mp.len(),
            Self::Message(msg) => msg.len(),
        }
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        match self {
            Self::Raw(raw) => raw.write_to(out),
            Self::Text(text) => text.write_to(out),
            Self::Multipart(mp) => mp.write_to(out),
            Self::Message(msg) => msg.write_to(out),
        }
    }
}

#[derive(Debug)]
enum RawData {
    Memory(Vec<u8>),
    File(TempFileBody),
}

/// Wire-form body bytes plus the transfer encoding they are declared to
/// be in. The bytes may live in memory or spilled to a temp file; in
/// the latter case the `RawBody` owns the file and readers are
/// non-owning handles.
#[derive(Debug)]
pub struct RawBody {
    encoding: String,
    data: RawData,
}

impl RawBody {
    pub fn new<E: Into<String>>(encoding: E, bytes: Vec<u8>) -> Self {
        Self {
            encoding: encoding.into(),
            data: RawData::Memory(bytes),
        }
    }

    pub fn new_spooled<E: Into<String>>(encoding: E, file: TempFileBody) -> Self {
        Self {
            encoding: encoding.into(),
            data: RawData::File(file),
        }
    }

    /// The declared transfer encoding, as written in the message.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Read the body in wire form, without reversing the transfer
    /// encoding.
    pub fn raw_reader(&self) -> Result<Box<dyn Read + '_>> {
        match &self.data {
            RawData::Memory(bytes) => Ok(Box::new(Cursor::new(bytes.as_slice()))),
            RawData::File(file) => Ok(Box::new(file.reader()?)),
        }
    }

    /// Read the body with its declared transfer encoding reversed.
    /// Unrecognized encodings pass through undecoded. Dropping the
    /// returned reader never releases temp-file backing storage; that
    /// happens only when the `RawBody` itself is dropped.
    pub fn decoded_reader(&self) -> Result<Box<dyn Read + '_>> {
        Ok(decode_stream(&self.encoding, self.raw_reader()?))
    }

    pub fn len(&self) -> Result<u64> {
        match &self.data {
            RawData::Memory(bytes) => Ok(bytes.len() as u64),
            RawData::File(file) => Ok(file.len()?),
        }
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        match &self.data {
            RawData::Memory(bytes) => out.write_all(bytes)?,
            RawData::File(file) => {
                std::io::copy(&mut file.reader()?, out)?;
            }
        }
        Ok(())
    }
}

/// Unencoded text plus the charset and transfer encoding to apply when
/// writing it out. Only quoted-printable and 8bit are legal transfer
/// encodings for text.
#[derive(Debug, Clone)]
pub struct TextBody {
    text: String,
    charset: String,
    encoding: ContentTransferEncoding,
}

impl TextBody {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            charset: "UTF-8".to_string(),
            encoding: ContentTransferEncoding::QuotedPrintable,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn encoding(&self) -> ContentTransferEncoding {
        self.encoding
    }

    pub fn set_charset<S: Into<String>>(&mut self, charset: S) {
        self.charset = charset.into();
    }

    pub fn set_encoding(&mut self, encoding: ContentTransferEncoding) -> Result<()> {
        match encoding {
            ContentTransferEncoding::QuotedPrintable | ContentTransferEncoding::EightBit => {
                self.encoding = encoding;
                Ok(())
            }
            other => Err(MimeError::InvalidTextBodyEncoding(
                other.as_str().to_string(),
            )),
        }
    }

    fn charset_encoded(&self) -> Cow<'_, [u8]> {
        let encoding = encoding_rs::Encoding::for_label(self.charset.as_bytes())
            .unwrap_or(encoding_rs::UTF_8);
        let (bytes, _, _) = encoding.encode(&self.text);
        bytes
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        let bytes = self.charset_encoded();
        match self.encoding {
            ContentTransferEncoding::EightBit => {
                out.write_all(&bytes)?;
            }
            ContentTransferEncoding::QuotedPrintable => {
                let mut qp = SignSafeQpWriter::new(out);
                qp.write_all(&bytes)?;
                qp.finish()?;
            }
            other => {
                return Err(MimeError::InvalidTextBodyEncoding(
                    other.as_str().to_string(),
                ))
            }
        }
        Ok(())
    }

    /// The exact byte count `write_to` will produce, computed by
    /// replaying the encoder into a counting sink. Quoted-printable
    /// expansion is content dependent, so there is no closed-form size.
    pub fn len(&self) -> Result<u64> {
        let mut counter = CountingWriter::new();
        self.write_to(&mut counter)?;
        Ok(counter.count())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Read;

    fn written(body: &TextBody) -> Vec<u8> {
        let mut out = vec![];
        body.write_to(&mut out).unwrap();
        out
    }

    #[test]
    fn text_size_matches_written_bytes() {
        let samples = [
            "hello world",
            "line one\r\nline two\r\n",
            "From the mailbox\r\n.\r\n",
            "caf\u{e9} au lait \u{20ac}5",
            "",
        ];
        for sample in samples {
            for encoding in [
                ContentTransferEncoding::QuotedPrintable,
                ContentTransferEncoding::EightBit,
            ] {
                let mut body = TextBody::new(sample);
                body.set_encoding(encoding).unwrap();
                assert_eq!(
                    body.len().unwrap(),
                    written(&body).len() as u64,
                    "sample {sample:?} encoding {encoding:?}"
                );
            }
        }
    }

    #[test]
    fn text_rejects_illegal_encodings() {
        let mut body = TextBody::new("hi");
        assert_eq!(
            body.set_encoding(ContentTransferEncoding::Base64),
            Err(MimeError::InvalidTextBodyEncoding("base64".to_string()))
        );
        assert_eq!(
            body.set_encoding(ContentTransferEncoding::SevenBit),
            Err(MimeError::InvalidTextBodyEncoding("7bit".to_string()))
        );
        // the failed calls left the default in place
        assert_eq!(body.encoding(), ContentTransferEncoding::QuotedPrintable);
    }

    #[test]
    fn text_honors_target_charset() {
        let mut body = TextBody::new("façade");
        body.set_charset("ISO-8859-1");
        body.set_encoding(ContentTransferEncoding::EightBit).unwrap();
        assert_eq!(written(&body), b"fa\xe7ade");
    }

    #[test]
    fn qp_text_decodes_back() {
        let body = TextBody::new("From here to =there\r\nand beyond");
        let encoded = written(&body);
        let decoded =
            quoted_printable::decode(&encoded, quoted_printable::ParseMode::Strict).unwrap();
        assert_eq!(decoded, b"From here to =there\r\nand beyond");
    }

    #[test]
    fn raw_body_decoded_reader_applies_declared_encoding() {
        let raw = RawBody::new("base64", b"aGVsbG8=".to_vec());
        let mut out = vec![];
        raw.decoded_reader().unwrap().read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn raw_body_passthrough_for_identity_encodings() {
        let raw = RawBody::new("7bit", b"as-is".to_vec());
        let mut out = vec![];
        raw.decoded_reader().unwrap().read_to_end(&mut out).unwrap();
        assert_eq!(out, b"as-is");
    }

    #[test]
    fn spooled_raw_body_survives_decoder_drop() {
        let spool = TempFileBody::copy_from(&mut &b"aGVsbG8gd29ybGQ="[..]).unwrap();
        let path = spool.path().to_path_buf();
        let raw = RawBody::new_spooled("base64", spool);
        {
            let mut reader = raw.decoded_reader().unwrap();
            let mut out = vec![];
            reader.read_to_end(&mut out).unwrap();
            assert_eq!(out, b"hello world");
            drop(reader);
        }
        // the transient decoder is gone but the backing file is not
        assert!(path.exists());
        let mut again = vec![];
        raw.decoded_reader()
            .unwrap()
            .read_to_end(&mut again)
            .unwrap();
        assert_eq!(again, b"hello world");
        drop(raw);
        assert!(!path.exists());
    }
}
