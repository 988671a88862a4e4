use crate::{MimeError, Result};
use std::io::{Read, Write};
use std::str::FromStr;

/// Define our own because data_encoding::BASE64_MIME, despite its name,
/// is not RFC2045 compliant, and will not ignore spaces
pub const BASE64_RFC2045: data_encoding::Encoding = data_encoding_macro::new_encoding! {
    symbols: "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/",
    padding: '=',
    ignore: " \r\n\t",
    wrap_width: 76,
    wrap_separator: "\r\n",
};

/// Decoding alphabet that tolerates non-canonical trailing bits in the
/// final symbol of a quad. Real senders emit those, and their bytes
/// must still come through rather than being dropped.
const BASE64_PERMISSIVE: data_encoding::Encoding = data_encoding_macro::new_encoding! {
    symbols: "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/",
    padding: '=',
    check_trailing_bits: false,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTransferEncoding {
    SevenBit,
    EightBit,
    Binary,
    QuotedPrintable,
    Base64,
}

impl ContentTransferEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SevenBit => "7bit",
            Self::EightBit => "8bit",
            Self::Binary => "binary",
            Self::QuotedPrintable => "quoted-printable",
            Self::Base64 => "base64",
        }
    }
}

impl FromStr for ContentTransferEncoding {
    type Err = MimeError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("7bit") {
            Ok(Self::SevenBit)
        } else if s.eq_ignore_ascii_case("8bit") {
            Ok(Self::EightBit)
        } else if s.eq_ignore_ascii_case("binary") {
            Ok(Self::Binary)
        } else if s.eq_ignore_ascii_case("quoted-printable") {
            Ok(Self::QuotedPrintable)
        } else if s.eq_ignore_ascii_case("base64") {
            Ok(Self::Base64)
        } else {
            Err(MimeError::InvalidContentTransferEncoding(s.to_string()))
        }
    }
}

/// The default transfer encoding for a part of the given MIME type.
/// `message/*` must not be base64-encoded (the embedded message carries
/// its own encodings), signed multiparts must survive 7bit transports
/// unmodified, and other multiparts delegate encoding to their children.
pub fn default_transfer_encoding(mime_type: Option<&str>) -> ContentTransferEncoding {
    match mime_type {
        None => ContentTransferEncoding::Base64,
        Some(t) if crate::is_message_type(t) => ContentTransferEncoding::EightBit,
        Some(t) if crate::is_same_mime_type(Some(t), Some("multipart/signed")) => {
            ContentTransferEncoding::SevenBit
        }
        Some(t) if crate::is_multipart(t) => ContentTransferEncoding::EightBit,
        Some(_) => ContentTransferEncoding::Base64,
    }
}

/// Wrap `raw` in a decoder appropriate to the declared transfer encoding.
/// 7bit/8bit/binary pass through unchanged; an unrecognized declared
/// encoding logs a warning and passes through raw rather than failing the
/// read. Dropping the returned reader drops only the wrapped stream
/// handle; it never releases any temp-file backing storage, which remains
/// owned by the body that produced `raw`.
pub fn decode_stream<'a, R: Read + 'a>(declared_encoding: &str, raw: R) -> Box<dyn Read + 'a> {
    match ContentTransferEncoding::from_str(declared_encoding.trim()) {
        Ok(ContentTransferEncoding::Base64) => Box::new(Base64Decoder::new(raw)),
        Ok(ContentTransferEncoding::QuotedPrintable) => {
            Box::new(QuotedPrintableDecoder::new(raw))
        }
        Ok(_) => Box::new(raw),
        Err(_) => {
            tracing::warn!(
                "unknown content-transfer-encoding {declared_encoding:?}, \
                 passing body through undecoded"
            );
            Box::new(raw)
        }
    }
}

const READ_CHUNK: usize = 4096;

/// Incremental base64 decoder. Non-alphabet bytes are skipped, quads are
/// decoded as they complete, and a trailing partial quad is decoded on a
/// best-effort basis at end of input.
pub struct Base64Decoder<R> {
    inner: R,
    /// Filtered, not yet decoded symbols (always shorter than 4 between
    /// read calls)
    carry: Vec<u8>,
    out: Vec<u8>,
    pos: usize,
    eof: bool,
}

impl<R: Read> Base64Decoder<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            carry: vec![],
            out: vec![],
            pos: 0,
            eof: false,
        }
    }

    fn decode_quads(&mut self, usable: usize) {
        for quad in self.carry[..usable].chunks_exact(4) {
            let quad = match quad.iter().position(|&b| b == b'=') {
                // Padding ends the quad; anything after it in the same
                // quad is garbage
                Some(0) | Some(1) => {
                    tracing::warn!("skipping malformed base64 quad");
                    continue;
                }
                _ => quad,
            };
            match BASE64_PERMISSIVE.decode(quad) {
                Ok(bytes) => self.out.extend_from_slice(&bytes),
                Err(_) => {
                    tracing::warn!("skipping malformed base64 quad");
                }
            }
        }
        self.carry.drain(..usable);
    }

    fn fill(&mut self) -> std::io::Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        let n = self.inner.read(&mut chunk)?;
        if n == 0 {
            self.eof = true;
            // Best-effort decode of a trailing partial quad
            if self.carry.len() >= 2 {
                while self.carry.len() % 4 != 0 {
                    self.carry.push(b'=');
                }
                let usable = self.carry.len();
                self.decode_quads(usable);
            }
            self.carry.clear();
            return Ok(());
        }

        for &byte in &chunk[..n] {
            match byte {
                b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'+' | b'/' | b'=' => {
                    self.carry.push(byte);
                }
                _ => (),
            }
        }
        let usable = self.carry.len() / 4 * 4;
        self.decode_quads(usable);
        Ok(())
    }
}

impl<R: Read> Read for Base64Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        while self.pos == self.out.len() {
            if self.eof {
                return Ok(0);
            }
            self.out.clear();
            self.pos = 0;
            self.fill()?;
        }
        let n = (self.out.len() - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.out[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Incremental quoted-printable decoder. Input is decoded in robust mode;
/// a dangling escape or CR at a chunk boundary is held back until more
/// input arrives.
pub struct QuotedPrintableDecoder<R> {
    inner: R,
    carry: Vec<u8>,
    out: Vec<u8>,
    pos: usize,
    eof: bool,
}

impl<R: Read> QuotedPrintableDecoder<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            carry: vec![],
            out: vec![],
            pos: 0,
            eof: false,
        }
    }

    /// The length of the prefix of `carry` that is safe to hand to the
    /// decoder now: it must not end mid-escape, and it must not end in
    /// whitespace or a bare CR, which the decoder treats as
    /// end-of-input trailing bytes and strips.
    fn safe_prefix_len(&self) -> usize {
        let mut safe = self.carry.len();
        while safe > 0 && matches!(self.carry[safe - 1], b' ' | b'\t' | b'\r') {
            safe -= 1;
        }
        if safe > 0 && self.carry[safe - 1] == b'=' {
            safe -= 1;
        } else if safe > 1 && self.carry[safe - 2] == b'=' {
            safe -= 2;
        }
        safe
    }

    fn decode_chunk(&mut self, len: usize) {
        match quoted_printable::decode(&self.carry[..len], quoted_printable::ParseMode::Robust) {
            Ok(bytes) => self.out.extend_from_slice(&bytes),
            Err(_) => {
                // Robust mode is best-effort; if it still refuses, pass
                // the bytes through so the content degrades to garbled
                // rather than vanishing
                tracing::warn!("undecodable quoted-printable run, passing through raw");
                self.out.extend_from_slice(&self.carry[..len]);
            }
        }
        self.carry.drain(..len);
    }

    fn fill(&mut self) -> std::io::Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        let n = self.inner.read(&mut chunk)?;
        if n == 0 {
            self.eof = true;
            let len = self.carry.len();
            if len > 0 {
                self.decode_chunk(len);
            }
            return Ok(());
        }
        self.carry.extend_from_slice(&chunk[..n]);
        let safe = self.safe_prefix_len();
        if safe > 0 {
            self.decode_chunk(safe);
        }
        Ok(())
    }
}

impl<R: Read> Read for QuotedPrintableDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        while self.pos == self.out.len() {
            if self.eof {
                return Ok(0);
            }
            self.out.clear();
            self.pos = 0;
            self.fill()?;
        }
        let n = (self.out.len() - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.out[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Maximum quoted-printable line length, excluding the CRLF and the `=`
/// of a soft break.
const QP_LINE_LIMIT: usize = 75;

static HEX_CHARS: &[u8] = &[
    b'0', b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b'A', b'B', b'C', b'D', b'E', b'F',
];

/// A quoted-printable encoder that additionally escapes line-leading `.`
/// and `F` so that no encoded line can begin with `From ` or a bare dot,
/// which naive mailbox parsers treat as structure.
///
/// The same encoder drives both writing and size computation (via a
/// counting sink), so the two always agree.
pub struct SignSafeQpWriter<W> {
    inner: W,
    line_len: usize,
    at_line_start: bool,
    pending_cr: bool,
    pending_ws: Option<u8>,
}

impl<W: Write> SignSafeQpWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            line_len: 0,
            at_line_start: true,
            pending_cr: false,
            pending_ws: None,
        }
    }

    fn wrap_if_needed(&mut self, width: usize) -> std::io::Result<()> {
        if self.line_len + width > QP_LINE_LIMIT {
            self.inner.write_all(b"=\r\n")?;
            self.line_len = 0;
            self.at_line_start = true;
        }
        Ok(())
    }

    fn emit_literal(&mut self, b: u8) -> std::io::Result<()> {
        self.wrap_if_needed(1)?;
        self.inner.write_all(&[b])?;
        self.line_len += 1;
        self.at_line_start = false;
        Ok(())
    }

    fn emit_escaped(&mut self, b: u8) -> std::io::Result<()> {
        self.wrap_if_needed(3)?;
        self.inner.write_all(&[
            b'=',
            HEX_CHARS[(b as usize) >> 4],
            HEX_CHARS[(b as usize) & 0x0f],
        ])?;
        self.line_len += 3;
        self.at_line_start = false;
        Ok(())
    }

    fn emit_hard_break(&mut self) -> std::io::Result<()> {
        // Trailing whitespace must not precede a hard line break
        if let Some(ws) = self.pending_ws.take() {
            self.emit_escaped(ws)?;
        }
        self.inner.write_all(b"\r\n")?;
        self.line_len = 0;
        self.at_line_start = true;
        Ok(())
    }

    fn flush_pending_ws(&mut self) -> std::io::Result<()> {
        if let Some(ws) = self.pending_ws.take() {
            self.emit_literal(ws)?;
        }
        Ok(())
    }

    fn process(&mut self, b: u8) -> std::io::Result<()> {
        if self.pending_cr {
            self.pending_cr = false;
            if b == b'\n' {
                return self.emit_hard_break();
            }
            self.flush_pending_ws()?;
            self.emit_escaped(b'\r')?;
        }
        if b == b'\r' {
            self.pending_cr = true;
            return Ok(());
        }
        if b == b' ' || b == b'\t' {
            self.flush_pending_ws()?;
            self.pending_ws = Some(b);
            return Ok(());
        }
        self.flush_pending_ws()?;

        if b == b'=' || !(33..=126).contains(&b) {
            return self.emit_escaped(b);
        }
        if b == b'.' || b == b'F' {
            // A soft break may have just placed us at the start of a
            // line, so wrap first and only then decide whether this
            // byte would lead one
            self.wrap_if_needed(1)?;
            if self.at_line_start {
                return self.emit_escaped(b);
            }
        }
        self.emit_literal(b)
    }

    /// Drain any held-back trailing bytes. Must be called once after the
    /// final write.
    pub fn finish(mut self) -> std::io::Result<W> {
        if self.pending_cr {
            self.pending_cr = false;
            self.emit_escaped(b'\r')?;
        }
        if let Some(ws) = self.pending_ws.take() {
            self.emit_escaped(ws)?;
        }
        Ok(self.inner)
    }
}

impl<W: Write> Write for SignSafeQpWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        for &b in buf {
            self.process(b)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// A sink that discards bytes while counting them; used to compute
/// encoded sizes without materializing the encoded form.
#[derive(Default)]
pub struct CountingWriter {
    count: u64,
}

impl CountingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Write for CountingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.count += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
