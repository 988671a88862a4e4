use crate::{Header, Result};

/// An ordered list of headers; insertion order is significant for
/// serialization. There may be multiple headers with the same name.
/// Derefs to the underlying `Vec<Header>` for mutation, but provides
/// accessors for retrieving and replacing headers by name.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    headers: Vec<Header>,
    /// Charset used for encoded-word encoding of non-ASCII values on
    /// write; None selects UTF-8
    charset: Option<String>,
}

impl std::ops::Deref for HeaderMap {
    type Target = Vec<Header>;
    fn deref(&self) -> &Vec<Header> {
        &self.headers
    }
}

impl std::ops::DerefMut for HeaderMap {
    fn deref_mut(&mut self) -> &mut Vec<Header> {
        &mut self.headers
    }
}

/// Fold-on-ingest hook for `add_header`. Header values are folded and
/// encoded at write time; this entry point exists so that ingest-time
/// folding can be introduced without touching call sites.
fn fold_and_encode(value: String) -> String {
    value
}

impl HeaderMap {
    pub fn new(headers: Vec<Header>) -> Self {
        Self {
            headers,
            charset: None,
        }
    }

    /// Select the charset used when encoding non-ASCII values on write.
    pub fn set_charset(&mut self, charset: Option<String>) {
        self.charset = charset;
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Append a new name/value entry.
    pub fn add_header<N: Into<String>, V: Into<String>>(
        &mut self,
        name: N,
        value: V,
    ) -> Result<()> {
        let header = Header::new(name, fold_and_encode(value.into()))?;
        self.headers.push(header);
        Ok(())
    }

    /// Append an entry from an already-formatted header line; the line is
    /// written back verbatim rather than being re-rendered.
    pub fn add_raw_header<N: Into<String>, R: Into<String>>(
        &mut self,
        name: N,
        raw: R,
    ) -> Result<()> {
        let header = Header::raw(name, raw)?;
        self.headers.push(header);
        Ok(())
    }

    /// Remove all entries matching `name`, then append one new entry.
    /// Note that this moves the header to the end of the sequence.
    pub fn set_header<V: Into<String>>(&mut self, name: &str, value: V) -> Result<()> {
        self.remove_header(name);
        self.add_header(name, value)
    }

    /// All values for `name`, case-insensitive, in insertion order.
    /// Returns an empty vec when absent.
    pub fn get_header(&self, name: &str) -> Vec<&str> {
        self.iter_named(name).map(|h| h.get_value()).collect()
    }

    pub fn get_first(&self, name: &str) -> Option<&Header> {
        self.iter_named(name).next()
    }

    pub fn iter_named<'a, 'name>(
        &'a self,
        name: &'name str,
    ) -> impl DoubleEndedIterator<Item = &'a Header> + 'name
    where
        'a: 'name,
    {
        self.headers
            .iter()
            .filter(|header| header.get_name().eq_ignore_ascii_case(name))
    }

    /// Remove all entries matching `name`; no-op when none match.
    pub fn remove_header(&mut self, name: &str) {
        self.headers
            .retain(|header| !header.get_name().eq_ignore_ascii_case(name));
    }

    /// Write every entry, CRLF-terminated, in insertion order.
    pub fn write_to<W: std::io::Write>(&self, out: &mut W) -> std::io::Result<()> {
        for header in &self.headers {
            header.write_header(out, self.charset.as_deref())?;
        }
        Ok(())
    }

    /// Convenience method wrapping write_to that returns the rendered
    /// header block as a standalone string. Produces output byte-identical
    /// to `write_to`.
    pub fn to_header_block_string(&self) -> String {
        let mut out = vec![];
        self.write_to(&mut out)
            .expect("writing to a Vec cannot fail");
        String::from_utf8_lossy(&out).to_string()
    }
}
