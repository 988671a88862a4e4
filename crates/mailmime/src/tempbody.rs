use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Spill-to-disk storage for a large body. The `TempFileBody` owns the
/// backing file and is the only thing that deletes it (on drop); readers
/// handed out by [`reader`](Self::reader) are independent re-opened file
/// handles, so closing a reader (or a transient decoder wrapped around
/// one) never touches the backing storage.
#[derive(Debug)]
pub struct TempFileBody {
    file: NamedTempFile,
}

impl TempFileBody {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            file: NamedTempFile::new()?,
        })
    }

    /// Spool the full contents of `source` into a fresh temp file.
    pub fn copy_from<R: Read>(source: &mut R) -> std::io::Result<Self> {
        let mut body = Self::new()?;
        std::io::copy(source, body.file.as_file_mut())?;
        body.file.as_file_mut().flush()?;
        Ok(body)
    }

    /// Open a fresh, non-owning read handle positioned at the start.
    pub fn reader(&self) -> std::io::Result<File> {
        self.file.reopen()
    }

    pub fn len(&self) -> std::io::Result<u64> {
        Ok(self.file.as_file().metadata()?.len())
    }

    pub fn is_empty(&self) -> std::io::Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
