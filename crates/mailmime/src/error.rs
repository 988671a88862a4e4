use thiserror::Error;

#[derive(Error, Debug)]
pub enum MimeError {
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error("invalid content transfer encoding: {0}")]
    InvalidContentTransferEncoding(String),
    #[error("text bodies only support quoted-printable or 8bit transfer encoding, not {0}")]
    InvalidTextBodyEncoding(String),
    #[error("an assembled multipart body is write-only and cannot be read")]
    WriteOnlyBody,
    #[error("builder: {0}")]
    BuildError(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PartialEq for MimeError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidHeader(a), Self::InvalidHeader(b)) => a == b,
            (
                Self::InvalidContentTransferEncoding(a),
                Self::InvalidContentTransferEncoding(b),
            ) => a == b,
            (Self::InvalidTextBodyEncoding(a), Self::InvalidTextBodyEncoding(b)) => a == b,
            (Self::WriteOnlyBody, Self::WriteOnlyBody) => true,
            (Self::BuildError(a), Self::BuildError(b)) => a == b,
            (Self::Io(a), Self::Io(b)) => a.kind() == b.kind(),
            _ => false,
        }
    }
}
