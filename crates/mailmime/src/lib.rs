mod body;
mod builder;
mod ctencoding;
mod error;
mod header;
mod headermap;
mod mimetype;
mod multipart;
mod params;
mod part;
mod rfc2047;
mod tempbody;
mod viewable;

pub use error::MimeError;
pub type Result<T> = std::result::Result<T, MimeError>;

pub use body::*;
pub use builder::*;
pub use ctencoding::*;
pub use header::{Header, HeaderValue};
pub use headermap::*;
pub use mimetype::*;
pub use multipart::*;
pub use params::*;
pub use part::*;
pub use rfc2047::{decode_encoded_words, encode_word};
pub use tempbody::*;
pub use viewable::*;
