use thiserror::Error;

use crate::sequence::Handle;
use crate::TokenId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("vocabulary truncated at byte {offset}: {needed} more bytes expected")]
    Truncated { offset: usize, needed: usize },

    #[error("invalid token length {len} at byte {offset}")]
    InvalidLength { offset: usize, len: i32 },

    #[error("invalid base64 token on line {line}: {source}")]
    Base64 {
        line: usize,
        #[source]
        source: base64::DecodeError,
    },

    #[error("malformed rank line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("unknown vocabulary format '{0}' (expected binary or rank)")]
    UnknownFormat(String),

    #[error("sequence handle {0} is not live")]
    InvalidHandle(Handle),

    #[error("pop from an empty candidate queue")]
    EmptyQueue,

    #[error("token id {id} out of range for a vocabulary of {len} entries")]
    IdOutOfRange { id: TokenId, len: usize },
}
