use std::fmt::{Display, Formatter};

/// Error type shared across the mapping engine, the value-store adapters,
/// and the service facade. No `std::error::Error` boilerplate crate is
/// used -- matching the rest of this crate's hand-rolled convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The caller supplied an invalid request (empty key, missing value).
    InvalidArgument(String),
    /// `Insert` against a key that already has a committed value.
    AlreadyExists(String),
    /// `Update`/`Delete` against a key with no committed value.
    DoesNotExist(String),
    /// A value-store call failed, or failed to decode.
    Internal(String),
    /// A root-block payload could not be parsed.
    Parse(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Error::AlreadyExists(msg) => write!(f, "already exists: {msg}"),
            Error::DoesNotExist(msg) => write!(f, "does not exist: {msg}"),
            Error::Internal(msg) => write!(f, "internal error: {msg}"),
            Error::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for Error {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        Error::Internal(err.to_string())
    }
}

/// Result alias used throughout this crate.
pub type CResult<T> = Result<T, Error>;
