use std::fmt::{self, Display};

use crate::types::Type;

/// Error type for every fallible operation of the crate.
///
/// All errors are local and synchronous: they describe a contract violation
/// by the caller (misusing the builder, decoding the wrong type) or bytes
/// that are not BSON. Nothing here is worth retrying.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The builder was asked to do something its current frame does not allow.
    InvalidState(&'static str),
    /// A typed getter was called on an element of another type.
    TypeMismatch { expected: Type, actual: Type },
    /// The bytes are not a well formed BSON document.
    Malformed { offset: usize, reason: &'static str },
    /// A key contains an interior `\0`.
    InvalidKey,
    /// A cstring payload (regex pattern or options) contains an interior `\0`.
    InvalidString,
    /// Not a 24 character hexadecimal ObjectId.
    InvalidOid,
    /// The builder already handed its buffer out with `extract_*`.
    Extracted,
}

/// Result type returned by all fallible functions.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(offset: usize, reason: &'static str) -> Self {
        Error::Malformed { offset, reason }
    }
}

impl Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidState(what) => write!(formatter, "invalid builder state: {}", what),
            Error::TypeMismatch { expected, actual } => write!(
                formatter,
                "type mismatch: expected {} but element is {}",
                expected, actual
            ),
            Error::Malformed { offset, reason } => {
                write!(formatter, "malformed bson at byte {}: {}", offset, reason)
            }
            Error::InvalidKey => formatter.write_str("key contains an interior nul byte"),
            Error::InvalidString => formatter.write_str("cstring contains an interior nul byte"),
            Error::InvalidOid => formatter.write_str("invalid object id"),
            Error::Extracted => formatter.write_str("builder buffer was already extracted"),
        }
    }
}

impl std::error::Error for Error {}
