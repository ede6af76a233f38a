//! Error types for the public API and the internal `Res` alias.
//!
//! Internally everything returns `Res<T>`, which is an `anyhow::Result`. Functions that are exposed
//! from the library convert to the public `Result<T>` with `pub_result`, tagging the failure with
//! an `ErrorType` so that callers (the CLI and the chat front-end) can decide how to react.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

pub(crate) type Res<T> = anyhow::Result<T>;

/// The public result type.
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The data directory or `config.json` is missing or invalid.
    Config,
    /// Reading or writing the SQLite database failed.
    Database,
    /// A period could not be turned into a valid interval, e.g. a malformed custom range. The
    /// caller is expected to ask the user again.
    InvalidRange,
    /// An exported report could not be written to its output directory.
    StorageWrite,
    /// User supplied input that could not be understood.
    Input,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// An error with an `ErrorType` and the full `anyhow` context chain.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub(crate) fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// Returns `true` if the error should be resolved by asking the user for different input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.error_type, ErrorType::InvalidRange | ErrorType::Input)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Converts an internal result into the public `Result`, tagging the error with `error_type`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_pub_result_keeps_context() {
        let res: Res<()> = Err(anyhow::anyhow!("root cause")).context("outer message");
        let err = res.pub_result(ErrorType::Database).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Database);
        let message = err.to_string();
        assert!(message.contains("outer message"), "{message}");
        assert!(message.contains("root cause"), "{message}");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::InvalidRange.to_string(), "invalid_range");
        assert_eq!(ErrorType::StorageWrite.to_string(), "storage_write");
        assert!(Error::new(ErrorType::InvalidRange, anyhow::anyhow!("x")).is_recoverable());
    }
}
