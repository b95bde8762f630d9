use thiserror::Error as ThisError;

use httpwrap_interface::Error as ErrorImpl;

/// The error half of an [`Outcome`](crate::Outcome).
///
/// `code` is never zero: a successful transfer is represented by `Ok` instead. Positive codes are
/// libcurl `CURLcode` values passed through unchanged; negative codes are produced by httpwrap
/// itself and listed as associated constants.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{message} (code {code})")]
pub struct Error {
    code: i32,
    message: String,
}

impl Error {
    /// A POST request was issued without a `content-type` header.
    pub const MISSING_CONTENT_TYPE: i32 = -1;
    /// No backend was registered when the request was issued.
    pub const NO_BACKEND: i32 = -2;
    /// The worker thread could not be started or died before producing an outcome.
    pub const WORKER_LOST: i32 = -3;

    pub(crate) fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn no_backend() -> Self {
        Self::new(Self::NO_BACKEND, "no backend registered")
    }

    pub(crate) fn worker_lost() -> Self {
        Self::new(Self::WORKER_LOST, "worker exited without producing an outcome")
    }

    /// The numeric error code.
    pub fn code(&self) -> i32 {
        self.code
    }

    /// A human readable description of the failure.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the error was reported by the transfer engine, as opposed to httpwrap itself.
    pub fn is_transfer(&self) -> bool {
        self.code > 0
    }
}

impl From<ErrorImpl> for Error {
    fn from(e: ErrorImpl) -> Self {
        match e {
            ErrorImpl::MissingContentType => Self::new(Self::MISSING_CONTENT_TYPE, e.to_string()),
            ErrorImpl::Transfer { code, message } => Self::new(code, message),
        }
    }
}

/// A `Result` alias where the `Err` case is [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_backend_error() {
        let err = Error::from(ErrorImpl::Transfer {
            code: 7,
            message: "couldn't connect".into(),
        });
        assert_eq!(err.code(), 7);
        assert!(err.is_transfer());
        assert_eq!(err.to_string(), "couldn't connect (code 7)");

        let err = Error::from(ErrorImpl::MissingContentType);
        assert_eq!(err.code(), Error::MISSING_CONTENT_TYPE);
        assert!(!err.is_transfer());
    }
}
