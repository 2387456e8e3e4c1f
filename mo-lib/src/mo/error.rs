use thiserror::Error;

/// Failures reported to MO service callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The request was malformed. `operation` is the document the request claimed to
    /// be, when that much could be determined.
    #[error("validation failed for {}: {}", .operation.as_deref().unwrap_or("unknown request"), .errors.join("; "))]
    ValidationFailed {
        operation: Option<String>,
        errors: Vec<String>,
    },
    #[error("operation not supported: {0}")]
    OperationNotSupported(String),
    #[error("internal processing error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable error code for responses.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationFailed { .. } => "VALIDATION_FAILED",
            Self::OperationNotSupported(_) => "OPERATION_NOT_SUPPORTED",
            Self::Internal(_) => "INTERNAL_PROCESSING_ERROR",
        }
    }

    /// HTTP style status for the error.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::ValidationFailed { .. } => 400,
            Self::OperationNotSupported(_) => 501,
            Self::Internal(_) => 500,
        }
    }
}

impl From<crate::Error> for Error {
    fn from(err: crate::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
