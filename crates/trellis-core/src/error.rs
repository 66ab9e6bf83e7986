//! Error taxonomy for query resolution.

use crate::identifier::IdentifierError;
use crate::metadata::ResourceClass;
use thiserror::Error;

/// Result type for provider and adapter operations.
pub type ProvideResult<T> = Result<T, ProvideError>;

/// Errors surfaced while resolving and executing a query.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProvideError {
    /// No store binding for the requested class. A provider chain may
    /// recover by trying its next provider.
    #[error("resource class `{0}` is not supported")]
    ResourceClassNotSupported(ResourceClass),

    /// A URI-supplied identifier did not decompose into the declared
    /// identifier properties. Client input; never retried.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    /// Misconfiguration (unknown relationship property, broken link chain,
    /// missing capability). Always fatal; never retried.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// Store execution failure, passed through unmodified.
    #[error("store driver error: {0}")]
    Driver(String),
}

impl ProvideError {
    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        Self::Runtime(msg.into())
    }

    pub fn driver<S: Into<String>>(msg: S) -> Self {
        Self::Driver(msg.into())
    }

    /// Whether a provider chain may continue with its next provider.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ResourceClassNotSupported(_))
    }

    /// Whether the error was caused by request input rather than the
    /// deployment.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidIdentifier(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unsupported_class_is_recoverable() {
        assert!(ProvideError::ResourceClassNotSupported(ResourceClass::new("Book"))
            .is_recoverable());
        assert!(!ProvideError::runtime("bad relation").is_recoverable());
        assert!(!ProvideError::driver("connection reset").is_recoverable());
    }

    #[test]
    fn test_identifier_errors_are_client_errors() {
        let err: ProvideError = IdentifierError::Empty.into();
        assert!(err.is_client_error());
        assert!(!err.is_recoverable());
    }
}
