//! Domain error taxonomy. Every service operation returns one of these four
//! kinds; the REST layer maps them onto status codes. Only `Store` is
//! unexpected, and it is the only kind whose detail must never reach a
//! client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Missing/malformed required field or a business-rule violation
    #[error("{0}")]
    Validation(String),

    /// A referenced id does not resolve
    #[error("{0}")]
    NotFound(String),

    /// Role or ownership mismatch for the calling principal
    #[error("{0}")]
    Authorization(String),

    /// Underlying persistence failure
    #[error("storage failure: {0}")]
    Store(anyhow::Error),
}

impl From<anyhow::Error> for DomainError {
    fn from(err: anyhow::Error) -> Self {
        DomainError::Store(err)
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        DomainError::NotFound(message.into())
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        DomainError::Authorization(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_passes_the_message_through() {
        let err = DomainError::validation("A group requires at least 2 students");
        assert_eq!(err.to_string(), "A group requires at least 2 students");

        let err = DomainError::not_found("Student not found: student::1::a");
        assert_eq!(err.to_string(), "Student not found: student::1::a");
    }

    #[test]
    fn test_store_errors_convert_from_anyhow() {
        let err: DomainError = anyhow::anyhow!("disk full").into();
        assert!(matches!(err, DomainError::Store(_)));
        assert!(err.to_string().contains("storage failure"));
    }
}
