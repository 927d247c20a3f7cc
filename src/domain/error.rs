use thiserror::Error;

/// Faults raised by the domain layer.
///
/// `Invariant` marks a structurally impossible document or selection state.
/// It is a programming-level fault, not a user-recoverable condition:
/// validated documents and the structural operations never produce one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("document invariant violated: {message}")]
    Invariant { message: String },
    #[error("document payload malformed: {message}")]
    Malformed { message: String },
}

impl DomainError {
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}
