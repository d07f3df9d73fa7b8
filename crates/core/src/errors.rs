use thiserror::Error;

/// Failures of the pure domain layer. These are either invariant violations
/// caught by entity constructors or missing-dependency conditions the caller
/// is expected to treat as a skip rather than an abort.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
    #[error("source item metadata not found for `{item_id}`")]
    MissingSourceMetadata { item_id: String },
    #[error("catalog snapshot is empty")]
    EmptyCatalog,
}

/// Run-level failures. `Connectivity` is fatal to the whole run and reported
/// once; `Persistence` covers a single unit of work that was rolled back
/// while the run continued.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("connectivity failure: {0}")]
    Connectivity(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Whether the whole run should stop instead of moving to the next unit.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connectivity(_) | Self::Configuration(_))
    }

    /// Whether the failure is a skip condition rather than a rollback.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Domain(DomainError::MissingSourceMetadata { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::{ApplicationError, DomainError};

    #[test]
    fn connectivity_failures_are_fatal() {
        let error = ApplicationError::Connectivity("store unreachable".to_owned());
        assert!(error.is_fatal());
        assert!(!error.is_skip());
    }

    #[test]
    fn per_record_failures_are_recoverable() {
        let error = ApplicationError::Persistence("constraint violation".to_owned());
        assert!(!error.is_fatal());
        assert!(!error.is_skip());
    }

    #[test]
    fn missing_source_metadata_is_a_skip() {
        let error = ApplicationError::from(DomainError::MissingSourceMetadata {
            item_id: "img_001".to_owned(),
        });
        assert!(error.is_skip());
        assert!(!error.is_fatal());
    }
}
