//! Domain error model.

use thiserror::Error;

/// Result type used across the analytics layers.
pub type DomainResult<T> = Result<T, DomainError>;

/// Analytics domain error.
///
/// Per-request failures (`MissingRequiredFeature`, `UnknownEntity`, `Validation`,
/// `Uninitialized`) are surfaced to callers as structured payloads.
/// `MissingArtifact` is recovered by the lifecycle manager (full retrain) and
/// `ModelFitFailure` by the forecasting fallback; the remaining variants abort
/// initialization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. out-of-range request field).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The caller omitted a field the operation requires.
    #[error("missing required feature: {0}")]
    MissingRequiredFeature(String),

    /// A lookup referenced an id that is not in the data catalog.
    #[error("unknown {kind}: {id}")]
    UnknownEntity { kind: &'static str, id: String },

    /// A model artifact (or its scaler/metrics) is absent or undecodable.
    #[error("missing artifact: {0}")]
    MissingArtifact(String),

    /// A model fit did not produce a usable estimator.
    #[error("model fit failed: {0}")]
    ModelFitFailure(String),

    /// Models were requested before the lifecycle manager became ready.
    #[error("analytics models are not initialized")]
    Uninitialized,

    /// Durable storage could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// Synthetic data generation failed.
    #[error("data generation failed: {0}")]
    Generation(String),

    /// Model training failed.
    #[error("training failed: {0}")]
    Training(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn missing_feature(name: impl Into<String>) -> Self {
        Self::MissingRequiredFeature(name.into())
    }

    pub fn unknown_entity(kind: &'static str, id: impl ToString) -> Self {
        Self::UnknownEntity {
            kind,
            id: id.to_string(),
        }
    }

    pub fn missing_artifact(msg: impl Into<String>) -> Self {
        Self::MissingArtifact(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn training(msg: impl Into<String>) -> Self {
        Self::Training(msg.into())
    }

    /// Whether the error is caused by the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::MissingRequiredFeature(_) | Self::UnknownEntity { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_entity_message_names_kind_and_id() {
        let err = DomainError::unknown_entity("material", 17);
        assert_eq!(err.to_string(), "unknown material: 17");
        assert!(err.is_client_error());
    }

    #[test]
    fn storage_errors_are_not_client_errors() {
        assert!(!DomainError::storage("disk full").is_client_error());
        assert!(!DomainError::Uninitialized.is_client_error());
    }
}
