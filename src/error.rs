//! Error types for labdelay
//!
//! Each layer owns a `thiserror` enum; `LabDelayError` wraps them so the CLI
//! and library callers can use a single `Result` alias. The UI-facing
//! prediction outcome uses [`crate::predictor::PredictionError`] instead,
//! which collapses everything into the two kinds a user can act on.

use thiserror::Error;

use crate::{
    artifact::ArtifactError, form::FormError, model::ModelError, predictor::PredictionError,
    record::RecordError,
};

/// Top-level error for labdelay operations
#[derive(Debug, Error)]
pub enum LabDelayError {
    /// Form input was rejected
    #[error("Invalid input: {0}")]
    Form(#[from] FormError),

    /// Feature record does not match the model schema
    #[error("{0}")]
    Record(#[from] RecordError),

    /// Model artifact could not be read or decoded
    #[error("{0}")]
    Artifact(#[from] ArtifactError),

    /// Model evaluation failed
    #[error("{0}")]
    Model(#[from] ModelError),

    /// Prediction produced no number (CLI path)
    #[error("{0}")]
    Prediction(#[from] PredictionError),

    /// Template rendering failed
    #[error("Render error: {reason}")]
    Render {
        /// Underlying template error
        reason: String,
    },

    /// Server could not start or stopped with an error
    #[error("Server error: {reason}")]
    Server {
        /// Description of the failure
        reason: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Output could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, LabDelayError>;
