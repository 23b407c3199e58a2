//! Predictor invocation
//!
//! One call is one acquire-use-release cycle: read the artifact, build the
//! feature record for the schema the artifact declares, predict, classify.
//! Nothing is cached between calls, so replacing the model file on disk takes
//! effect on the next prediction.
//!
//! Failures collapse into the two kinds a user can act on: the model file is
//! missing, or anything else went wrong.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    artifact::{ArtifactError, ModelArtifact, DEFAULT_MODEL_PATH},
    form::FormInput,
    record::{FeatureRecord, SchemaVersion},
    risk::RiskTier,
};

/// Why a prediction produced no number
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictionError {
    /// No artifact at the configured path
    #[error("Error: Model file '{}' not found. Please train the model first.", .path.display())]
    ModelNotFound {
        /// Path that was tried
        path: PathBuf,
    },

    /// Any other load or evaluation failure
    #[error("Prediction Error: {message}")]
    Failed {
        /// Underlying error text
        message: String,
    },
}

impl PredictionError {
    fn failed(err: impl std::fmt::Display) -> Self {
        Self::Failed {
            message: err.to_string(),
        }
    }

    /// Short machine code (`model_not_found`, `prediction_failed`)
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ModelNotFound { .. } => "model_not_found",
            Self::Failed { .. } => "prediction_failed",
        }
    }
}

/// A successful prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Predicted delay in minutes
    pub delay_minutes: f64,
    /// Risk tier of the delay
    pub tier: RiskTier,
    /// Schema the record was built for
    pub schema: SchemaVersion,
    /// Record handed to the model
    pub record: FeatureRecord,
    /// Name from the artifact metadata
    pub model_name: String,
}

/// Loads the model from `model_path` on every call and predicts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predictor {
    model_path: PathBuf,
    schema_override: Option<SchemaVersion>,
}

impl Default for Predictor {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_PATH)
    }
}

impl Predictor {
    /// Predictor reading the artifact at `model_path`
    #[must_use]
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            schema_override: None,
        }
    }

    /// Require the artifact to use `schema`
    ///
    /// With an override the record is built for `schema` and an artifact
    /// declaring another version fails the prediction.
    #[must_use]
    pub fn with_schema(mut self, schema: Option<SchemaVersion>) -> Self {
        self.schema_override = schema;
        self
    }

    /// Artifact path
    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Configured schema override
    #[must_use]
    pub fn schema_override(&self) -> Option<SchemaVersion> {
        self.schema_override
    }

    /// Predict the delay for one form submission
    ///
    /// # Errors
    ///
    /// `ModelNotFound` when the artifact is absent, `Failed` for anything
    /// else (corrupt artifact, schema disagreement, evaluation error).
    pub fn predict(&self, input: FormInput) -> Result<Prediction, PredictionError> {
        let artifact = ModelArtifact::load(&self.model_path).map_err(|e| match e {
            ArtifactError::NotFound { path } => {
                warn!(path = %path.display(), "model artifact not found");
                PredictionError::ModelNotFound { path }
            },
            other => {
                warn!(path = %self.model_path.display(), error = %other, "model artifact rejected");
                PredictionError::failed(other)
            },
        })?;

        let schema = self.schema_override.unwrap_or(artifact.schema);
        let record = FeatureRecord::from_input(&input, schema);
        debug!(schema = %schema, kind = artifact.kind().name(), "built feature record");

        let delay_minutes = artifact.predict(&record).map_err(|e| {
            warn!(error = %e, "prediction failed");
            PredictionError::failed(e)
        })?;
        let tier = RiskTier::classify(delay_minutes);
        info!(
            delay_minutes,
            tier = tier.as_str(),
            batch = %input.reagent_batch_id(),
            "prediction complete"
        );

        Ok(Prediction {
            delay_minutes,
            tier,
            schema,
            record,
            model_name: artifact.metadata.name,
        })
    }
}
