//! # labdelay
//!
//! Laboratory delay prediction: an operational form, one model inference,
//! and a three-tier risk label.
//!
//! A submission is validated into an immutable [`FormInput`], projected onto
//! the feature record schema the model artifact declares, evaluated by the
//! artifact's pipeline, and classified into a [`RiskTier`].
//!
//! ## Example
//!
//! ```rust
//! use labdelay::{demo::demo_artifact, FeatureRecord, FormInput, RiskTier, SchemaVersion};
//!
//! let model = demo_artifact(SchemaVersion::V2).unwrap();
//! let input = FormInput::default();
//! let record = FeatureRecord::from_input(&input, model.schema);
//! let delay = model.predict(&record).unwrap();
//! assert_eq!(RiskTier::classify(delay), RiskTier::Low);
//! ```
//!
//! ## Serving
//!
//! With the default `server` feature, [`api::create_router`] exposes the form
//! page and a JSON API; the `labdelay` binary wires it to a TCP listener.
//!
//! ```rust,ignore
//! use labdelay::predictor::Predictor;
//!
//! // Reads the artifact on every call
//! let prediction = Predictor::new("lab_delay_model_v2.ldm").predict(FormInput::default())?;
//! println!("{:.1} minutes, {}", prediction.delay_minutes, prediction.tier.label());
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
// Clippy allows (MUST come after deny/warn to override them)
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)] // usize -> f64 for averages is acceptable
#![allow(clippy::cast_possible_truncation)] // u128 -> u64 for metrics is safe
#![allow(clippy::must_use_candidate)] // Not all methods need #[must_use]
#![allow(clippy::doc_markdown)] // Allow technical terms without backticks
#![allow(clippy::uninlined_format_args)] // Prefer explicit format args
#![allow(clippy::missing_panics_doc)] // Allow missing Panics doc sections
#![allow(clippy::float_cmp)] // Allow float comparisons in tests
#![allow(clippy::format_push_string)] // Text reports build strings incrementally

#[cfg(feature = "server")]
pub mod api;
pub mod artifact;
/// CLI command implementations (extracted for testability)
pub mod cli;
pub mod config;
pub mod demo;
pub mod error;
pub mod form;
#[cfg(feature = "server")]
pub mod metrics;
pub mod model;
pub mod predictor;
pub mod record;
pub mod render;
pub mod risk;

// Re-exports for convenience
pub use error::{LabDelayError, Result};
pub use form::{FormInput, FormSubmission};
pub use predictor::{Prediction, PredictionError, Predictor};
pub use record::{FeatureRecord, SchemaVersion};
pub use risk::RiskTier;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
