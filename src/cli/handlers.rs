//! CLI definitions and command handlers

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;

use crate::{
    artifact::DEFAULT_MODEL_PATH,
    config::{ServerConfig, DEFAULT_HOST, DEFAULT_PORT},
    demo::demo_artifact,
    error::{LabDelayError, Result},
    form::{field_specs, FieldKind, FormInput, FormSubmission, RawValue},
    predictor::{Prediction, Predictor},
    record::SchemaVersion,
    render::Renderer,
    risk::RiskAssessment,
};

/// Laboratory delay predictor
#[derive(Debug, Parser)]
#[command(name = "labdelay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for `predict` and `schema`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

/// Widget values, as they would be entered in the form
///
/// Values are validated exactly like a form submission; absent flags take
/// the widget defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct WidgetArgs {
    /// Lab occupancy in percent (0-100)
    #[arg(long)]
    pub lab_occupancy: Option<String>,
    /// Active projects per scientist (1-20)
    #[arg(long)]
    pub scientist_workload: Option<String>,
    /// Hour of the booking (0-23)
    #[arg(long)]
    pub hour_of_day: Option<String>,
    /// Days since instrument installation (0-730)
    #[arg(long)]
    pub days_since_start: Option<String>,
    /// Reagent batch id
    #[arg(long)]
    pub reagent_batch_id: Option<String>,
    /// Validation, QC, Pilot, Screening or R&D
    #[arg(long)]
    pub experiment_type: Option<String>,
    /// Microscope, Centrifuge, Spectrometer, HPLC, Incubator or PCR
    #[arg(long)]
    pub instrument_type: Option<String>,
    /// Junior, Mid or Senior
    #[arg(long)]
    pub scientist_experience: Option<String>,
    /// Low, Medium, High or Critical
    #[arg(long)]
    pub priority_level: Option<String>,
    /// Mean ambient temperature in °C (18-30)
    #[arg(long)]
    pub mean_ambient_temp: Option<String>,
    /// Expected duration in minutes; defaults by experiment type
    #[arg(long)]
    pub expected_duration: Option<String>,
}

impl WidgetArgs {
    /// Raw submission carrying the given flags
    #[must_use]
    pub fn to_submission(&self) -> FormSubmission {
        let raw = |v: &Option<String>| v.clone().map(RawValue::Text);
        FormSubmission {
            lab_occupancy: raw(&self.lab_occupancy),
            scientist_workload: raw(&self.scientist_workload),
            hour_of_day: raw(&self.hour_of_day),
            days_since_start: raw(&self.days_since_start),
            reagent_batch_id: raw(&self.reagent_batch_id),
            experiment_type: raw(&self.experiment_type),
            instrument_type: raw(&self.instrument_type),
            scientist_experience: raw(&self.scientist_experience),
            priority_level: raw(&self.priority_level),
            mean_ambient_temp: raw(&self.mean_ambient_temp),
            expected_duration: raw(&self.expected_duration),
        }
    }
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the form page and JSON API
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Model artifact, re-read on every prediction
        #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,

        /// Require this record schema (v1 or v2) instead of the artifact's
        #[arg(long)]
        schema: Option<SchemaVersion>,
    },
    /// Predict once and print the result card
    ///
    /// Examples:
    ///   labdelay predict --reagent-batch-id BATCH_392
    ///   labdelay predict --lab-occupancy 95 --scientist-workload 12 --format json
    Predict {
        /// Widget values
        #[command(flatten)]
        widgets: WidgetArgs,

        /// Model artifact
        #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,

        /// Require this record schema (v1 or v2) instead of the artifact's
        #[arg(long)]
        schema: Option<SchemaVersion>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the form widgets and record schemas
    Schema {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Write the hand-parameterized demo model
    DemoModel {
        /// Where to write the artifact
        #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
        output: PathBuf,

        /// Record schema of the demo model
        #[arg(long, default_value_t = SchemaVersion::V2)]
        schema: SchemaVersion,
    },
    /// Show version info
    Info,
}

fn prediction_json(prediction: &Prediction) -> serde_json::Value {
    let assessment = RiskAssessment::new(prediction.delay_minutes);
    json!({
        "delay_minutes": prediction.delay_minutes,
        "tier": assessment.tier,
        "label": assessment.label,
        "color": assessment.color,
        "advice": assessment.advice,
        "delay_text": assessment.delay_text(),
        "schema": prediction.schema,
        "model": prediction.model_name,
        "record": prediction.record,
    })
}

/// Run one prediction and format it
///
/// # Errors
///
/// Invalid widget values, or a prediction that produced no number.
pub fn handle_predict(
    widgets: &WidgetArgs,
    model: PathBuf,
    schema: Option<SchemaVersion>,
    format: OutputFormat,
) -> Result<String> {
    let input = FormInput::from_submission(&widgets.to_submission())?;
    let prediction = Predictor::new(model).with_schema(schema).predict(input)?;
    match format {
        OutputFormat::Text => Renderer::new()?.render_card(&prediction),
        OutputFormat::Json => serde_json::to_string_pretty(&prediction_json(&prediction))
            .map_err(|e| LabDelayError::Render {
                reason: e.to_string(),
            }),
    }
}

fn describe_kind(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Slider {
            min, max, default, ..
        } => format!("slider {min}..={max}, default {default}"),
        FieldKind::Number { min, defaults } => {
            let defaults: Vec<String> = defaults.iter().map(|(k, v)| format!("{k}={v}")).collect();
            format!("number >= {min}, default by type ({})", defaults.join(", "))
        },
        FieldKind::Select { options, default } => {
            format!("one of [{}], default {default}", options.join(", "))
        },
    }
}

/// Describe widgets and record schemas
///
/// # Errors
///
/// Only if JSON serialization fails.
pub fn handle_schema(format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let schemas: Vec<serde_json::Value> = SchemaVersion::ALL
                .iter()
                .map(|v| json!({ "version": v, "columns": v.columns() }))
                .collect();
            serde_json::to_string_pretty(&json!({
                "fields": field_specs(),
                "schemas": schemas,
                "default_schema": SchemaVersion::default(),
            }))
            .map_err(|e| LabDelayError::Render {
                reason: e.to_string(),
            })
        },
        OutputFormat::Text => {
            let mut out = String::from("Widgets:\n");
            for spec in field_specs() {
                out.push_str(&format!(
                    "  {:<22} {} [{}]\n",
                    spec.name,
                    describe_kind(&spec.kind),
                    spec.section.title()
                ));
            }
            for version in SchemaVersion::ALL {
                out.push_str(&format!("\nRecord schema {version}:\n"));
                for (i, column) in version.columns().iter().enumerate() {
                    out.push_str(&format!("  {:>2}. {} ({:?})\n", i + 1, column.name, column.kind));
                }
            }
            Ok(out)
        },
    }
}

/// Write the demo artifact
///
/// # Errors
///
/// Fails if the artifact cannot be written.
pub fn handle_demo_model(output: &Path, schema: SchemaVersion) -> Result<String> {
    let artifact = demo_artifact(schema)?;
    artifact.save(output)?;
    tracing::info!(path = %output.display(), schema = %schema, "wrote demo model");
    Ok(format!(
        "Wrote {} demo model ({}) to {}",
        artifact.kind().name(),
        schema,
        output.display()
    ))
}

/// Version and build info
#[must_use]
pub fn info_text() -> String {
    format!(
        "labdelay v{}\n\
         Laboratory delay prediction service\n\
         \n\
         Features:\n\
         \x20 - Form page and JSON API{}\n\
         \x20 - Record schemas v1 (legacy) and v2 (canonical)\n\
         \x20 - Linear, gradient boosting and random forest artifacts\n",
        crate::VERSION,
        if cfg!(feature = "server") {
            ""
        } else {
            " (disabled in this build)"
        }
    )
}

/// Start the HTTP service and run until Ctrl-C
///
/// # Errors
///
/// Fails on an invalid address, bind failure, or server error.
#[cfg(feature = "server")]
pub async fn handle_serve(config: ServerConfig) -> Result<()> {
    use crate::api::{create_router, AppState};

    let addr = config.socket_addr()?;
    if !config.model_path.exists() {
        tracing::warn!(
            path = %config.model_path.display(),
            "model file not found; predictions will report it until it exists"
        );
    }
    let state = AppState::new(config.clone())?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| LabDelayError::Server {
            reason: format!("Failed to bind: {e}"),
        })?;
    tracing::info!(%addr, model = %config.model_path.display(), "listening");
    println!("Lab delay predictor listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(|e| LabDelayError::Server {
            reason: e.to_string(),
        })
}

/// Without the `server` feature there is nothing to serve
///
/// # Errors
///
/// Always.
#[cfg(not(feature = "server"))]
pub async fn handle_serve(_config: ServerConfig) -> Result<()> {
    Err(LabDelayError::Config(
        "labdelay was built without the `server` feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::PredictionError;

    fn demo_on_disk(schema: SchemaVersion) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.ldm");
        handle_demo_model(&path, schema).unwrap();
        (dir, path)
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["labdelay", "serve"]).unwrap();
        match cli.command {
            Commands::Serve {
                host,
                port,
                model,
                schema,
            } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 8501);
                assert_eq!(model, PathBuf::from("lab_delay_model_v2.ldm"));
                assert_eq!(schema, None);
            },
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_predict_flags() {
        let cli = Cli::try_parse_from([
            "labdelay",
            "predict",
            "--reagent-batch-id",
            "BATCH_392",
            "--schema",
            "v1",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Predict {
                widgets,
                schema,
                format,
                ..
            } => {
                assert_eq!(widgets.reagent_batch_id.as_deref(), Some("BATCH_392"));
                assert_eq!(schema, Some(SchemaVersion::V1));
                assert_eq!(format, OutputFormat::Json);
            },
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_schema() {
        assert!(Cli::try_parse_from(["labdelay", "predict", "--schema", "v3"]).is_err());
    }

    #[test]
    fn test_predict_text_with_demo_model() {
        let (_dir, path) = demo_on_disk(SchemaVersion::V2);
        let out = handle_predict(&WidgetArgs::default(), path, None, OutputFormat::Text).unwrap();
        assert!(out.starts_with("LOW RISK\nExpected Delay: 8.0 minutes\n"));
    }

    #[test]
    fn test_predict_json_bad_batch() {
        let (_dir, path) = demo_on_disk(SchemaVersion::V2);
        let widgets = WidgetArgs {
            reagent_batch_id: Some("BATCH_392".to_string()),
            ..WidgetArgs::default()
        };
        let out = handle_predict(&widgets, path, None, OutputFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["label"], "HIGH RISK (BOTTLENECK)");
        assert_eq!(json["record"]["schema"], "v2");
    }

    #[test]
    fn test_predict_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let err = handle_predict(
            &WidgetArgs::default(),
            dir.path().join("none.ldm"),
            None,
            OutputFormat::Text,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LabDelayError::Prediction(PredictionError::ModelNotFound { .. })
        ));
    }

    #[test]
    fn test_predict_invalid_widget() {
        let widgets = WidgetArgs {
            hour_of_day: Some("25".to_string()),
            ..WidgetArgs::default()
        };
        let err = handle_predict(&widgets, PathBuf::from("unused.ldm"), None, OutputFormat::Text)
            .unwrap_err();
        assert!(matches!(err, LabDelayError::Form(_)));
    }

    #[test]
    fn test_schema_text_lists_both_versions() {
        let out = handle_schema(OutputFormat::Text).unwrap();
        assert!(out.contains("Record schema v1:"));
        assert!(out.contains("Record schema v2:"));
        assert!(out.contains("stress_index"));
        assert!(out.contains("BATCH_392"));
    }

    #[test]
    fn test_schema_json() {
        let json: serde_json::Value =
            serde_json::from_str(&handle_schema(OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["default_schema"], "v2");
        assert_eq!(json["fields"][0]["name"], "lab_occupancy");
    }

    #[test]
    fn test_demo_model_v1_is_linear() {
        let dir = tempfile::tempdir().unwrap();
        let msg = handle_demo_model(&dir.path().join("v1.ldm"), SchemaVersion::V1).unwrap();
        assert!(msg.contains("LinearRegression"));
    }

    #[test]
    fn test_info_text() {
        assert!(info_text().starts_with(&format!("labdelay v{}", crate::VERSION)));
    }
}
