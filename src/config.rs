//! Server configuration
//!
//! Built from CLI flags; there is no config file. Log verbosity comes from
//! `RUST_LOG`.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::{
    artifact::DEFAULT_MODEL_PATH,
    error::{LabDelayError, Result},
    predictor::Predictor,
    record::SchemaVersion,
};

/// Default bind host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port
pub const DEFAULT_PORT: u16 = 8501;

/// Everything the HTTP service needs to start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Model artifact, re-read on every prediction
    pub model_path: PathBuf,
    /// Force a record schema instead of the one the artifact declares
    pub schema_override: Option<SchemaVersion>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            schema_override: None,
        }
    }
}

impl ServerConfig {
    /// Parsed bind address
    ///
    /// # Errors
    ///
    /// Returns `LabDelayError::Config` when host and port do not form a
    /// socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let raw = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        };
        raw.parse()
            .map_err(|e| LabDelayError::Config(format!("Invalid address '{raw}': {e}")))
    }

    /// Predictor for the configured model
    #[must_use]
    pub fn predictor(&self) -> Predictor {
        Predictor::new(self.model_path.clone()).with_schema(self.schema_override)
    }

    /// Schema shown in the overview table before any prediction
    #[must_use]
    pub fn display_schema(&self) -> SchemaVersion {
        self.schema_override.unwrap_or_default()
    }
}
