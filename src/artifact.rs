//! Model artifact container
//!
//! A model file is a fixed 32-byte header followed by two JSON sections:
//!
//! ```text
//! [0..4]   magic "LDMA"
//! [4]      format version major
//! [5]      format version minor
//! [6..8]   reserved
//! [8..10]  model kind (u16 LE)
//! [10..12] schema version (u16 LE)
//! [12..16] metadata length (u32 LE)
//! [16..20] payload length (u32 LE)
//! [20..32] reserved
//! metadata JSON  {name, version, feature_names, description}
//! payload JSON   {preprocessor, regressor}
//! ```
//!
//! Loading checks the header, both sections, and that the declared feature
//! names, the schema version, and the preprocessor all agree. A file that
//! decodes is therefore safe to call `predict` on.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    error::Result,
    model::{ModelError, ModelKind, Pipeline},
    record::{FeatureRecord, RecordError, SchemaVersion},
};

/// Magic bytes at offset 0
pub const MAGIC: [u8; 4] = *b"LDMA";

/// Header size in bytes
pub const HEADER_SIZE: usize = 32;

/// Container format version written by this crate
pub const FORMAT_VERSION: (u8, u8) = (1, 0);

/// Model path used when none is configured
pub const DEFAULT_MODEL_PATH: &str = "lab_delay_model_v2.ldm";

/// Errors while reading, decoding or writing an artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// No file at the path
    #[error("Model file '{}' not found", .path.display())]
    NotFound {
        /// Path that was tried
        path: PathBuf,
    },

    /// File exists but could not be read or written
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Fewer bytes than a header
    #[error("Artifact too short: {len} bytes, header needs {}", HEADER_SIZE)]
    TooShort {
        /// Bytes available
        len: usize,
    },

    /// Magic bytes do not match
    #[error("Not a model artifact (magic {found:?})")]
    BadMagic {
        /// Bytes found at offset 0
        found: [u8; 4],
    },

    /// Container version this crate cannot read
    #[error("Unsupported artifact version {major}.{minor}")]
    UnsupportedVersion {
        /// Major version
        major: u8,
        /// Minor version
        minor: u8,
    },

    /// Unknown model kind code
    #[error("Unsupported model type 0x{0:04x}")]
    UnknownModelKind(u16),

    /// Unknown schema version code
    #[error("Unsupported feature schema version {0}")]
    UnknownSchemaVersion(u16),

    /// Sections extend past the end of the file
    #[error("Artifact truncated: expected {expected} bytes, found {actual}")]
    Truncated {
        /// Size implied by the header
        expected: usize,
        /// Actual size
        actual: usize,
    },

    /// Metadata JSON could not be decoded or encoded
    #[error("Invalid model metadata: {0}")]
    Metadata(String),

    /// Payload JSON could not be decoded or encoded
    #[error("Invalid model payload: {0}")]
    Payload(String),

    /// Header kind disagrees with the payload regressor
    #[error("Model type mismatch: header says {}, payload is {}", .header.name(), .payload.name())]
    KindMismatch {
        /// Kind in the header
        header: ModelKind,
        /// Kind of the decoded regressor
        payload: ModelKind,
    },

    /// Preprocessor does not read exactly the declared feature names
    #[error("Preprocessor columns {columns:?} do not match declared features {features:?}")]
    PreprocessorColumns {
        /// Columns read by the preprocessor
        columns: Vec<String>,
        /// Feature names from the metadata
        features: Vec<String>,
    },

    /// Declared feature names do not match the declared schema
    #[error("{0}")]
    Schema(#[from] RecordError),

    /// Pipeline failed internal validation
    #[error("{0}")]
    Model(#[from] ModelError),
}

/// Decoded header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactHeader {
    /// Container version (major, minor)
    pub version: (u8, u8),
    /// Regressor family
    pub kind: ModelKind,
    /// Feature schema the model consumes
    pub schema: SchemaVersion,
    /// Metadata section length
    pub metadata_len: u32,
    /// Payload section length
    pub payload_len: u32,
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

impl ArtifactHeader {
    /// Parse the first [`HEADER_SIZE`] bytes
    ///
    /// # Errors
    ///
    /// Fails on short input, wrong magic, unsupported version, or unknown codes.
    pub fn parse(bytes: &[u8]) -> std::result::Result<Self, ArtifactError> {
        if bytes.len() < HEADER_SIZE {
            return Err(ArtifactError::TooShort { len: bytes.len() });
        }
        let found = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if found != MAGIC {
            return Err(ArtifactError::BadMagic { found });
        }
        let (major, minor) = (bytes[4], bytes[5]);
        if major != FORMAT_VERSION.0 {
            return Err(ArtifactError::UnsupportedVersion { major, minor });
        }
        let kind_code = read_u16(bytes, 8);
        let kind = ModelKind::from_code(kind_code).ok_or(ArtifactError::UnknownModelKind(kind_code))?;
        let schema_code = read_u16(bytes, 10);
        let schema = SchemaVersion::from_code(schema_code)
            .ok_or(ArtifactError::UnknownSchemaVersion(schema_code))?;

        Ok(Self {
            version: (major, minor),
            kind,
            schema,
            metadata_len: read_u32(bytes, 12),
            payload_len: read_u32(bytes, 16),
        })
    }

    /// Encode as [`HEADER_SIZE`] bytes
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&MAGIC);
        out[4] = self.version.0;
        out[5] = self.version.1;
        out[8..10].copy_from_slice(&self.kind.code().to_le_bytes());
        out[10..12].copy_from_slice(&self.schema.code().to_le_bytes());
        out[12..16].copy_from_slice(&self.metadata_len.to_le_bytes());
        out[16..20].copy_from_slice(&self.payload_len.to_le_bytes());
        out
    }

    /// Total file size implied by the header
    #[must_use]
    pub fn total_len(&self) -> usize {
        HEADER_SIZE + self.metadata_len as usize + self.payload_len as usize
    }
}

/// Descriptive metadata stored with the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name
    pub name: String,
    /// Model version string
    pub version: String,
    /// Record columns the model was trained on
    pub feature_names: Vec<String>,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A decoded, validated model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    /// Descriptive metadata
    pub metadata: ModelMetadata,
    /// Feature schema the model consumes
    pub schema: SchemaVersion,
    /// Preprocessor and regressor
    pub pipeline: Pipeline,
}

impl ModelArtifact {
    /// Assemble and validate an artifact
    ///
    /// # Errors
    ///
    /// Fails when the metadata, schema and pipeline disagree.
    pub fn new(
        metadata: ModelMetadata,
        schema: SchemaVersion,
        pipeline: Pipeline,
    ) -> std::result::Result<Self, ArtifactError> {
        let artifact = Self {
            metadata,
            schema,
            pipeline,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    /// Regressor family
    #[must_use]
    pub fn kind(&self) -> ModelKind {
        self.pipeline.regressor.kind()
    }

    /// Check metadata, schema and pipeline consistency
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> std::result::Result<(), ArtifactError> {
        self.schema.check_columns(&self.metadata.feature_names)?;

        let mut columns: Vec<String> = self
            .pipeline
            .preprocessor
            .input_columns()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        let mut features = self.metadata.feature_names.clone();
        columns.sort();
        features.sort();
        if columns != features {
            return Err(ArtifactError::PreprocessorColumns { columns, features });
        }

        self.pipeline.validate()?;
        Ok(())
    }

    /// Decode from bytes
    ///
    /// # Errors
    ///
    /// Fails on any header, section or consistency error.
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, ArtifactError> {
        let header = ArtifactHeader::parse(bytes)?;
        if bytes.len() < header.total_len() {
            return Err(ArtifactError::Truncated {
                expected: header.total_len(),
                actual: bytes.len(),
            });
        }

        let meta_end = HEADER_SIZE + header.metadata_len as usize;
        let metadata: ModelMetadata = serde_json::from_slice(&bytes[HEADER_SIZE..meta_end])
            .map_err(|e| ArtifactError::Metadata(e.to_string()))?;
        let pipeline: Pipeline = serde_json::from_slice(&bytes[meta_end..header.total_len()])
            .map_err(|e| ArtifactError::Payload(e.to_string()))?;

        let payload_kind = pipeline.regressor.kind();
        if payload_kind != header.kind {
            return Err(ArtifactError::KindMismatch {
                header: header.kind,
                payload: payload_kind,
            });
        }

        Self::new(metadata, header.schema, pipeline)
    }

    /// Encode to bytes
    ///
    /// # Errors
    ///
    /// Fails if a section cannot be serialized or exceeds `u32::MAX` bytes.
    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, ArtifactError> {
        let metadata =
            serde_json::to_vec(&self.metadata).map_err(|e| ArtifactError::Metadata(e.to_string()))?;
        let payload =
            serde_json::to_vec(&self.pipeline).map_err(|e| ArtifactError::Payload(e.to_string()))?;

        let header = ArtifactHeader {
            version: FORMAT_VERSION,
            kind: self.kind(),
            schema: self.schema,
            metadata_len: u32::try_from(metadata.len())
                .map_err(|_| ArtifactError::Metadata("section too large".to_string()))?,
            payload_len: u32::try_from(payload.len())
                .map_err(|_| ArtifactError::Payload("section too large".to_string()))?,
        };

        let mut out = Vec::with_capacity(header.total_len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&metadata);
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Read and decode a model file
    ///
    /// # Errors
    ///
    /// `NotFound` when the file does not exist, otherwise any read or decode
    /// error.
    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, ArtifactError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ArtifactError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ArtifactError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        Self::from_bytes(&bytes)
    }

    /// Encode and write a model file
    ///
    /// # Errors
    ///
    /// Fails on encoding or write errors.
    pub fn save(&self, path: impl AsRef<Path>) -> std::result::Result<(), ArtifactError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|e| ArtifactError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Predict the delay in minutes for one record
    ///
    /// The record must be of the artifact's schema version and carry exactly
    /// the declared feature names.
    ///
    /// # Errors
    ///
    /// Schema version or column mismatch, or a model evaluation failure.
    pub fn predict(&self, record: &FeatureRecord) -> Result<f64> {
        if record.version() != self.schema {
            return Err(RecordError::VersionMismatch {
                model: self.schema,
                record: record.version(),
            }
            .into());
        }
        record.validate_columns(&self.metadata.feature_names)?;
        Ok(self.pipeline.predict(record)?)
    }
}
