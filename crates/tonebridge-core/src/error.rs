use crate::types::{AudioFormat, EngineKind};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AudioError {
    #[error("failed to decode {format} audio: {reason}")]
    Decode { format: AudioFormat, reason: String },

    #[error("decoded {format} audio contains no samples")]
    Empty { format: AudioFormat },

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("{engine} engine '{name}' unavailable: {reason}")]
    Unavailable {
        engine: EngineKind,
        name: String,
        reason: String,
    },

    #[error("{engine} engine '{name}' request failed: {reason}")]
    Request {
        engine: EngineKind,
        name: String,
        reason: String,
    },

    #[error("{engine} engine '{name}' could not understand the audio")]
    NoMatch { engine: EngineKind, name: String },

    #[error("{engine} engine '{name}' returned empty text")]
    EmptyText { engine: EngineKind, name: String },

    #[error("{engine} engine '{name}' timed out after {after:?}")]
    Timeout {
        engine: EngineKind,
        name: String,
        after: Duration,
    },

    #[error("transcription engine not found: {0}")]
    NotFound(String),

    #[error("transcription engine initialization failed: {0}")]
    InitializationFailed(String),
}

impl EngineError {
    /// The engine kind this failure belongs to, when it came from an attempt.
    pub fn engine(&self) -> Option<EngineKind> {
        match self {
            EngineError::Unavailable { engine, .. }
            | EngineError::Request { engine, .. }
            | EngineError::NoMatch { engine, .. }
            | EngineError::EmptyText { engine, .. }
            | EngineError::Timeout { engine, .. } => Some(*engine),
            EngineError::NotFound(_) | EngineError::InitializationFailed(_) => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TranscribeError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error("all transcription engines failed ({})", describe_last(.last))]
    AllEnginesFailed {
        attempted: Vec<EngineKind>,
        last: Option<EngineError>,
    },
}

fn describe_last(last: &Option<EngineError>) -> String {
    match last {
        Some(err) => format!("last error: {err}"),
        None => "no engines available".to_string(),
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmotionError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("emotion fusion needs at least one modality result")]
    InsufficientInput,

    #[error(transparent)]
    Audio(#[from] AudioError),
}

/// Failure inside an emotion model. Classifiers turn this into a degraded
/// neutral result; it never reaches the caller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("emotion model unavailable: {0}")]
    Unavailable(String),

    #[error("emotion model inference failed: {0}")]
    Inference(String),
}
