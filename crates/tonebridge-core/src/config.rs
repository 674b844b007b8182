use crate::error::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub transcription: TranscriptionConfig,

    #[serde(default)]
    pub emotion: EmotionConfig,

    #[serde(default)]
    pub fusion: FusionConfig,

    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Payloads smaller than this are logged as suspicious, not rejected.
    #[serde(default = "default_min_audio_bytes")]
    pub min_audio_bytes: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            min_audio_bytes: default_min_audio_bytes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranscriptionConfig {
    /// Engine names in the order they should be tried.
    #[serde(default = "default_chain")]
    pub chain: Vec<String>,

    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,

    #[serde(default = "default_language")]
    pub language: String,

    /// Engine-specific tables, keyed by engine name.
    #[serde(default)]
    pub engines: HashMap<String, toml::Value>,
}

impl TranscriptionConfig {
    /// Settings table for one engine, empty when not configured.
    pub fn engine_config(&self, name: &str) -> toml::Value {
        self.engines
            .get(name)
            .cloned()
            .unwrap_or_else(|| toml::Value::Table(Default::default()))
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            chain: default_chain(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            language: default_language(),
            engines: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmotionConfig {
    #[serde(default = "default_text_model")]
    pub text_model: String,

    #[serde(default = "default_audio_model")]
    pub audio_model: String,

    #[serde(default)]
    pub remote: RemoteModelConfig,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            text_model: default_text_model(),
            audio_model: default_audio_model(),
            remote: RemoteModelConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteModelConfig {
    #[serde(default = "default_remote_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_remote_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_remote_endpoint(),
            api_key: None,
            timeout_secs: default_remote_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FusionConfig {
    #[serde(default = "default_disagreement_discount")]
    pub disagreement_discount: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            disagreement_discount: default_disagreement_discount(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BatchConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

pub const TEXT_MODELS: [&str; 3] = ["lexicon", "remote", "none"];
pub const AUDIO_MODELS: [&str; 2] = ["acoustic", "none"];

fn default_log_level() -> String {
    "info".to_string()
}

fn default_min_audio_bytes() -> usize {
    100
}

fn default_chain() -> Vec<String> {
    vec![
        "whisper".to_string(),
        "cloud".to_string(),
        "offline".to_string(),
    ]
}

fn default_attempt_timeout_secs() -> u64 {
    30
}

fn default_language() -> String {
    "en".to_string()
}

fn default_text_model() -> String {
    "lexicon".to_string()
}

fn default_audio_model() -> String {
    "acoustic".to_string()
}

fn default_remote_endpoint() -> String {
    "https://api-inference.huggingface.co/models/SamLowe/roberta-base-go_emotions".to_string()
}

fn default_remote_timeout_secs() -> u64 {
    10
}

fn default_disagreement_discount() -> f32 {
    0.8
}

fn default_max_concurrency() -> usize {
    4
}

/// Interpolate `${VAR}` patterns with environment variable values.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::Invalid(e.to_string()))?;
    let mut result = input.to_string();
    let mut errors = Vec::new();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(val) => {
                result = result.replace(&cap[0], &val);
            }
            Err(_) => {
                errors.push(var_name.to_string());
            }
        }
    }

    if let Some(first_missing) = errors.into_iter().next() {
        return Err(ConfigError::EnvVarNotFound(first_missing));
    }

    Ok(result)
}

impl AppConfig {
    /// Load configuration from a TOML file, with environment variable interpolation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Like [`load_from_file`](Self::load_from_file), but a missing file yields defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let interpolated = interpolate_env_vars(s)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let discount = self.fusion.disagreement_discount;
        if !(discount > 0.0 && discount <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "fusion.disagreement_discount must be in (0, 1], got {discount}"
            )));
        }
        if self.batch.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "batch.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.transcription.attempt_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "transcription.attempt_timeout_secs must be at least 1".to_string(),
            ));
        }
        if !TEXT_MODELS.contains(&self.emotion.text_model.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unknown emotion.text_model '{}'",
                self.emotion.text_model
            )));
        }
        if !AUDIO_MODELS.contains(&self.emotion.audio_model.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unknown emotion.audio_model '{}'",
                self.emotion.audio_model
            )));
        }
        Ok(())
    }
}
