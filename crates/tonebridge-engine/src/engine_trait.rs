use async_trait::async_trait;
use tonebridge_core::{AudioBuffer, EngineError, EngineKind};

/// Raw output of a single engine attempt, before confidence scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    pub text: String,
    /// Vendor-supplied confidence, when the backend reports one.
    pub raw_confidence: Option<f32>,
}

impl EngineOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            raw_confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.raw_confidence = Some(confidence);
        self
    }
}

/// A swappable speech-to-text backend.
///
/// Engines are created through [`EngineRegistry`](crate::EngineRegistry),
/// configured once with [`initialize`](Self::initialize), and then asked
/// to [`attempt`](Self::attempt) a transcription of a normalized buffer.
#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    /// Registry name, e.g. `"whisper"` or `"cloud"`.
    fn name(&self) -> &str;
    /// Position of this engine in the fallback chain.
    fn kind(&self) -> EngineKind;
    /// One-time initialisation with engine-specific TOML configuration.
    /// An error here means the engine is unavailable for this process.
    async fn initialize(&mut self, config: toml::Value) -> Result<(), EngineError>;
    /// Transcribe one 16 kHz mono buffer.
    async fn attempt(&self, audio: &AudioBuffer) -> Result<EngineOutput, EngineError>;
}
