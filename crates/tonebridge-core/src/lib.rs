pub mod config;
pub mod emotion;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use emotion::{glyph_for, glyph_for_label, glyph_table, Emotion, NEUTRAL_GLYPH};
pub use error::{AudioError, ConfigError, EmotionError, EngineError, ModelError, TranscribeError};
pub use types::{
    AudioBuffer, AudioFormat, BatchStats, ChunkResult, EmotionReport, EmotionResult,
    EmotionSource, EngineKind, TranscriptReport, TranscriptionResult, TARGET_CHANNELS,
    TARGET_SAMPLE_RATE,
};
