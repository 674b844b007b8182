use crate::emotion::{glyph_for, Emotion};
use crate::error::AudioError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical sample rate of every normalized buffer.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Canonical channel count of every normalized buffer.
pub const TARGET_CHANNELS: u16 = 1;

/// Mono 16 kHz PCM samples in `[-1.0, 1.0]`.
///
/// Only the decoder builds these from raw input, so the rate and channel
/// count are fixed by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>) -> Self {
        Self {
            samples,
            sample_rate: TARGET_SAMPLE_RATE,
            channels: TARGET_CHANNELS,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Container or encoding declared by the caller for an audio payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Wav,
    Flac,
    Mp3,
    Ogg,
    M4a,
    Webm,
    /// Headerless little-endian signed 16-bit mono at 16 kHz.
    Pcm16,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 7] = [
        AudioFormat::Wav,
        AudioFormat::Flac,
        AudioFormat::Mp3,
        AudioFormat::Ogg,
        AudioFormat::M4a,
        AudioFormat::Webm,
        AudioFormat::Pcm16,
    ];

    /// File extension used as a probe hint.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Ogg => "ogg",
            AudioFormat::M4a => "m4a",
            AudioFormat::Webm => "webm",
            AudioFormat::Pcm16 => "pcm",
        }
    }

    /// Guess the format from a file path's extension.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wav" | "wave" => Ok(AudioFormat::Wav),
            "flac" => Ok(AudioFormat::Flac),
            "mp3" => Ok(AudioFormat::Mp3),
            "ogg" | "oga" => Ok(AudioFormat::Ogg),
            "m4a" | "mp4" | "aac" => Ok(AudioFormat::M4a),
            "webm" => Ok(AudioFormat::Webm),
            "pcm" | "raw" | "s16le" => Ok(AudioFormat::Pcm16),
            other => Err(AudioError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Transcription backends, in fallback priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    PrimaryModel,
    CloudApi,
    OfflineFallback,
}

impl EngineKind {
    pub const PRIORITY: [EngineKind; 3] = [
        EngineKind::PrimaryModel,
        EngineKind::CloudApi,
        EngineKind::OfflineFallback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::PrimaryModel => "primary_model",
            EngineKind::CloudApi => "cloud_api",
            EngineKind::OfflineFallback => "offline_fallback",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionResult {
    pub text: String,
    pub confidence: f32,
    pub engine: EngineKind,
    /// Name of the concrete engine, e.g. `whisper`.
    pub engine_name: String,
    pub language: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionSource {
    TextOnly,
    AudioOnly,
    Fused,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionResult {
    pub emotion: Emotion,
    pub confidence: f32,
    pub source: EmotionSource,
    pub glyph: &'static str,
    pub model: String,
    /// Set when this is the neutral stand-in for an unavailable model.
    pub degraded: bool,
}

impl EmotionResult {
    pub fn new(emotion: Emotion, confidence: f32, source: EmotionSource, model: &str) -> Self {
        Self {
            emotion,
            confidence: clamp_unit(confidence),
            source,
            glyph: glyph_for(emotion),
            model: model.to_string(),
            degraded: false,
        }
    }

    /// Neutral, zero-confidence result used when a classifier cannot run.
    pub fn degraded(source: EmotionSource, model: &str) -> Self {
        Self {
            degraded: true,
            ..Self::new(Emotion::Neutral, 0.0, source, model)
        }
    }
}

/// Final emotion decision together with the modality results behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionReport {
    pub result: EmotionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_emotion: Option<EmotionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_emotion: Option<EmotionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptReport {
    pub transcription: TranscriptionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<EmotionResult>,
}

/// Outcome of one segment in a batch. Failed segments read as empty text
/// with zero confidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkResult {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<TranscriptionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChunkResult {
    pub fn success(index: usize, transcription: TranscriptionResult) -> Self {
        Self {
            index,
            transcription: Some(transcription),
            error: None,
        }
    }

    pub fn failure(index: usize, error: impl Into<String>) -> Self {
        Self {
            index,
            transcription: None,
            error: Some(error.into()),
        }
    }

    pub fn text(&self) -> &str {
        self.transcription
            .as_ref()
            .map(|t| t.text.as_str())
            .unwrap_or("")
    }

    pub fn confidence(&self) -> f32 {
        self.transcription
            .as_ref()
            .map(|t| t.confidence)
            .unwrap_or(0.0)
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && !self.text().trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchStats {
    pub total_characters: usize,
    pub total_words: usize,
    pub average_confidence: f32,
    pub successful_chunks: usize,
    pub total_chunks: usize,
    pub success_rate: f32,
}

impl BatchStats {
    pub fn from_results(results: &[ChunkResult]) -> Self {
        if results.is_empty() {
            return Self::default();
        }

        let joined = results
            .iter()
            .map(ChunkResult::text)
            .collect::<Vec<_>>()
            .join(" ");
        let total = results.len();
        let successful = results.iter().filter(|r| r.is_success()).count();
        let confidence_sum: f32 = results.iter().map(ChunkResult::confidence).sum();

        Self {
            total_characters: joined.chars().count(),
            total_words: joined.split_whitespace().count(),
            average_confidence: confidence_sum / total as f32,
            successful_chunks: successful,
            total_chunks: total,
            success_rate: successful as f32 / total as f32,
        }
    }
}

pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
