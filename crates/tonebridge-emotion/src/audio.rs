use crate::model::{top_prediction, LabelScore};
use async_trait::async_trait;
use tonebridge_audio::{extract_features, AcousticFeatures};
use tonebridge_core::config::EmotionConfig;
use tonebridge_core::{AudioBuffer, Emotion, EmotionResult, EmotionSource, ModelError};

/// Radius around the (0.5, 0.5) centre that still reads as neutral.
const NEUTRAL_RADIUS: f32 = 0.15;
const NEUTRAL_CONFIDENCE: f32 = 0.4;
const SILENT_CONFIDENCE: f32 = 0.6;
const SILENT_RATIO: f32 = 0.9;
const MAX_CONFIDENCE: f32 = 0.9;
const HIGH_AROUSAL: f32 = 0.75;
/// Distance from the centre to a corner of the unit square.
const MAX_DISTANCE: f32 = 0.707;

/// An audio classifier producing scored emotion labels.
#[async_trait]
pub trait AudioEmotionModel: Send + Sync {
    fn name(&self) -> &str;
    async fn predict(&self, audio: &AudioBuffer) -> Result<Vec<LabelScore>, ModelError>;
}

/// Arousal and valence in [0, 1]; 0.5 is neutral on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affect {
    pub arousal: f32,
    pub valence: f32,
}

impl Affect {
    pub fn new(arousal: f32, valence: f32) -> Self {
        Self {
            arousal: arousal.clamp(0.0, 1.0),
            valence: valence.clamp(0.0, 1.0),
        }
    }

    /// Normalized distance from the neutral centre, in [0, 1].
    pub fn intensity(&self) -> f32 {
        let da = self.arousal - 0.5;
        let dv = self.valence - 0.5;
        ((da * da + dv * dv).sqrt() / MAX_DISTANCE).min(1.0)
    }

    pub fn emotion(&self) -> (Emotion, f32) {
        let intensity = self.intensity();
        if intensity < NEUTRAL_RADIUS {
            return (Emotion::Neutral, NEUTRAL_CONFIDENCE);
        }

        let positive = self.valence >= 0.5;
        let emotion = match (self.arousal >= 0.5, positive) {
            (true, true) if self.arousal >= HIGH_AROUSAL => Emotion::Excited,
            (true, true) => Emotion::Happy,
            (true, false) if self.arousal >= HIGH_AROUSAL => Emotion::Angry,
            (true, false) => Emotion::Frustrated,
            (false, true) => Emotion::Calm,
            (false, false) => Emotion::Sad,
        };
        (emotion, (0.3 + 0.6 * intensity).min(MAX_CONFIDENCE))
    }
}

/// Loudness, brightness and prosody variation drive arousal; pitch height
/// pushes valence up, noisy spectra push it down.
pub fn estimate_affect(features: &AcousticFeatures) -> Affect {
    let loudness = ((features.rms.max(1e-6).log10() + 2.0) / 1.3).clamp(0.0, 1.0);
    let brightness = (features.zero_crossing_rate / 0.15).clamp(0.0, 1.0);
    let dynamics =
        (0.5 * (features.pitch_spread_hz / 50.0) + 0.5 * features.energy_variation).clamp(0.0, 1.0);
    let arousal = 0.5 * loudness + 0.2 * brightness + 0.3 * dynamics;

    let pitch = if features.voiced_frames > 0 {
        ((features.pitch_mean_hz - 165.0) / 85.0).clamp(-1.0, 1.0)
    } else {
        0.0
    };
    let harshness = ((features.zero_crossing_rate - 0.1) / 0.1).clamp(0.0, 1.0);
    let valence = 0.5 + 0.3 * pitch - 0.3 * harshness;

    Affect::new(arousal, valence)
}

/// Prosody heuristic over [`AcousticFeatures`]; no model weights involved.
#[derive(Debug, Default)]
pub struct AcousticModel;

impl AcousticModel {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, audio: &AudioBuffer) -> (Emotion, f32) {
        let features = extract_features(audio);
        if features.silence_ratio >= SILENT_RATIO {
            return (Emotion::Neutral, SILENT_CONFIDENCE);
        }
        let affect = estimate_affect(&features);
        tracing::debug!(
            arousal = affect.arousal,
            valence = affect.valence,
            rms = features.rms,
            pitch_hz = features.pitch_mean_hz,
            "acoustic affect estimate"
        );
        affect.emotion()
    }
}

#[async_trait]
impl AudioEmotionModel for AcousticModel {
    fn name(&self) -> &str {
        "acoustic"
    }

    async fn predict(&self, audio: &AudioBuffer) -> Result<Vec<LabelScore>, ModelError> {
        let (emotion, confidence) = self.analyze(audio);
        Ok(vec![LabelScore::new(emotion.as_str(), confidence)])
    }
}

/// Audio emotion classification with the same degrade-to-neutral policy as
/// the text classifier.
pub struct AudioEmotionClassifier {
    model: Option<Box<dyn AudioEmotionModel>>,
}

impl AudioEmotionClassifier {
    pub fn new(model: Option<Box<dyn AudioEmotionModel>>) -> Self {
        Self { model }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn from_config(config: &EmotionConfig) -> Self {
        let model: Option<Box<dyn AudioEmotionModel>> = match config.audio_model.as_str() {
            "acoustic" => Some(Box::new(AcousticModel::new())),
            "none" => None,
            other => {
                tracing::warn!(model = %other, "unknown audio emotion model, classifier disabled");
                None
            }
        };
        Self::new(model)
    }

    pub fn model_name(&self) -> &str {
        self.model.as_ref().map(|m| m.name()).unwrap_or("none")
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    pub async fn classify(&self, audio: &AudioBuffer) -> EmotionResult {
        let name = self.model_name();
        let Some(model) = self.model.as_ref() else {
            return EmotionResult::degraded(EmotionSource::AudioOnly, name);
        };
        if audio.is_empty() {
            tracing::debug!("empty buffer passed to audio emotion classifier");
            return EmotionResult::degraded(EmotionSource::AudioOnly, name);
        }

        match model.predict(audio).await {
            Ok(predictions) => top_prediction(&predictions, EmotionSource::AudioOnly, name)
                .unwrap_or_else(|| EmotionResult::degraded(EmotionSource::AudioOnly, name)),
            Err(e) => {
                tracing::warn!(model = %name, "audio emotion classification failed: {e}");
                EmotionResult::degraded(EmotionSource::AudioOnly, name)
            }
        }
    }
}
