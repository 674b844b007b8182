use serde::Deserialize;
use tonebridge_core::{Emotion, EmotionResult, EmotionSource};

/// One label with its score, as emitted by a classification model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Highest-scoring prediction mapped onto the supported label set.
/// Labels outside the set become neutral with the same score.
pub fn top_prediction(
    predictions: &[LabelScore],
    source: EmotionSource,
    model: &str,
) -> Option<EmotionResult> {
    let best = predictions
        .iter()
        .filter(|p| !p.score.is_nan())
        .max_by(|a, b| a.score.total_cmp(&b.score))?;

    let emotion = Emotion::from_label(&best.label).unwrap_or_else(|| {
        tracing::debug!(label = %best.label, "unmapped emotion label, using neutral");
        Emotion::Neutral
    });
    Some(EmotionResult::new(emotion, best.score, source, model))
}
