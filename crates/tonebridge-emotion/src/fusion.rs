use tonebridge_core::config::FusionConfig;
use tonebridge_core::{EmotionError, EmotionResult, EmotionSource};

pub const DEFAULT_DISAGREEMENT_DISCOUNT: f32 = 0.8;

/// Combines text and audio emotion results into one decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionPolicy {
    disagreement_discount: f32,
}

impl FusionPolicy {
    /// `discount` outside (0, 1] falls back to the default.
    pub fn new(discount: f32) -> Self {
        let disagreement_discount = if discount > 0.0 && discount <= 1.0 {
            discount
        } else {
            tracing::warn!(discount, "invalid disagreement discount, using default");
            DEFAULT_DISAGREEMENT_DISCOUNT
        };
        Self {
            disagreement_discount,
        }
    }

    pub fn from_config(config: &FusionConfig) -> Self {
        Self::new(config.disagreement_discount)
    }

    pub fn disagreement_discount(&self) -> f32 {
        self.disagreement_discount
    }

    pub fn fuse(
        &self,
        text: Option<EmotionResult>,
        audio: Option<EmotionResult>,
    ) -> Result<EmotionResult, EmotionError> {
        let (text, audio) = match (text, audio) {
            (None, None) => return Err(EmotionError::InsufficientInput),
            (Some(only), None) | (None, Some(only)) => return Ok(only),
            (Some(text), Some(audio)) => (text, audio),
        };

        // A missing model is not evidence.
        match (text.degraded, audio.degraded) {
            (true, false) => return Ok(audio),
            (false, true) => return Ok(text),
            _ => {}
        }

        let model = format!("{}+{}", text.model, audio.model);
        let both_degraded = text.degraded && audio.degraded;

        let mut fused = if text.emotion == audio.emotion {
            EmotionResult::new(
                text.emotion,
                text.confidence.max(audio.confidence),
                EmotionSource::Fused,
                &model,
            )
        } else {
            let winner = if audio.confidence > text.confidence {
                &audio
            } else {
                &text
            };
            let mean = (text.confidence + audio.confidence) / 2.0;
            let confidence = (mean * self.disagreement_discount).min(winner.confidence);
            tracing::debug!(
                text = %text.emotion,
                audio = %audio.emotion,
                winner = %winner.emotion,
                confidence,
                "modalities disagree"
            );
            EmotionResult::new(winner.emotion, confidence, EmotionSource::Fused, &model)
        };
        fused.degraded = both_degraded;
        Ok(fused)
    }
}

impl Default for FusionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_DISAGREEMENT_DISCOUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonebridge_core::Emotion;

    fn text(emotion: Emotion, confidence: f32) -> EmotionResult {
        EmotionResult::new(emotion, confidence, EmotionSource::TextOnly, "lexicon")
    }

    fn audio(emotion: Emotion, confidence: f32) -> EmotionResult {
        EmotionResult::new(emotion, confidence, EmotionSource::AudioOnly, "acoustic")
    }

    #[test]
    fn test_nothing_to_fuse() {
        assert_eq!(
            FusionPolicy::default().fuse(None, None),
            Err(EmotionError::InsufficientInput)
        );
    }

    #[test]
    fn test_single_modality_passes_through() {
        let policy = FusionPolicy::default();
        let t = text(Emotion::Sad, 0.7);
        assert_eq!(policy.fuse(Some(t.clone()), None).unwrap(), t);
        let a = audio(Emotion::Calm, 0.4);
        assert_eq!(policy.fuse(None, Some(a.clone())).unwrap(), a);
    }

    #[test]
    fn test_agreement_takes_max_confidence() {
        let fused = FusionPolicy::default()
            .fuse(Some(text(Emotion::Happy, 0.8)), Some(audio(Emotion::Happy, 0.6)))
            .unwrap();
        assert_eq!(fused.emotion, Emotion::Happy);
        assert_eq!(fused.confidence, 0.8);
        assert_eq!(fused.source, EmotionSource::Fused);
        assert_eq!(fused.model, "lexicon+acoustic");
    }

    #[test]
    fn test_disagreement_picks_stronger_and_discounts() {
        let fused = FusionPolicy::default()
            .fuse(Some(text(Emotion::Happy, 0.9)), Some(audio(Emotion::Angry, 0.4)))
            .unwrap();
        assert_eq!(fused.emotion, Emotion::Happy);
        assert!(fused.confidence < 0.9);
        // (0.9 + 0.4) / 2 * 0.8
        assert!((fused.confidence - 0.52).abs() < 1e-6);
        assert_eq!(fused.glyph, "😊");
    }

    #[test]
    fn test_disagreement_audio_can_win() {
        let fused = FusionPolicy::default()
            .fuse(Some(text(Emotion::Calm, 0.3)), Some(audio(Emotion::Angry, 0.7)))
            .unwrap();
        assert_eq!(fused.emotion, Emotion::Angry);
    }

    #[test]
    fn test_tie_goes_to_text() {
        let fused = FusionPolicy::default()
            .fuse(Some(text(Emotion::Sad, 0.5)), Some(audio(Emotion::Fear, 0.5)))
            .unwrap();
        assert_eq!(fused.emotion, Emotion::Sad);
    }

    #[test]
    fn test_confidence_never_exceeds_winner() {
        let fused = FusionPolicy::new(1.0)
            .fuse(Some(text(Emotion::Sad, 0.6)), Some(audio(Emotion::Fear, 0.55)))
            .unwrap();
        assert!(fused.confidence <= 0.6);
    }

    #[test]
    fn test_degraded_side_is_ignored() {
        let policy = FusionPolicy::default();
        let degraded = EmotionResult::degraded(EmotionSource::TextOnly, "none");
        let a = audio(Emotion::Excited, 0.6);
        assert_eq!(policy.fuse(Some(degraded), Some(a.clone())).unwrap(), a);
    }

    #[test]
    fn test_both_degraded_stays_degraded() {
        let fused = FusionPolicy::default()
            .fuse(
                Some(EmotionResult::degraded(EmotionSource::TextOnly, "none")),
                Some(EmotionResult::degraded(EmotionSource::AudioOnly, "none")),
            )
            .unwrap();
        assert_eq!(fused.emotion, Emotion::Neutral);
        assert!(fused.degraded);
    }

    #[test]
    fn test_invalid_discount_falls_back() {
        assert_eq!(FusionPolicy::new(0.0).disagreement_discount(), 0.8);
        assert_eq!(FusionPolicy::new(1.5).disagreement_discount(), 0.8);
        assert_eq!(FusionPolicy::new(0.5).disagreement_discount(), 0.5);
    }
}
