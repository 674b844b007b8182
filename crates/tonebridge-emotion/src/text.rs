use crate::lexicon::LexiconModel;
use crate::model::{top_prediction, LabelScore};
use crate::remote_model::RemoteTextModel;
use async_trait::async_trait;
use tonebridge_core::config::EmotionConfig;
use tonebridge_core::{EmotionResult, EmotionSource, ModelError};

/// A text classifier producing scored emotion labels.
#[async_trait]
pub trait TextEmotionModel: Send + Sync {
    fn name(&self) -> &str;
    async fn predict(&self, text: &str) -> Result<Vec<LabelScore>, ModelError>;
}

/// Text emotion classification that never fails: without a usable model
/// it answers neutral with zero confidence.
pub struct TextEmotionClassifier {
    model: Option<Box<dyn TextEmotionModel>>,
}

impl TextEmotionClassifier {
    pub fn new(model: Option<Box<dyn TextEmotionModel>>) -> Self {
        Self { model }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Build the model named by `config.text_model`.
    pub fn from_config(config: &EmotionConfig) -> Self {
        let model: Option<Box<dyn TextEmotionModel>> = match config.text_model.as_str() {
            "lexicon" => Some(Box::new(LexiconModel::new())),
            "remote" => match RemoteTextModel::new(&config.remote) {
                Ok(model) => Some(Box::new(model)),
                Err(e) => {
                    tracing::warn!("remote text emotion model unavailable: {e}");
                    None
                }
            },
            "none" => None,
            other => {
                tracing::warn!(model = %other, "unknown text emotion model, classifier disabled");
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

    pub async fn classify(&self, text: &str) -> EmotionResult {
        let name = self.model_name();
        let Some(model) = self.model.as_ref() else {
            tracing::debug!("no text emotion model configured");
            return EmotionResult::degraded(EmotionSource::TextOnly, name);
        };

        let text = text.trim();
        if text.is_empty() {
            tracing::debug!("empty text passed to text emotion classifier");
            return EmotionResult::degraded(EmotionSource::TextOnly, name);
        }

        match model.predict(text).await {
            Ok(predictions) => top_prediction(&predictions, EmotionSource::TextOnly, name)
                .unwrap_or_else(|| {
                    tracing::warn!(model = %name, "text emotion model returned no predictions");
                    EmotionResult::degraded(EmotionSource::TextOnly, name)
                }),
            Err(e) => {
                tracing::warn!(model = %name, "text emotion classification failed: {e}");
                EmotionResult::degraded(EmotionSource::TextOnly, name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonebridge_core::Emotion;

    struct FixedModel(Result<Vec<LabelScore>, ModelError>);

    #[async_trait]
    impl TextEmotionModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn predict(&self, _text: &str) -> Result<Vec<LabelScore>, ModelError> {
            self.0.clone()
        }
    }

    fn classifier(result: Result<Vec<LabelScore>, ModelError>) -> TextEmotionClassifier {
        TextEmotionClassifier::new(Some(Box::new(FixedModel(result))))
    }

    #[tokio::test]
    async fn test_classify_uses_top_label() {
        let c = classifier(Ok(vec![
            LabelScore::new("anger", 0.3),
            LabelScore::new("joy", 0.6),
        ]));
        let result = c.classify("whatever").await;
        assert_eq!(result.emotion, Emotion::Happy);
        assert_eq!(result.confidence, 0.6);
        assert_eq!(result.source, EmotionSource::TextOnly);
        assert_eq!(result.model, "fixed");
    }

    #[tokio::test]
    async fn test_model_error_degrades_to_neutral() {
        let c = classifier(Err(ModelError::Inference("boom".to_string())));
        let result = c.classify("hello").await;
        assert_eq!(result.emotion, Emotion::Neutral);
        assert_eq!(result.confidence, 0.0);
        assert!(result.degraded);
    }

    #[tokio::test]
    async fn test_empty_prediction_degrades() {
        let result = classifier(Ok(Vec::new())).classify("hello").await;
        assert!(result.degraded);
    }

    #[tokio::test]
    async fn test_no_model_degrades() {
        let c = TextEmotionClassifier::disabled();
        assert!(!c.is_available());
        let result = c.classify("I am thrilled").await;
        assert_eq!(result.emotion, Emotion::Neutral);
        assert_eq!(result.model, "none");
        assert!(result.degraded);
    }

    #[tokio::test]
    async fn test_blank_text_degrades() {
        let c = classifier(Ok(vec![LabelScore::new("joy", 0.9)]));
        assert!(c.classify("   ").await.degraded);
    }

    #[test]
    fn test_from_config_selects_model() {
        let mut config = EmotionConfig::default();
        assert_eq!(TextEmotionClassifier::from_config(&config).model_name(), "lexicon");
        config.text_model = "none".to_string();
        assert!(!TextEmotionClassifier::from_config(&config).is_available());
        config.text_model = "remote".to_string();
        assert_eq!(TextEmotionClassifier::from_config(&config).model_name(), "remote");
    }
}
