use crate::batch::{BatchReport, ChunkAggregator, DEFAULT_MAX_CONCURRENCY};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tonebridge_audio::AudioNormalizer;
use tonebridge_core::{
    glyph_table, AppConfig, AudioBuffer, AudioFormat, Emotion, EmotionError, EmotionReport,
    EmotionResult, TranscribeError, TranscriptReport, TranscriptionResult,
};
use tonebridge_emotion::{AudioEmotionClassifier, FusionPolicy, TextEmotionClassifier};
use tonebridge_engine::{EngineRegistry, EngineSet, EngineStatus, TranscriptionOrchestrator};

/// Which modalities an emotion request should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    TextOnly,
    AudioOnly,
    #[default]
    Combined,
}

impl DetectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMode::TextOnly => "text_only",
            DetectionMode::AudioOnly => "audio_only",
            DetectionMode::Combined => "combined",
        }
    }
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionMode {
    type Err = EmotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "text_only" => Ok(DetectionMode::TextOnly),
            "audio" | "audio_only" => Ok(DetectionMode::AudioOnly),
            "combined" | "both" => Ok(DetectionMode::Combined),
            other => Err(EmotionError::Validation(format!(
                "unknown detection mode '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EmotionRequest {
    pub text: Option<String>,
    pub audio: Option<Vec<u8>>,
    pub format: AudioFormat,
    pub mode: DetectionMode,
}

impl EmotionRequest {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            mode: DetectionMode::TextOnly,
            ..Default::default()
        }
    }

    pub fn from_audio(audio: Vec<u8>, format: AudioFormat) -> Self {
        Self {
            audio: Some(audio),
            format,
            mode: DetectionMode::AudioOnly,
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: DetectionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_audio(mut self, audio: Vec<u8>, format: AudioFormat) -> Self {
        self.audio = Some(audio);
        self.format = format;
        self
    }
}

/// What this service instance can do, for display to operators.
#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    pub engines: Vec<EngineStatus>,
    pub text_model: String,
    pub audio_model: String,
    pub emotions: Vec<&'static str>,
    pub glyphs: Vec<(&'static str, &'static str)>,
    pub formats: Vec<&'static str>,
    pub disagreement_discount: f32,
    pub max_concurrency: usize,
}

/// Facade over transcription, emotion detection and batch processing.
pub struct InferenceService {
    orchestrator: Arc<TranscriptionOrchestrator>,
    text_classifier: TextEmotionClassifier,
    audio_classifier: AudioEmotionClassifier,
    fusion: FusionPolicy,
    aggregator: ChunkAggregator,
    engine_statuses: Vec<EngineStatus>,
}

impl InferenceService {
    pub fn new(
        orchestrator: TranscriptionOrchestrator,
        text_classifier: TextEmotionClassifier,
        audio_classifier: AudioEmotionClassifier,
        fusion: FusionPolicy,
    ) -> Self {
        let orchestrator = Arc::new(orchestrator);
        let engine_statuses = orchestrator
            .engine_names()
            .into_iter()
            .zip(orchestrator.engine_kinds())
            .map(|(name, kind)| EngineStatus {
                name: name.to_string(),
                kind: Some(kind),
                available: true,
                reason: None,
            })
            .collect();
        Self {
            aggregator: ChunkAggregator::new(Arc::clone(&orchestrator), DEFAULT_MAX_CONCURRENCY),
            orchestrator,
            text_classifier,
            audio_classifier,
            fusion,
            engine_statuses,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.aggregator = ChunkAggregator::new(Arc::clone(&self.orchestrator), max_concurrency);
        self
    }

    pub fn with_engine_statuses(mut self, statuses: Vec<EngineStatus>) -> Self {
        self.engine_statuses = statuses;
        self
    }

    /// Build engines, classifiers and policies from configuration. Engines
    /// that fail to initialize are reported by [`capabilities`](Self::capabilities).
    pub async fn from_config(config: &AppConfig) -> Self {
        let registry = EngineRegistry::new();
        let set = EngineSet::build(&config.transcription, &registry).await;
        if set.engines.is_empty() {
            tracing::warn!("no transcription engine available; transcription will fail");
        }

        let orchestrator = TranscriptionOrchestrator::new(set.engines)
            .with_attempt_timeout(Duration::from_secs(
                config.transcription.attempt_timeout_secs,
            ))
            .with_language(&config.transcription.language)
            .with_normalizer(AudioNormalizer::new(config.general.min_audio_bytes));

        let service = Self::new(
            orchestrator,
            TextEmotionClassifier::from_config(&config.emotion),
            AudioEmotionClassifier::from_config(&config.emotion),
            FusionPolicy::from_config(&config.fusion),
        )
        .with_max_concurrency(config.batch.max_concurrency)
        .with_engine_statuses(set.statuses);

        tracing::info!(
            engines = ?service.orchestrator.engine_names(),
            text_model = %service.text_classifier.model_name(),
            audio_model = %service.audio_classifier.model_name(),
            "inference service ready"
        );
        service
    }

    pub async fn transcribe(
        &self,
        bytes: &[u8],
        format: AudioFormat,
    ) -> Result<TranscriptionResult, TranscribeError> {
        self.orchestrator.transcribe(bytes, format).await
    }

    /// Transcribe and, when asked, classify the emotion of the transcript.
    pub async fn transcribe_with_emotion(
        &self,
        bytes: &[u8],
        format: AudioFormat,
        include_emotion: bool,
    ) -> Result<TranscriptReport, TranscribeError> {
        let transcription = self.transcribe(bytes, format).await?;
        let emotion = if include_emotion {
            Some(self.text_classifier.classify(&transcription.text).await)
        } else {
            None
        };
        Ok(TranscriptReport {
            transcription,
            emotion,
        })
    }

    pub async fn detect_emotion(
        &self,
        request: EmotionRequest,
    ) -> Result<EmotionResult, EmotionError> {
        self.detect_emotion_report(request)
            .await
            .map(|report| report.result)
    }

    pub async fn detect_emotion_report(
        &self,
        request: EmotionRequest,
    ) -> Result<EmotionReport, EmotionError> {
        let text = request
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let audio = request.audio;

        if text.is_none() && audio.is_none() {
            return Err(EmotionError::Validation(
                "either text or audio must be provided".to_string(),
            ));
        }
        match request.mode {
            DetectionMode::TextOnly if text.is_none() => {
                return Err(EmotionError::Validation(
                    "text is required for text_only mode".to_string(),
                ));
            }
            DetectionMode::AudioOnly if audio.is_none() => {
                return Err(EmotionError::Validation(
                    "audio is required for audio_only mode".to_string(),
                ));
            }
            _ => {}
        }

        let buffer = match (request.mode, audio) {
            (DetectionMode::TextOnly, _) | (_, None) => None,
            (_, Some(bytes)) => Some(self.decode(&bytes, request.format)?),
        };
        let text = match request.mode {
            DetectionMode::AudioOnly => None,
            _ => text,
        };

        let mut transcript = None;
        if request.mode == DetectionMode::Combined && text.is_none() {
            if let Some(buffer) = &buffer {
                match self.orchestrator.run(buffer).await {
                    Ok(result) => transcript = Some(result.text),
                    Err(e) => {
                        tracing::warn!("transcription for emotion failed, using audio only: {e}")
                    }
                }
            }
        }

        let text_input = text.as_deref().or(transcript.as_deref());
        let (text_emotion, audio_emotion) = tokio::join!(
            async {
                match text_input {
                    Some(t) => Some(self.text_classifier.classify(t).await),
                    None => None,
                }
            },
            async {
                match &buffer {
                    Some(b) => Some(self.audio_classifier.classify(b).await),
                    None => None,
                }
            }
        );

        let result = self
            .fusion
            .fuse(text_emotion.clone(), audio_emotion.clone())?;
        tracing::info!(
            mode = %request.mode,
            emotion = %result.emotion,
            confidence = result.confidence,
            source = ?result.source,
            "emotion detected"
        );

        Ok(EmotionReport {
            result,
            text_emotion,
            audio_emotion,
            transcript,
        })
    }

    pub async fn process_batch(&self, chunks: Vec<Vec<u8>>, format: AudioFormat) -> BatchReport {
        self.aggregator.process(chunks, format).await
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            engines: self.engine_statuses.clone(),
            text_model: self.text_classifier.model_name().to_string(),
            audio_model: self.audio_classifier.model_name().to_string(),
            emotions: Emotion::ALL.iter().map(|e| e.as_str()).collect(),
            glyphs: glyph_table(),
            formats: AudioFormat::ALL.iter().map(|f| f.extension()).collect(),
            disagreement_discount: self.fusion.disagreement_discount(),
            max_concurrency: self.aggregator.max_concurrency(),
        }
    }

    fn decode(&self, bytes: &[u8], format: AudioFormat) -> Result<AudioBuffer, EmotionError> {
        Ok(self.orchestrator.normalizer().normalize(bytes, format)?)
    }
}
