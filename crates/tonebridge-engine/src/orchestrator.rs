use crate::confidence;
use crate::engine_trait::TranscriptionEngine;
use std::time::{Duration, Instant};
use tonebridge_audio::AudioNormalizer;
use tonebridge_core::{
    AudioBuffer, AudioError, AudioFormat, EngineError, EngineKind, TranscribeError,
    TranscriptionResult,
};

pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_LANGUAGE: &str = "en";

/// Where the fallback chain stands.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainState {
    Attempting(usize),
    Succeeded(TranscriptionResult),
    Exhausted,
}

impl ChainState {
    /// Transition after the engine at `index` produced `outcome`.
    pub fn advance(
        index: usize,
        engine_count: usize,
        outcome: Result<TranscriptionResult, &EngineError>,
    ) -> ChainState {
        match outcome {
            Ok(result) => ChainState::Succeeded(result),
            Err(_) if index + 1 < engine_count => ChainState::Attempting(index + 1),
            Err(_) => ChainState::Exhausted,
        }
    }
}

/// Tries engines in priority order and stops at the first non-empty text.
pub struct TranscriptionOrchestrator {
    engines: Vec<Box<dyn TranscriptionEngine>>,
    attempt_timeout: Duration,
    language: String,
    normalizer: AudioNormalizer,
}

impl TranscriptionOrchestrator {
    /// Engines are ordered by [`EngineKind`] priority; equal kinds keep
    /// their given order.
    pub fn new(mut engines: Vec<Box<dyn TranscriptionEngine>>) -> Self {
        engines.sort_by_key(|e| e.kind());
        Self {
            engines,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            language: DEFAULT_LANGUAGE.to_string(),
            normalizer: AudioNormalizer::default(),
        }
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn with_normalizer(mut self, normalizer: AudioNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn normalizer(&self) -> &AudioNormalizer {
        &self.normalizer
    }

    pub fn engine_kinds(&self) -> Vec<EngineKind> {
        self.engines.iter().map(|e| e.kind()).collect()
    }

    pub fn engine_names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Decode `bytes`, then run the fallback chain.
    pub async fn transcribe(
        &self,
        bytes: &[u8],
        format: AudioFormat,
    ) -> Result<TranscriptionResult, TranscribeError> {
        let audio = self.normalizer.normalize(bytes, format)?;
        self.run(&audio).await
    }

    /// Run the fallback chain over an already normalized buffer.
    ///
    /// An empty buffer is rejected before any engine sees it.
    pub async fn run(&self, audio: &AudioBuffer) -> Result<TranscriptionResult, TranscribeError> {
        if audio.is_empty() {
            return Err(AudioError::Empty {
                format: AudioFormat::Pcm16,
            }
            .into());
        }

        let mut attempted = Vec::new();
        let mut last_error = None;
        let mut state = if self.engines.is_empty() {
            ChainState::Exhausted
        } else {
            ChainState::Attempting(0)
        };

        loop {
            state = match state {
                ChainState::Attempting(index) => {
                    let engine = self.engines[index].as_ref();
                    attempted.push(engine.kind());
                    let outcome = self.attempt(engine, audio).await;
                    let next = ChainState::advance(
                        index,
                        self.engines.len(),
                        outcome.as_ref().map(Clone::clone),
                    );
                    if let Err(err) = outcome {
                        tracing::warn!(
                            engine = %engine.name(),
                            kind = %engine.kind(),
                            "transcription attempt failed: {err}"
                        );
                        last_error = Some(err);
                    }
                    next
                }
                ChainState::Succeeded(result) => return Ok(result),
                ChainState::Exhausted => {
                    tracing::error!(
                        attempted = attempted.len(),
                        "all transcription engines failed"
                    );
                    return Err(TranscribeError::AllEnginesFailed {
                        attempted,
                        last: last_error,
                    });
                }
            };
        }
    }

    async fn attempt(
        &self,
        engine: &dyn TranscriptionEngine,
        audio: &AudioBuffer,
    ) -> Result<TranscriptionResult, EngineError> {
        let started = Instant::now();
        let output = tokio::time::timeout(self.attempt_timeout, engine.attempt(audio))
            .await
            .map_err(|_| EngineError::Timeout {
                engine: engine.kind(),
                name: engine.name().to_string(),
                after: self.attempt_timeout,
            })??;

        let text = output.text.trim().to_string();
        if text.is_empty() {
            return Err(EngineError::EmptyText {
                engine: engine.kind(),
                name: engine.name().to_string(),
            });
        }

        let confidence =
            confidence::score(engine.kind(), &text, output.raw_confidence, audio.len());

        tracing::info!(
            engine = %engine.name(),
            kind = %engine.kind(),
            chars = text.chars().count(),
            confidence,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "transcription completed"
        );

        Ok(TranscriptionResult {
            text,
            confidence,
            engine: engine.kind(),
            engine_name: engine.name().to_string(),
            language: self.language.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted_engine::{ScriptedEngine, ScriptedReply};
    use std::sync::atomic::Ordering;

    fn audio(n: usize) -> AudioBuffer {
        AudioBuffer::new(vec![0.1; n])
    }

    fn boxed(engine: ScriptedEngine) -> Box<dyn TranscriptionEngine> {
        Box::new(engine)
    }

    #[test]
    fn test_advance_on_success() {
        let result = TranscriptionResult {
            text: "hi".to_string(),
            confidence: 0.5,
            engine: EngineKind::CloudApi,
            engine_name: "cloud".to_string(),
            language: "en".to_string(),
        };
        assert_eq!(
            ChainState::advance(1, 3, Ok(result.clone())),
            ChainState::Succeeded(result)
        );
    }

    #[test]
    fn test_advance_on_failure_moves_to_next() {
        let err = EngineError::NotFound("x".to_string());
        assert_eq!(ChainState::advance(0, 3, Err(&err)), ChainState::Attempting(1));
        assert_eq!(ChainState::advance(2, 3, Err(&err)), ChainState::Exhausted);
    }

    #[test]
    fn test_engines_sorted_by_priority() {
        let orchestrator = TranscriptionOrchestrator::new(vec![
            boxed(ScriptedEngine::new(EngineKind::OfflineFallback)),
            boxed(ScriptedEngine::new(EngineKind::PrimaryModel)),
            boxed(ScriptedEngine::new(EngineKind::CloudApi)),
        ]);
        assert_eq!(orchestrator.engine_kinds(), EngineKind::PRIORITY.to_vec());
    }

    #[tokio::test]
    async fn test_primary_success_uses_heuristic() {
        let orchestrator = TranscriptionOrchestrator::new(vec![boxed(
            ScriptedEngine::new(EngineKind::PrimaryModel).with_text("hello world"),
        )]);
        let result = orchestrator.run(&audio(1000)).await.unwrap();
        assert_eq!(result.text, "hello world");
        assert_eq!(result.engine, EngineKind::PrimaryModel);
        assert_eq!(result.confidence, 0.95);
        assert_eq!(result.language, "en");
    }

    #[tokio::test]
    async fn test_falls_back_on_failure_and_empty_text() {
        let primary = ScriptedEngine::new(EngineKind::PrimaryModel).failing("model crashed");
        let cloud = ScriptedEngine::new(EngineKind::CloudApi).with_reply(ScriptedReply::Empty);
        let offline = ScriptedEngine::new(EngineKind::OfflineFallback).with_text("fallback text");
        let counters = [
            primary.attempt_counter(),
            cloud.attempt_counter(),
            offline.attempt_counter(),
        ];

        let orchestrator =
            TranscriptionOrchestrator::new(vec![boxed(primary), boxed(cloud), boxed(offline)]);
        let result = orchestrator.run(&audio(16_000)).await.unwrap();

        assert_eq!(result.engine, EngineKind::OfflineFallback);
        assert_eq!(result.text, "fallback text");
        assert_eq!(result.confidence, 0.5);
        for counter in &counters {
            assert_eq!(counter.load(Ordering::Relaxed), 1);
        }
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let cloud = ScriptedEngine::new(EngineKind::CloudApi).with_reply(ScriptedReply::Text {
            text: "from the cloud".to_string(),
            confidence: Some(0.82),
        });
        let offline = ScriptedEngine::new(EngineKind::OfflineFallback);
        let offline_attempts = offline.attempt_counter();

        let orchestrator = TranscriptionOrchestrator::new(vec![boxed(offline), boxed(cloud)]);
        let result = orchestrator.run(&audio(100)).await.unwrap();

        assert_eq!(result.engine, EngineKind::CloudApi);
        assert_eq!(result.confidence, 0.82);
        assert_eq!(offline_attempts.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_all_engines_failed_reports_last_error() {
        let orchestrator = TranscriptionOrchestrator::new(vec![
            boxed(ScriptedEngine::new(EngineKind::PrimaryModel).failing("first")),
            boxed(
                ScriptedEngine::new(EngineKind::OfflineFallback)
                    .named("sphinx")
                    .with_reply(ScriptedReply::NoMatch),
            ),
        ]);
        match orchestrator.run(&audio(100)).await {
            Err(TranscribeError::AllEnginesFailed { attempted, last }) => {
                assert_eq!(
                    attempted,
                    vec![EngineKind::PrimaryModel, EngineKind::OfflineFallback]
                );
                match last {
                    Some(EngineError::NoMatch { name, .. }) => assert_eq!(name, "sphinx"),
                    other => panic!("unexpected last error {other:?}"),
                }
            }
            other => panic!("expected AllEnginesFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_engines_fails_cleanly() {
        let orchestrator = TranscriptionOrchestrator::new(Vec::new());
        assert!(orchestrator.is_empty());
        match orchestrator.run(&audio(100)).await {
            Err(TranscribeError::AllEnginesFailed { attempted, last }) => {
                assert!(attempted.is_empty());
                assert!(last.is_none());
            }
            other => panic!("expected AllEnginesFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_buffer_never_reaches_engines() {
        let engine = ScriptedEngine::new(EngineKind::PrimaryModel).with_text("ghost");
        let attempts = engine.attempt_counter();
        let orchestrator = TranscriptionOrchestrator::new(vec![boxed(engine)]);

        match orchestrator.run(&AudioBuffer::new(Vec::new())).await {
            Err(TranscribeError::Audio(AudioError::Empty { .. })) => {}
            other => panic!("expected Empty audio error, got {other:?}"),
        }
        assert_eq!(attempts.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_slow_engine_times_out_and_chain_advances() {
        let orchestrator = TranscriptionOrchestrator::new(vec![
            boxed(
                ScriptedEngine::new(EngineKind::PrimaryModel)
                    .with_text("too late")
                    .with_delay(Duration::from_secs(5)),
            ),
            boxed(ScriptedEngine::new(EngineKind::CloudApi).with_text("on time")),
        ])
        .with_attempt_timeout(Duration::from_millis(50));

        let started = Instant::now();
        let result = orchestrator.run(&audio(100)).await.unwrap();
        assert_eq!(result.text, "on time");
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_text_is_trimmed() {
        let orchestrator = TranscriptionOrchestrator::new(vec![boxed(
            ScriptedEngine::new(EngineKind::OfflineFallback).with_text("  padded  "),
        )]);
        let result = orchestrator.run(&audio(100)).await.unwrap();
        assert_eq!(result.text, "padded");
    }

    #[tokio::test]
    async fn test_transcribe_decode_failure_surfaces() {
        let orchestrator = TranscriptionOrchestrator::new(vec![boxed(ScriptedEngine::default())]);
        match orchestrator.transcribe(&[], AudioFormat::Wav).await {
            Err(TranscribeError::Audio(tonebridge_core::AudioError::Empty { .. })) => {}
            other => panic!("expected Empty audio error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transcribe_is_idempotent() {
        let orchestrator = TranscriptionOrchestrator::new(vec![boxed(ScriptedEngine::new(
            EngineKind::PrimaryModel,
        ))]);
        let bytes: Vec<u8> = (0..4000u32)
            .flat_map(|i| ((i % 200) as i16).to_le_bytes())
            .collect();
        let first = orchestrator.transcribe(&bytes, AudioFormat::Pcm16).await.unwrap();
        let second = orchestrator.transcribe(&bytes, AudioFormat::Pcm16).await.unwrap();
        assert_eq!(first, second);
    }
}
