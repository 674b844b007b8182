use crate::engine_trait::{EngineOutput, TranscriptionEngine};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tonebridge_core::{AudioBuffer, EngineError, EngineKind};

/// What a [`ScriptedEngine`] answers on every attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedReply {
    Text {
        text: String,
        confidence: Option<f32>,
    },
    /// `"heard N samples"`, so different inputs give different text.
    Echo,
    Empty,
    NoMatch,
    Fail(String),
}

/// Deterministic in-process engine for tests and dry runs.
pub struct ScriptedEngine {
    name: String,
    kind: EngineKind,
    reply: ScriptedReply,
    delay: Option<Duration>,
    attempts: Arc<AtomicUsize>,
}

impl ScriptedEngine {
    pub fn new(kind: EngineKind) -> Self {
        Self {
            name: "scripted".to_string(),
            kind,
            reply: ScriptedReply::Echo,
            delay: None,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_reply(mut self, reply: ScriptedReply) -> Self {
        self.reply = reply;
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.with_reply(ScriptedReply::Text {
            text: text.to_string(),
            confidence: None,
        })
    }

    pub fn failing(self, reason: &str) -> Self {
        self.with_reply(ScriptedReply::Fail(reason.to_string()))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared attempt counter; clone it before boxing the engine.
    pub fn attempt_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.attempts)
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new(EngineKind::OfflineFallback)
    }
}

fn parse_kind(value: &str) -> Option<EngineKind> {
    EngineKind::PRIORITY
        .into_iter()
        .find(|k| k.as_str() == value)
}

#[async_trait]
impl TranscriptionEngine for ScriptedEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EngineKind {
        self.kind
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), EngineError> {
        if let Some(kind) = config.get("kind").and_then(|v| v.as_str()) {
            self.kind = parse_kind(kind).ok_or_else(|| {
                EngineError::InitializationFailed(format!("unknown engine kind '{kind}'"))
            })?;
        }
        if let Some(text) = config.get("text").and_then(|v| v.as_str()) {
            self.reply = ScriptedReply::Text {
                text: text.to_string(),
                confidence: config
                    .get("confidence")
                    .and_then(|v| v.as_float())
                    .map(|c| c as f32),
            };
        }
        Ok(())
    }

    async fn attempt(&self, audio: &AudioBuffer) -> Result<EngineOutput, EngineError> {
        let count = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(
            engine = %self.name,
            "ScriptedEngine attempt #{count}, {} samples",
            audio.len()
        );

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            ScriptedReply::Text { text, confidence } => Ok(EngineOutput {
                text: text.clone(),
                raw_confidence: *confidence,
            }),
            ScriptedReply::Echo => Ok(EngineOutput::text(format!("heard {} samples", audio.len()))),
            ScriptedReply::Empty => Ok(EngineOutput::text("")),
            ScriptedReply::NoMatch => Err(EngineError::NoMatch {
                engine: self.kind,
                name: self.name.clone(),
            }),
            ScriptedReply::Fail(reason) => Err(EngineError::Request {
                engine: self.kind,
                name: self.name.clone(),
                reason: reason.clone(),
            }),
        }
    }
}
