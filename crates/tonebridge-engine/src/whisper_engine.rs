use crate::engine_trait::{EngineOutput, TranscriptionEngine};
use async_trait::async_trait;
use tonebridge_core::{AudioBuffer, EngineError, EngineKind};

pub const DEFAULT_LANGUAGE: &str = "en";

#[cfg(feature = "whisper")]
use std::sync::{Arc, Mutex};
#[cfg(feature = "whisper")]
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Local Whisper model, the primary engine of the chain.
///
/// Without the `whisper` feature the engine still parses its config but
/// reports itself unavailable, so the chain falls through to the next engine.
pub struct WhisperEngine {
    model_path: Option<String>,
    language: Option<String>,
    #[cfg_attr(not(feature = "whisper"), allow(dead_code))]
    threads: Option<i32>,
    #[cfg(feature = "whisper")]
    context: Option<Arc<Mutex<WhisperContext>>>,
}

impl WhisperEngine {
    pub fn new() -> Self {
        Self {
            model_path: None,
            language: None,
            threads: None,
            #[cfg(feature = "whisper")]
            context: None,
        }
    }

    pub fn model_path(&self) -> Option<&str> {
        self.model_path.as_deref()
    }

    fn unavailable(&self, reason: impl Into<String>) -> EngineError {
        EngineError::Unavailable {
            engine: EngineKind::PrimaryModel,
            name: self.name().to_string(),
            reason: reason.into(),
        }
    }

    #[cfg(feature = "whisper")]
    fn load_model(&mut self, model_path: &str) -> Result<(), EngineError> {
        if !std::path::Path::new(model_path).exists() {
            return Err(self.unavailable(format!("model file '{model_path}' does not exist")));
        }
        let context =
            WhisperContext::new_with_params(model_path, WhisperContextParameters::default())
                .map_err(|e| self.unavailable(format!("failed to load model: {e}")))?;
        self.context = Some(Arc::new(Mutex::new(context)));
        Ok(())
    }

    #[cfg(not(feature = "whisper"))]
    fn load_model(&mut self, _model_path: &str) -> Result<(), EngineError> {
        Err(self.unavailable("built without the `whisper` feature"))
    }
}

impl Default for WhisperEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "whisper")]
fn run_inference(
    context: &Mutex<WhisperContext>,
    samples: &[f32],
    language: Option<&str>,
    threads: Option<i32>,
) -> Result<String, String> {
    let context = context
        .lock()
        .map_err(|e| format!("context lock poisoned: {e}"))?;
    let mut state = context
        .create_state()
        .map_err(|e| format!("create state: {e}"))?;

    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_language(language);
    if let Some(threads) = threads {
        params.set_n_threads(threads);
    }
    params.set_print_special(false);
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    state
        .full(params, samples)
        .map_err(|e| format!("inference: {e}"))?;

    let mut text = String::new();
    for segment in state.as_iter() {
        text.push_str(&segment.to_string());
    }
    Ok(text.trim().to_string())
}

#[async_trait]
impl TranscriptionEngine for WhisperEngine {
    fn name(&self) -> &str {
        "whisper"
    }

    fn kind(&self) -> EngineKind {
        EngineKind::PrimaryModel
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), EngineError> {
        let model_path = config
            .get("model_path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                EngineError::InitializationFailed(
                    "missing 'model_path' in whisper config".to_string(),
                )
            })?
            .to_string();

        self.language = config
            .get("language")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .or_else(|| Some(DEFAULT_LANGUAGE.to_string()));
        self.threads = config
            .get("threads")
            .and_then(|v| v.as_integer())
            .map(|t| t.clamp(1, 64) as i32);

        self.load_model(&model_path)?;

        tracing::info!(
            model_path = %model_path,
            language = ?self.language,
            "WhisperEngine initialized"
        );
        self.model_path = Some(model_path);
        Ok(())
    }

    #[cfg(feature = "whisper")]
    async fn attempt(&self, audio: &AudioBuffer) -> Result<EngineOutput, EngineError> {
        let context = self
            .context
            .clone()
            .ok_or_else(|| self.unavailable("engine not initialized"))?;
        let samples = audio.samples().to_vec();
        let language = self.language.clone();
        let threads = self.threads;

        let text = tokio::task::spawn_blocking(move || {
            run_inference(&context, &samples, language.as_deref(), threads)
        })
        .await
        .map_err(|e| format!("inference task: {e}"))
        .and_then(|r| r)
        .map_err(|reason| EngineError::Request {
            engine: EngineKind::PrimaryModel,
            name: self.name().to_string(),
            reason,
        })?;

        Ok(EngineOutput::text(text))
    }

    #[cfg(not(feature = "whisper"))]
    async fn attempt(&self, _audio: &AudioBuffer) -> Result<EngineOutput, EngineError> {
        Err(self.unavailable("built without the `whisper` feature"))
    }
}
