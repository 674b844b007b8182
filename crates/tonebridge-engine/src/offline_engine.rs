use crate::engine_trait::{EngineOutput, TranscriptionEngine};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tonebridge_core::{AudioBuffer, EngineError, EngineKind};

pub const DEFAULT_PROGRAM: &str = "pocketsphinx";
pub const DEFAULT_ARGS: [&str; 2] = ["single", "-"];

/// Local recognizer run as a child process: WAV in on stdin, text out on
/// stdout. Defaults to `pocketsphinx single -`.
pub struct OfflineCommandEngine {
    program: String,
    args: Vec<String>,
}

impl OfflineCommandEngine {
    pub fn new() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            args: DEFAULT_ARGS.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn unavailable(&self, reason: String) -> EngineError {
        EngineError::Unavailable {
            engine: EngineKind::OfflineFallback,
            name: self.name().to_string(),
            reason,
        }
    }

    fn request_error(&self, reason: String) -> EngineError {
        EngineError::Request {
            engine: EngineKind::OfflineFallback,
            name: self.name().to_string(),
            reason,
        }
    }
}

impl Default for OfflineCommandEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Accepts JSON lines carrying `t` (pocketsphinx) or `text`, or plain text.
pub(crate) fn parse_output(stdout: &str) -> String {
    let mut parts = Vec::new();
    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(value) if value.is_object() => {
                if let Some(text) = value
                    .get("t")
                    .or_else(|| value.get("text"))
                    .and_then(|v| v.as_str())
                {
                    parts.push(text.trim().to_string());
                }
            }
            _ => parts.push(line.to_string()),
        }
    }
    parts.retain(|p| !p.is_empty());
    parts.join(" ")
}

#[async_trait]
impl TranscriptionEngine for OfflineCommandEngine {
    fn name(&self) -> &str {
        "offline"
    }

    fn kind(&self) -> EngineKind {
        EngineKind::OfflineFallback
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), EngineError> {
        if let Some(program) = config.get("command").and_then(|v| v.as_str()) {
            if program.trim().is_empty() {
                return Err(EngineError::InitializationFailed(
                    "'command' in offline config is empty".to_string(),
                ));
            }
            self.program = program.to_string();
        }
        if let Some(args) = config.get("args").and_then(|v| v.as_array()) {
            self.args = args
                .iter()
                .filter_map(|a| a.as_str().map(str::to_string))
                .collect();
        }

        tracing::info!(
            program = %self.program,
            args = ?self.args,
            "OfflineCommandEngine initialized"
        );
        Ok(())
    }

    async fn attempt(&self, audio: &AudioBuffer) -> Result<EngineOutput, EngineError> {
        let wav = tonebridge_audio::encode_wav(audio)
            .map_err(|e| self.request_error(format!("wav encode: {e}")))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    self.unavailable(format!("'{}' not found on PATH", self.program))
                }
                _ => self.request_error(format!("spawn: {e}")),
            })?;

        let writer = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                let result = stdin.write_all(&wav).await;
                drop(stdin);
                result
            })
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| self.request_error(format!("wait: {e}")))?;

        if let Some(writer) = writer {
            match writer.await {
                Ok(Err(e)) => tracing::debug!(error = %e, "offline recognizer closed stdin early"),
                Err(e) => tracing::debug!(error = %e, "stdin writer task failed"),
                Ok(Ok(())) => {}
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.request_error(format!(
                "exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = parse_output(&String::from_utf8_lossy(&output.stdout));
        if text.is_empty() {
            return Err(EngineError::NoMatch {
                engine: EngineKind::OfflineFallback,
                name: self.name().to_string(),
            });
        }
        Ok(EngineOutput::text(text))
    }
}
