use crate::engine_trait::{EngineOutput, TranscriptionEngine};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::json;
use tonebridge_core::{AudioBuffer, EngineError, EngineKind, TARGET_SAMPLE_RATE};

pub const DEFAULT_ENDPOINT: &str = "https://speech.googleapis.com/v1/speech:recognize";
pub const DEFAULT_LANGUAGE_CODE: &str = "en-US";

/// Hosted speech recognition over the Google Speech v1 REST API.
pub struct CloudSpeechEngine {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    language_code: String,
}

impl CloudSpeechEngine {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
        }
    }

    fn request_error(&self, reason: String) -> EngineError {
        EngineError::Request {
            engine: EngineKind::CloudApi,
            name: self.name().to_string(),
            reason,
        }
    }
}

impl Default for CloudSpeechEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize, Default)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
    confidence: Option<f32>,
}

/// Join the top alternative of every result. The first reported confidence
/// wins; `None` when nothing was recognized.
pub(crate) fn parse_response(body: &str) -> Result<Option<EngineOutput>, serde_json::Error> {
    let response: RecognizeResponse = serde_json::from_str(body)?;

    let mut confidence = None;
    let mut parts = Vec::new();
    for alternative in response.results.iter().filter_map(|r| r.alternatives.first()) {
        let transcript = alternative.transcript.trim();
        if transcript.is_empty() {
            continue;
        }
        if confidence.is_none() {
            confidence = alternative.confidence;
        }
        parts.push(transcript);
    }

    if parts.is_empty() {
        return Ok(None);
    }
    Ok(Some(EngineOutput {
        text: parts.join(" "),
        raw_confidence: confidence,
    }))
}

#[async_trait]
impl TranscriptionEngine for CloudSpeechEngine {
    fn name(&self) -> &str {
        "cloud"
    }

    fn kind(&self) -> EngineKind {
        EngineKind::CloudApi
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), EngineError> {
        let api_key = config
            .get("api_key")
            .and_then(|v| v.as_str())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| EngineError::Unavailable {
                engine: EngineKind::CloudApi,
                name: self.name().to_string(),
                reason: "missing 'api_key' in cloud config".to_string(),
            })?;
        self.api_key = Some(api_key.to_string());

        if let Some(endpoint) = config.get("endpoint").and_then(|v| v.as_str()) {
            self.endpoint = endpoint.to_string();
        }
        if let Some(language) = config.get("language_code").and_then(|v| v.as_str()) {
            self.language_code = language.to_string();
        }
        if let Some(secs) = config.get("timeout_secs").and_then(|v| v.as_integer()) {
            self.client = reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(secs.max(1) as u64))
                .build()
                .map_err(|e| EngineError::InitializationFailed(format!("http client: {e}")))?;
        }

        tracing::info!(
            endpoint = %self.endpoint,
            language = %self.language_code,
            "CloudSpeechEngine initialized"
        );
        Ok(())
    }

    async fn attempt(&self, audio: &AudioBuffer) -> Result<EngineOutput, EngineError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| EngineError::Unavailable {
            engine: EngineKind::CloudApi,
            name: self.name().to_string(),
            reason: "engine not initialized".to_string(),
        })?;

        let body = json!({
            "config": {
                "encoding": "LINEAR16",
                "sampleRateHertz": TARGET_SAMPLE_RATE,
                "languageCode": self.language_code,
            },
            "audio": {
                "content": STANDARD.encode(tonebridge_audio::to_pcm16_bytes(audio)),
            },
        });

        tracing::debug!(samples = audio.len(), "sending audio to cloud speech API");

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_error(format!("request: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.request_error(format!("body: {e}")))?;

        if !status.is_success() {
            return Err(self.request_error(format!("status {status}: {text}")));
        }

        match parse_response(&text) {
            Ok(Some(output)) => Ok(output),
            Ok(None) => Err(EngineError::NoMatch {
                engine: EngineKind::CloudApi,
                name: self.name().to_string(),
            }),
            Err(e) => Err(self.request_error(format!("malformed response: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloud_engine_identity() {
        let engine = CloudSpeechEngine::new();
        assert_eq!(engine.name(), "cloud");
        assert_eq!(engine.kind(), EngineKind::CloudApi);
    }

    #[tokio::test]
    async fn test_cloud_engine_requires_api_key() {
        let mut engine = CloudSpeechEngine::new();
        let result = engine
            .initialize(toml::Value::Table(Default::default()))
            .await;
        match result {
            Err(EngineError::Unavailable { reason, .. }) => assert!(reason.contains("api_key")),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cloud_engine_initialize_with_key() {
        let mut engine = CloudSpeechEngine::new();
        let mut table = toml::map::Map::new();
        table.insert("api_key".to_string(), toml::Value::String("k".to_string()));
        table.insert(
            "language_code".to_string(),
            toml::Value::String("en-GB".to_string()),
        );
        engine.initialize(toml::Value::Table(table)).await.unwrap();
        assert_eq!(engine.language_code, "en-GB");
    }

    #[tokio::test]
    async fn test_cloud_engine_attempt_without_init_is_unavailable() {
        let engine = CloudSpeechEngine::new();
        let result = engine.attempt(&AudioBuffer::new(vec![0.0; 160])).await;
        assert!(matches!(result, Err(EngineError::Unavailable { .. })));
    }

    #[test]
    fn test_parse_response_joins_results() {
        let body = r#"{"results":[
            {"alternatives":[{"transcript":"hello","confidence":0.91},{"transcript":"yellow"}]},
            {"alternatives":[{"transcript":" world ","confidence":0.5}]}
        ]}"#;
        let output = parse_response(body).unwrap().unwrap();
        assert_eq!(output.text, "hello world");
        assert_eq!(output.raw_confidence, Some(0.91));
    }

    #[test]
    fn test_parse_response_without_results_is_no_match() {
        assert_eq!(parse_response("{}").unwrap(), None);
        assert_eq!(
            parse_response(r#"{"results":[{"alternatives":[{"transcript":"  "}]}]}"#).unwrap(),
            None
        );
    }

    #[test]
    fn test_parse_response_rejects_garbage() {
        assert!(parse_response("not json").is_err());
    }
}
