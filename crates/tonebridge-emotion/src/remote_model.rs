use crate::model::LabelScore;
use crate::text::TextEmotionModel;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tonebridge_core::config::RemoteModelConfig;
use tonebridge_core::ModelError;

/// Hosted text classifier speaking the Hugging Face inference API format.
pub struct RemoteTextModel {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Predictions {
    Batched(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

#[derive(Deserialize)]
struct ApiError {
    error: String,
}

/// Accepts `[[{label, score}]]` or `[{label, score}]`.
pub(crate) fn parse_predictions(body: &str) -> Result<Vec<LabelScore>, ModelError> {
    if let Ok(err) = serde_json::from_str::<ApiError>(body) {
        return Err(ModelError::Inference(err.error));
    }
    match serde_json::from_str::<Predictions>(body) {
        Ok(Predictions::Batched(batches)) => Ok(batches.into_iter().next().unwrap_or_default()),
        Ok(Predictions::Flat(scores)) => Ok(scores),
        Err(e) => Err(ModelError::Inference(format!("malformed response: {e}"))),
    }
}

impl RemoteTextModel {
    pub fn new(config: &RemoteModelConfig) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| ModelError::Unavailable(format!("http client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextEmotionModel for RemoteTextModel {
    fn name(&self) -> &str {
        "remote"
    }

    async fn predict(&self, text: &str) -> Result<Vec<LabelScore>, ModelError> {
        let mut request = self.client.post(&self.endpoint).json(&json!({ "inputs": text }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            chars = text.len(),
            "querying remote emotion model"
        );

        let response = request
            .send()
            .await
            .map_err(|e| ModelError::Unavailable(format!("request: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ModelError::Inference(format!("body: {e}")))?;

        if !status.is_success() {
            return Err(ModelError::Inference(format!("status {status}: {body}")));
        }
        parse_predictions(&body)
    }
}
