use crate::engine_trait::TranscriptionEngine;
use crate::registry::EngineRegistry;
use serde::Serialize;
use tonebridge_core::config::TranscriptionConfig;
use tonebridge_core::EngineKind;

/// Availability of one configured engine, as reported by `capabilities`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<EngineKind>,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Engines that initialized successfully, plus the status of every
/// engine named in the chain.
pub struct EngineSet {
    pub engines: Vec<Box<dyn TranscriptionEngine>>,
    pub statuses: Vec<EngineStatus>,
}

impl EngineSet {
    /// Create and initialize each engine in `config.chain`. Engines that
    /// cannot be created or initialized are left out, not fatal.
    pub async fn build(config: &TranscriptionConfig, registry: &EngineRegistry) -> Self {
        let mut engines = Vec::new();
        let mut statuses = Vec::new();

        for name in &config.chain {
            let mut engine = match registry.create(name) {
                Ok(engine) => engine,
                Err(e) => {
                    tracing::warn!(engine = %name, "skipping engine: {e}");
                    statuses.push(EngineStatus {
                        name: name.clone(),
                        kind: None,
                        available: false,
                        reason: Some(e.to_string()),
                    });
                    continue;
                }
            };

            match engine.initialize(config.engine_config(name)).await {
                Ok(()) => {
                    tracing::info!(engine = %name, kind = %engine.kind(), "engine ready");
                    statuses.push(EngineStatus {
                        name: name.clone(),
                        kind: Some(engine.kind()),
                        available: true,
                        reason: None,
                    });
                    engines.push(engine);
                }
                Err(e) => {
                    tracing::warn!(engine = %name, "engine unavailable: {e}");
                    statuses.push(EngineStatus {
                        name: name.clone(),
                        kind: Some(engine.kind()),
                        available: false,
                        reason: Some(e.to_string()),
                    });
                }
            }
        }

        Self { engines, statuses }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripted_table(kind: &str, text: &str) -> toml::Value {
        let mut table = toml::map::Map::new();
        table.insert("kind".to_string(), toml::Value::String(kind.to_string()));
        table.insert("text".to_string(), toml::Value::String(text.to_string()));
        toml::Value::Table(table)
    }

    #[tokio::test]
    async fn test_build_skips_unknown_and_unavailable() {
        let config = TranscriptionConfig {
            chain: vec!["bogus".to_string(), "cloud".to_string(), "scripted".to_string()],
            ..Default::default()
        };
        let set = EngineSet::build(&config, &EngineRegistry::new()).await;

        assert_eq!(set.engines.len(), 1);
        assert_eq!(set.engines[0].name(), "scripted");
        assert_eq!(set.statuses.len(), 3);
        assert!(!set.statuses[0].available);
        assert_eq!(set.statuses[0].kind, None);
        assert!(!set.statuses[1].available);
        assert_eq!(set.statuses[1].kind, Some(EngineKind::CloudApi));
        assert!(set.statuses[1].reason.as_deref().unwrap_or("").contains("api_key"));
        assert!(set.statuses[2].available);
    }

    #[tokio::test]
    async fn test_build_passes_engine_tables() {
        let mut config = TranscriptionConfig {
            chain: vec!["scripted".to_string()],
            ..Default::default()
        };
        config
            .engines
            .insert("scripted".to_string(), scripted_table("primary_model", "hi"));
        let set = EngineSet::build(&config, &EngineRegistry::new()).await;
        assert_eq!(set.engines[0].kind(), EngineKind::PrimaryModel);
    }

    #[test]
    fn test_status_serializes_without_empty_fields() {
        let status = EngineStatus {
            name: "offline".to_string(),
            kind: Some(EngineKind::OfflineFallback),
            available: true,
            reason: None,
        };
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(
            json,
            r#"{"name":"offline","kind":"offline_fallback","available":true}"#
        );
    }
}
