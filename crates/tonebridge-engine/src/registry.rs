use crate::engine_trait::TranscriptionEngine;
use std::collections::HashMap;
use tonebridge_core::EngineError;

pub type EngineFactory = fn() -> Box<dyn TranscriptionEngine>;

/// Name-to-factory table for transcription engines.
pub struct EngineRegistry {
    factories: HashMap<String, EngineFactory>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("whisper", || {
            Box::new(crate::whisper_engine::WhisperEngine::new())
        });
        registry.register("cloud", || {
            Box::new(crate::cloud_engine::CloudSpeechEngine::new())
        });
        registry.register("offline", || {
            Box::new(crate::offline_engine::OfflineCommandEngine::new())
        });
        registry.register("scripted", || {
            Box::new(crate::scripted_engine::ScriptedEngine::default())
        });
        registry
    }

    pub fn register(&mut self, name: &str, factory: EngineFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn TranscriptionEngine>, EngineError> {
        self.factories
            .get(name)
            .map(|f| f())
            .ok_or_else(|| EngineError::NotFound(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn list_engines(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}
