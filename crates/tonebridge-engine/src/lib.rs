pub mod cloud_engine;
pub mod confidence;
pub mod engine_set;
pub mod engine_trait;
pub mod offline_engine;
pub mod orchestrator;
pub mod registry;
pub mod scripted_engine;
pub mod whisper_engine;

pub use cloud_engine::CloudSpeechEngine;
pub use engine_set::{EngineSet, EngineStatus};
pub use engine_trait::{EngineOutput, TranscriptionEngine};
pub use offline_engine::OfflineCommandEngine;
pub use orchestrator::{ChainState, TranscriptionOrchestrator};
pub use registry::{EngineFactory, EngineRegistry};
pub use scripted_engine::{ScriptedEngine, ScriptedReply};
pub use whisper_engine::WhisperEngine;
