pub mod batch;
pub mod service;

pub use batch::{BatchReport, ChunkAggregator, DEFAULT_MAX_CONCURRENCY};
pub use service::{Capabilities, DetectionMode, EmotionRequest, InferenceService};
