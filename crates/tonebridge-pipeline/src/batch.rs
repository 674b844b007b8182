use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tonebridge_core::{AudioFormat, BatchStats, ChunkResult};
use tonebridge_engine::TranscriptionOrchestrator;

pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Per-chunk results in input order plus their aggregate statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub results: Vec<ChunkResult>,
    pub stats: BatchStats,
}

/// Transcribes independent audio segments and aggregates the outcome.
pub struct ChunkAggregator {
    orchestrator: Arc<TranscriptionOrchestrator>,
    max_concurrency: usize,
}

impl ChunkAggregator {
    pub fn new(orchestrator: Arc<TranscriptionOrchestrator>, max_concurrency: usize) -> Self {
        Self {
            orchestrator,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// One result per chunk, same order as the input. Failed chunks become
    /// placeholders and never abort the batch.
    pub async fn process_chunks(
        &self,
        chunks: Vec<Vec<u8>>,
        format: AudioFormat,
    ) -> Vec<ChunkResult> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let total = chunks.len();

        let handles: Vec<_> = chunks
            .into_iter()
            .enumerate()
            .map(|(index, bytes)| {
                let orchestrator = Arc::clone(&self.orchestrator);
                let semaphore = Arc::clone(&semaphore);
                tokio::spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => return ChunkResult::failure(index, e.to_string()),
                    };
                    match orchestrator.transcribe(&bytes, format).await {
                        Ok(transcription) => ChunkResult::success(index, transcription),
                        Err(e) => {
                            tracing::warn!(chunk = index, "chunk transcription failed: {e}");
                            ChunkResult::failure(index, e.to_string())
                        }
                    }
                })
            })
            .collect();

        let mut results = Vec::with_capacity(total);
        for (index, handle) in handles.into_iter().enumerate() {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(chunk = index, "chunk task failed: {e}");
                    ChunkResult::failure(index, format!("chunk task failed: {e}"))
                }
            };
            results.push(result);
        }

        let successful = results.iter().filter(|r| r.is_success()).count();
        tracing::info!(total, successful, "batch processed");
        results
    }

    pub fn compute_stats(results: &[ChunkResult]) -> BatchStats {
        BatchStats::from_results(results)
    }

    pub async fn process(&self, chunks: Vec<Vec<u8>>, format: AudioFormat) -> BatchReport {
        let results = self.process_chunks(chunks, format).await;
        let stats = Self::compute_stats(&results);
        BatchReport { results, stats }
    }
}
