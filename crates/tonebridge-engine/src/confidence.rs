//! Confidence scoring per engine kind.
//!
//! The primary model gives no native confidence, so its score is a bounded
//! heuristic over word count and character density. It is a rough
//! approximation with no grounding in model uncertainty; the constants are
//! kept fixed so scores stay comparable across runs.

use tonebridge_core::EngineKind;

pub const PRIMARY_BASE: f32 = 0.3;
pub const PRIMARY_PER_WORD: f32 = 0.1;
pub const PRIMARY_DENSITY_WEIGHT: f32 = 100.0;
pub const PRIMARY_CEILING: f32 = 0.95;
/// Primary score when the buffer length is unknown (zero samples).
pub const PRIMARY_EMPTY_BUFFER: f32 = 0.5;
/// The offline recognizer reports no scores at all.
pub const OFFLINE_CONFIDENCE: f32 = 0.5;

pub fn primary_heuristic(text: &str, sample_count: usize) -> f32 {
    if text.is_empty() {
        return 0.0;
    }
    if sample_count == 0 {
        return PRIMARY_EMPTY_BUFFER;
    }

    let words = text.split_whitespace().count() as f32;
    let chars = text.chars().count() as f32;
    let density = chars / sample_count as f32 * PRIMARY_DENSITY_WEIGHT;

    (PRIMARY_BASE + words * PRIMARY_PER_WORD + density).clamp(0.0, PRIMARY_CEILING)
}

pub fn score(
    kind: EngineKind,
    text: &str,
    raw_confidence: Option<f32>,
    sample_count: usize,
) -> f32 {
    let confidence = match kind {
        EngineKind::PrimaryModel => primary_heuristic(text, sample_count),
        EngineKind::CloudApi => raw_confidence.unwrap_or(0.0),
        EngineKind::OfflineFallback => OFFLINE_CONFIDENCE,
    };
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_hello_world_clamps_to_ceiling() {
        // 0.3 + 2 * 0.1 + 11 / 1000 * 100 = 1.6
        assert_eq!(primary_heuristic("hello world", 1000), 0.95);
    }

    #[test]
    fn test_primary_long_buffer_uses_formula() {
        // 0.3 + 1 * 0.1 + 5 / 100_000 * 100 = 0.405
        let c = primary_heuristic("hello", 100_000);
        assert!((c - 0.405).abs() < 1e-6, "{c}");
    }

    #[test]
    fn test_primary_empty_text_is_zero() {
        assert_eq!(primary_heuristic("", 1000), 0.0);
    }

    #[test]
    fn test_primary_zero_length_buffer() {
        assert_eq!(primary_heuristic("hi", 0), PRIMARY_EMPTY_BUFFER);
    }

    #[test]
    fn test_cloud_uses_vendor_confidence() {
        assert_eq!(score(EngineKind::CloudApi, "x", Some(0.87), 100), 0.87);
        assert_eq!(score(EngineKind::CloudApi, "x", None, 100), 0.0);
        assert_eq!(score(EngineKind::CloudApi, "x", Some(1.3), 100), 1.0);
    }

    #[test]
    fn test_offline_is_constant() {
        assert_eq!(score(EngineKind::OfflineFallback, "anything", Some(0.99), 10), 0.5);
    }

    #[test]
    fn test_primary_ignores_raw_confidence() {
        let c = score(EngineKind::PrimaryModel, "hello world", Some(0.1), 1000);
        assert_eq!(c, 0.95);
    }
}
