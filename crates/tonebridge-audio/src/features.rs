//! Frame-level acoustic descriptors used by the acoustic emotion model.

use tonebridge_core::AudioBuffer;

/// 40 ms analysis frames at 16 kHz.
pub const FRAME_LEN: usize = 640;

/// Frames quieter than this RMS count as silence.
pub const SILENCE_RMS: f32 = 0.01;

const MIN_PITCH_HZ: f32 = 60.0;
const MAX_PITCH_HZ: f32 = 400.0;
const MAX_PITCH_FRAMES: usize = 200;
const VOICING_THRESHOLD: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AcousticFeatures {
    pub rms: f32,
    pub peak: f32,
    /// Zero crossings per sample.
    pub zero_crossing_rate: f32,
    /// Standard deviation of per-frame RMS over mean RMS.
    pub energy_variation: f32,
    /// Share of frames below [`SILENCE_RMS`].
    pub silence_ratio: f32,
    /// Mean fundamental frequency over voiced frames, 0 when none are voiced.
    pub pitch_mean_hz: f32,
    /// Standard deviation of the pitch track in Hz.
    pub pitch_spread_hz: f32,
    pub voiced_frames: usize,
}

pub fn extract(audio: &AudioBuffer) -> AcousticFeatures {
    let samples = audio.samples();
    if samples.is_empty() {
        return AcousticFeatures {
            silence_ratio: 1.0,
            ..Default::default()
        };
    }

    let overall_rms = rms(samples);
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    let zero_crossing_rate = zero_crossings(samples) as f32 / samples.len() as f32;

    let frames: Vec<&[f32]> = samples.chunks(FRAME_LEN).collect();
    let frame_rms: Vec<f32> = frames.iter().map(|f| rms(f)).collect();
    let silent = frame_rms.iter().filter(|&&r| r < SILENCE_RMS).count();
    let silence_ratio = silent as f32 / frame_rms.len() as f32;

    let (energy_mean, energy_std) = mean_std(&frame_rms);
    let energy_variation = if energy_mean > f32::EPSILON {
        energy_std / energy_mean
    } else {
        0.0
    };

    let voiced: Vec<&[f32]> = frames
        .iter()
        .zip(&frame_rms)
        .filter(|(f, r)| f.len() == FRAME_LEN && **r >= SILENCE_RMS)
        .map(|(f, _)| *f)
        .collect();
    let step = (voiced.len() / MAX_PITCH_FRAMES).max(1);
    let pitches: Vec<f32> = voiced
        .iter()
        .step_by(step)
        .filter_map(|f| estimate_pitch(f, audio.sample_rate()))
        .collect();
    let (pitch_mean_hz, pitch_spread_hz) = mean_std(&pitches);

    AcousticFeatures {
        rms: overall_rms,
        peak,
        zero_crossing_rate,
        energy_variation,
        silence_ratio,
        pitch_mean_hz,
        pitch_spread_hz,
        voiced_frames: pitches.len(),
    }
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

fn zero_crossings(samples: &[f32]) -> usize {
    samples
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count()
}

fn mean_std(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
    (mean, var.sqrt())
}

/// Normalized autocorrelation pitch estimate for one frame.
pub fn estimate_pitch(frame: &[f32], sample_rate: u32) -> Option<f32> {
    let min_lag = (sample_rate as f32 / MAX_PITCH_HZ) as usize;
    let max_lag = ((sample_rate as f32 / MIN_PITCH_HZ) as usize).min(frame.len().saturating_sub(1));
    if min_lag == 0 || min_lag >= max_lag {
        return None;
    }

    let energy: f32 = frame.iter().map(|s| s * s).sum();
    if energy <= f32::EPSILON {
        return None;
    }

    let mut best_lag = 0;
    let mut best_corr = 0.0f32;
    for lag in min_lag..=max_lag {
        let corr: f32 = frame[..frame.len() - lag]
            .iter()
            .zip(&frame[lag..])
            .map(|(a, b)| a * b)
            .sum();
        let normalized = corr / energy;
        if normalized > best_corr {
            best_corr = normalized;
            best_lag = lag;
        }
    }

    (best_lag > 0 && best_corr >= VOICING_THRESHOLD).then(|| sample_rate as f32 / best_lag as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, amplitude: f32, seconds: f32) -> AudioBuffer {
        let n = (16_000.0 * seconds) as usize;
        let step = 2.0 * std::f32::consts::PI * freq / 16_000.0;
        AudioBuffer::new((0..n).map(|i| amplitude * (step * i as f32).sin()).collect())
    }

    #[test]
    fn test_silence_features() {
        let features = extract(&AudioBuffer::new(vec![0.0; 16_000]));
        assert_eq!(features.rms, 0.0);
        assert_eq!(features.silence_ratio, 1.0);
        assert_eq!(features.voiced_frames, 0);
        assert_eq!(features.pitch_mean_hz, 0.0);
    }

    #[test]
    fn test_sine_rms_and_peak() {
        let features = extract(&sine(200.0, 0.5, 1.0));
        assert!((features.rms - 0.5 / 2f32.sqrt()).abs() < 0.01, "{}", features.rms);
        assert!((features.peak - 0.5).abs() < 0.01);
        assert_eq!(features.silence_ratio, 0.0);
    }

    #[test]
    fn test_pitch_of_sine_is_close() {
        let features = extract(&sine(200.0, 0.5, 1.0));
        assert!(features.voiced_frames > 0);
        assert!(
            (features.pitch_mean_hz - 200.0).abs() < 10.0,
            "pitch {}",
            features.pitch_mean_hz
        );
        assert!(features.pitch_spread_hz < 10.0);
    }

    #[test]
    fn test_zero_crossing_rate_of_alternating_signal() {
        let samples: Vec<f32> = (0..1000).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        let features = extract(&AudioBuffer::new(samples));
        assert!(features.zero_crossing_rate > 0.99);
    }

    #[test]
    fn test_half_silent_buffer_uses_frame_energy() {
        let mut samples = vec![0.0f32; FRAME_LEN * 4];
        samples.extend(sine(200.0, 0.5, (FRAME_LEN * 4) as f32 / 16_000.0).samples());
        let features = extract(&AudioBuffer::new(samples));

        assert!((features.silence_ratio - 0.5).abs() < 1e-6, "{}", features.silence_ratio);
        assert!((features.rms - 0.25).abs() < 0.01, "{}", features.rms);
        assert!(features.energy_variation > 0.9);
    }

    #[test]
    fn test_empty_buffer_is_silent() {
        let features = extract(&AudioBuffer::new(Vec::new()));
        assert_eq!(features.silence_ratio, 1.0);
    }
}
