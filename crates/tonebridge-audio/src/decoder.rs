use std::io::Cursor;

use symphonia::core::audio::{AudioBufferRef, SampleBuffer};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tonebridge_core::{AudioBuffer, AudioError, AudioFormat, TARGET_SAMPLE_RATE};

/// Payloads below this many bytes are suspicious but still decoded.
pub const DEFAULT_MIN_PLAUSIBLE_BYTES: usize = 100;

const RESAMPLE_CHUNK: usize = 1024;
const MAX_FLUSH_CHUNKS: usize = 8;

/// Turns format-tagged bytes into a canonical [`AudioBuffer`].
#[derive(Debug, Clone)]
pub struct AudioNormalizer {
    min_plausible_bytes: usize,
}

impl AudioNormalizer {
    pub fn new(min_plausible_bytes: usize) -> Self {
        Self {
            min_plausible_bytes,
        }
    }

    pub fn normalize(&self, bytes: &[u8], format: AudioFormat) -> Result<AudioBuffer, AudioError> {
        if bytes.is_empty() {
            return Err(AudioError::Empty { format });
        }
        if bytes.len() < self.min_plausible_bytes {
            tracing::warn!(
                bytes = bytes.len(),
                threshold = self.min_plausible_bytes,
                %format,
                "audio payload is suspiciously small"
            );
        }

        let mut samples = match format {
            AudioFormat::Pcm16 => decode_pcm16(bytes),
            _ => decode_container(bytes, format)?,
        };

        if samples.is_empty() {
            return Err(AudioError::Empty { format });
        }

        for s in samples.iter_mut() {
            *s = if s.is_finite() { s.clamp(-1.0, 1.0) } else { 0.0 };
        }

        let buffer = AudioBuffer::new(samples);
        tracing::debug!(
            samples = buffer.len(),
            duration_secs = buffer.duration_secs(),
            %format,
            "audio normalized to 16kHz mono"
        );
        Ok(buffer)
    }
}

impl Default for AudioNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_PLAUSIBLE_BYTES)
    }
}

/// Decode with the default plausibility threshold.
pub fn normalize(bytes: &[u8], format: AudioFormat) -> Result<AudioBuffer, AudioError> {
    AudioNormalizer::default().normalize(bytes, format)
}

fn decode_pcm16(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

fn decode_container(bytes: &[u8], format: AudioFormat) -> Result<Vec<f32>, AudioError> {
    let decode_err = |reason: String| AudioError::Decode { format, reason };

    let cursor = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(format.extension());

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_err(format!("probe: {e}")))?;

    let mut reader = probed.format;

    let track = reader
        .default_track()
        .ok_or_else(|| decode_err("no audio track found".to_string()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let source_rate = codec_params
        .sample_rate
        .ok_or_else(|| decode_err("unknown sample rate".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(format!("codec: {e}")))?;

    let mut mono: Vec<f32> = Vec::new();

    loop {
        let packet = match reader.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(symphonia::core::errors::Error::ResetRequired) => break,
            Err(e) => return Err(decode_err(format!("packet: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                tracing::warn!(error = %e, "skipping corrupt audio frame");
                continue;
            }
            Err(e) => return Err(decode_err(format!("decode: {e}"))),
        };

        downmix_decoded(decoded, &mut mono);
    }

    if mono.is_empty() || source_rate == TARGET_SAMPLE_RATE {
        return Ok(mono);
    }

    resample(&mono, source_rate, TARGET_SAMPLE_RATE).map_err(decode_err)
}

/// Downmix one decoded packet. The channel layout comes from the packet
/// itself; track parameters may leave it unset.
fn downmix_decoded(decoded: AudioBufferRef<'_>, out: &mut Vec<f32>) {
    let spec = *decoded.spec();
    let frames = decoded.frames();
    if frames == 0 {
        return;
    }

    let mut sample_buf = SampleBuffer::<f32>::new(frames as u64, spec);
    sample_buf.copy_interleaved_ref(decoded);
    downmix_into(sample_buf.samples(), spec.channels.count(), out);
}

/// Average interleaved frames down to one channel.
pub fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.extend(
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32),
    );
}

fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, String> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = to_rate as f64 / from_rate as f64;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, RESAMPLE_CHUNK, 1)
        .map_err(|e| format!("resampler init: {e}"))?;

    let expected_len = ((samples.len() as f64 * ratio) as usize).max(1);
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected_len + delay + 2 * RESAMPLE_CHUNK);

    for chunk in samples.chunks(RESAMPLE_CHUNK) {
        let mut input = chunk.to_vec();
        input.resize(RESAMPLE_CHUNK, 0.0);
        process_chunk(&mut resampler, input, &mut output)?;
    }

    // Flush the filter tail so the end of the signal is not lost.
    let mut flushes = 0;
    while output.len() < expected_len + delay && flushes < MAX_FLUSH_CHUNKS {
        process_chunk(&mut resampler, vec![0.0; RESAMPLE_CHUNK], &mut output)?;
        flushes += 1;
    }

    output.drain(..delay.min(output.len()));
    output.resize(expected_len, 0.0);

    Ok(output)
}

fn process_chunk(
    resampler: &mut rubato::SincFixedIn<f32>,
    input: Vec<f32>,
    output: &mut Vec<f32>,
) -> Result<(), String> {
    use rubato::Resampler;

    let result = resampler
        .process(&[input], None)
        .map_err(|e| format!("resample: {e}"))?;
    if let Some(channel) = result.first() {
        output.extend_from_slice(channel);
    }
    Ok(())
}
