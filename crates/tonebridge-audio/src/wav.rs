use std::io::Cursor;
use tonebridge_core::AudioBuffer;

/// Convert normalized samples to signed 16-bit PCM.
pub fn to_pcm16(audio: &AudioBuffer) -> Vec<i16> {
    audio
        .samples()
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16)
        .collect()
}

/// Little-endian bytes of [`to_pcm16`], as expected by LINEAR16 APIs.
pub fn to_pcm16_bytes(audio: &AudioBuffer) -> Vec<u8> {
    to_pcm16(audio)
        .into_iter()
        .flat_map(|s| s.to_le_bytes())
        .collect()
}

/// Render a buffer as a 16-bit mono WAV file in memory.
pub fn encode_wav(audio: &AudioBuffer) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: audio.channels(),
        sample_rate: audio.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for sample in to_pcm16(audio) {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}
