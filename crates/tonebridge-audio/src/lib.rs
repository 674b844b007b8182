pub mod decoder;
pub mod features;
pub mod wav;

pub use decoder::{normalize, AudioNormalizer, DEFAULT_MIN_PLAUSIBLE_BYTES};
pub use features::{extract as extract_features, AcousticFeatures};
pub use wav::{encode_wav, to_pcm16, to_pcm16_bytes};
