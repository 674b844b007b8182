pub mod audio;
pub mod fusion;
pub mod lexicon;
pub mod model;
pub mod remote_model;
pub mod text;

pub use audio::{
    estimate_affect, AcousticModel, Affect, AudioEmotionClassifier, AudioEmotionModel,
};
pub use fusion::{FusionPolicy, DEFAULT_DISAGREEMENT_DISCOUNT};
pub use lexicon::LexiconModel;
pub use model::{top_prediction, LabelScore};
pub use remote_model::RemoteTextModel;
pub use text::{TextEmotionClassifier, TextEmotionModel};
