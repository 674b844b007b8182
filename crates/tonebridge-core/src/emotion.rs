use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Fear,
    Surprise,
    Disgust,
    Neutral,
    Sarcastic,
    Excited,
    Calm,
    Frustrated,
}

/// Glyph shown for labels outside the supported set.
pub const NEUTRAL_GLYPH: &str = "😐";

const GLYPHS: [(Emotion, &str); 11] = [
    (Emotion::Happy, "😊"),
    (Emotion::Sad, "😢"),
    (Emotion::Angry, "😠"),
    (Emotion::Fear, "😨"),
    (Emotion::Surprise, "😲"),
    (Emotion::Disgust, "🤢"),
    (Emotion::Neutral, NEUTRAL_GLYPH),
    (Emotion::Sarcastic, "😏"),
    (Emotion::Excited, "🤩"),
    (Emotion::Calm, "😌"),
    (Emotion::Frustrated, "😤"),
];

impl Emotion {
    pub const ALL: [Emotion; 11] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fear,
        Emotion::Surprise,
        Emotion::Disgust,
        Emotion::Neutral,
        Emotion::Sarcastic,
        Emotion::Excited,
        Emotion::Calm,
        Emotion::Frustrated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Fear => "fear",
            Emotion::Surprise => "surprise",
            Emotion::Disgust => "disgust",
            Emotion::Neutral => "neutral",
            Emotion::Sarcastic => "sarcastic",
            Emotion::Excited => "excited",
            Emotion::Calm => "calm",
            Emotion::Frustrated => "frustrated",
        }
    }

    pub fn glyph(&self) -> &'static str {
        glyph_for(*self)
    }

    /// Map a classifier label onto the supported set.
    ///
    /// Accepts the canonical names plus the GoEmotions label set and a few
    /// common spellings (`joy`, `anger`, `sadness`, ...).
    pub fn from_label(label: &str) -> Option<Emotion> {
        let label = label.trim().to_ascii_lowercase();
        let emotion = match label.as_str() {
            "happy" | "joy" | "happiness" | "amusement" | "admiration" | "approval"
            | "gratitude" | "love" | "optimism" | "pride" => Emotion::Happy,
            "sad" | "sadness" | "grief" | "disappointment" | "remorse" | "embarrassment" => {
                Emotion::Sad
            }
            "angry" | "anger" | "rage" => Emotion::Angry,
            "fear" | "fearful" | "scared" | "nervousness" => Emotion::Fear,
            "surprise" | "surprised" | "realization" | "curiosity" | "confusion" => {
                Emotion::Surprise
            }
            "disgust" | "disgusted" => Emotion::Disgust,
            "neutral" => Emotion::Neutral,
            "sarcastic" | "sarcasm" => Emotion::Sarcastic,
            "excited" | "excitement" | "desire" => Emotion::Excited,
            "calm" | "relief" | "caring" | "content" => Emotion::Calm,
            "frustrated" | "frustration" | "annoyance" | "disapproval" => Emotion::Frustrated,
            _ => return None,
        };
        Some(emotion)
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn glyph_for(emotion: Emotion) -> &'static str {
    GLYPHS
        .iter()
        .find(|(e, _)| *e == emotion)
        .map(|(_, glyph)| *glyph)
        .unwrap_or(NEUTRAL_GLYPH)
}

/// Glyph for a free-form label; unknown labels get the neutral glyph.
pub fn glyph_for_label(label: &str) -> &'static str {
    Emotion::from_label(label)
        .map(glyph_for)
        .unwrap_or(NEUTRAL_GLYPH)
}

/// The full label -> glyph table, in declaration order.
pub fn glyph_table() -> Vec<(&'static str, &'static str)> {
    GLYPHS.iter().map(|(e, g)| (e.as_str(), *g)).collect()
}
