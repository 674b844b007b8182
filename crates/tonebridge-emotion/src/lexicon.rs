//! Built-in keyword model for text emotion.
//!
//! Scores are relative keyword weights. Negation within two words flips
//! positive cues towards `sad` and cancels negative ones, intensifiers
//! scale the next cue, and exclamation marks amplify high-arousal labels.
//! A neutral share is always reserved so a single weak cue never reaches
//! full confidence.

use crate::model::LabelScore;
use crate::text::TextEmotionModel;
use async_trait::async_trait;
use std::collections::HashMap;
use tonebridge_core::{Emotion, ModelError};

const NEUTRAL_MASS: f32 = 0.5;
const INTENSIFIER_GAIN: f32 = 1.5;
const NEGATED_POSITIVE_WEIGHT: f32 = 0.75;
const EXCLAMATION_GAIN: f32 = 0.25;
const MAX_EXCLAMATIONS: usize = 3;
const SARCASM_WEIGHT: f32 = 1.5;
const NEGATION_WINDOW: usize = 2;

const KEYWORDS: &[(Emotion, &[&str])] = &[
    (
        Emotion::Happy,
        &[
            "happy", "glad", "joy", "joyful", "delighted", "great", "wonderful", "love",
            "lovely", "pleased", "cheerful", "awesome", "fantastic", "good", "smile", "yay",
        ],
    ),
    (
        Emotion::Sad,
        &[
            "sad", "unhappy", "depressed", "miserable", "cry", "crying", "tears", "lonely",
            "heartbroken", "grief", "disappointed", "gloomy", "hopeless",
        ],
    ),
    (
        Emotion::Angry,
        &[
            "angry", "mad", "furious", "hate", "annoyed", "rage", "outraged", "livid",
            "irritated", "pissed",
        ],
    ),
    (
        Emotion::Fear,
        &[
            "afraid", "scared", "fear", "terrified", "anxious", "worried", "nervous", "panic",
            "frightened",
        ],
    ),
    (
        Emotion::Surprise,
        &[
            "surprised", "wow", "unexpected", "shocked", "amazed", "astonished", "whoa",
            "unbelievable",
        ],
    ),
    (
        Emotion::Disgust,
        &[
            "disgusting", "gross", "disgusted", "revolting", "nasty", "yuck", "vile",
        ],
    ),
    (
        Emotion::Excited,
        &[
            "excited", "thrilled", "ecstatic", "pumped", "hyped", "stoked", "eager",
        ],
    ),
    (
        Emotion::Calm,
        &[
            "calm", "relaxed", "peaceful", "serene", "content", "chill", "relieved",
        ],
    ),
    (
        Emotion::Frustrated,
        &[
            "frustrated", "frustrating", "stuck", "ugh", "annoying", "struggling",
            "impossible", "useless",
        ],
    ),
];

const PHRASES: &[(Emotion, &str)] = &[
    (Emotion::Excited, "can't wait"),
    (Emotion::Excited, "cannot wait"),
    (Emotion::Frustrated, "fed up"),
    (Emotion::Frustrated, "tired of"),
    (Emotion::Frustrated, "sick of"),
    (Emotion::Sarcastic, "yeah right"),
    (Emotion::Sarcastic, "oh great"),
    (Emotion::Sarcastic, "just great"),
    (Emotion::Sarcastic, "just what i needed"),
    (Emotion::Sarcastic, "thanks a lot"),
    (Emotion::Sarcastic, "big surprise"),
    (Emotion::Sarcastic, "/s"),
];

const NEGATORS: &[&str] = &["not", "no", "never", "hardly", "without", "nothing"];

const INTENSIFIERS: &[&str] = &[
    "very", "really", "so", "extremely", "super", "totally", "incredibly", "absolutely",
];

fn is_negator(token: &str) -> bool {
    NEGATORS.contains(&token) || token.ends_with("n't")
}

fn is_positive(emotion: Emotion) -> bool {
    matches!(emotion, Emotion::Happy | Emotion::Excited | Emotion::Calm)
}

fn is_high_arousal(emotion: Emotion) -> bool {
    matches!(
        emotion,
        Emotion::Happy
            | Emotion::Excited
            | Emotion::Angry
            | Emotion::Surprise
            | Emotion::Fear
            | Emotion::Frustrated
    )
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace('’', "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Deterministic keyword-based emotion model.
pub struct LexiconModel {
    keywords: HashMap<&'static str, Emotion>,
}

impl LexiconModel {
    pub fn new() -> Self {
        let keywords = KEYWORDS
            .iter()
            .flat_map(|(emotion, words)| words.iter().map(move |w| (*w, *emotion)))
            .collect();
        Self { keywords }
    }

    /// Raw per-emotion weights before normalization.
    fn weigh(&self, text: &str) -> HashMap<Emotion, f32> {
        let mut weights: HashMap<Emotion, f32> = HashMap::new();
        let tokens = tokenize(text);

        for (i, token) in tokens.iter().enumerate() {
            let Some(&emotion) = self.keywords.get(token.as_str()) else {
                continue;
            };

            let window = &tokens[i.saturating_sub(NEGATION_WINDOW)..i];
            let negated = window.iter().any(|t| is_negator(t));
            let intensified = window.iter().any(|t| INTENSIFIERS.contains(&t.as_str()));
            let weight = if intensified { INTENSIFIER_GAIN } else { 1.0 };

            if negated {
                if is_positive(emotion) {
                    *weights.entry(Emotion::Sad).or_default() += weight * NEGATED_POSITIVE_WEIGHT;
                }
                continue;
            }
            *weights.entry(emotion).or_default() += weight;
        }

        let normalized = tokens.join(" ");
        let raw = text.to_lowercase().replace('’', "'");
        for (emotion, phrase) in PHRASES {
            let hits = if phrase.contains('/') {
                raw.matches(phrase).count()
            } else {
                normalized.matches(phrase).count()
            };
            if hits > 0 {
                let weight = if *emotion == Emotion::Sarcastic {
                    SARCASM_WEIGHT
                } else {
                    1.0
                };
                *weights.entry(*emotion).or_default() += weight * hits as f32;
            }
        }

        let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS);
        if exclamations > 0 {
            let gain = 1.0 + EXCLAMATION_GAIN * exclamations as f32;
            for (emotion, weight) in weights.iter_mut() {
                if is_high_arousal(*emotion) {
                    *weight *= gain;
                }
            }
        }

        weights
    }

    pub fn scores(&self, text: &str) -> Vec<LabelScore> {
        let weights = self.weigh(text);
        let total: f32 = weights.values().sum();

        if total <= 0.0 {
            return vec![LabelScore::new(Emotion::Neutral.as_str(), NEUTRAL_MASS)];
        }

        let denominator = total + NEUTRAL_MASS;
        let mut scores: Vec<LabelScore> = weights
            .into_iter()
            .map(|(emotion, w)| LabelScore::new(emotion.as_str(), w / denominator))
            .collect();
        scores.push(LabelScore::new(
            Emotion::Neutral.as_str(),
            NEUTRAL_MASS / denominator,
        ));
        scores.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.label.cmp(&b.label)));
        scores
    }
}

impl Default for LexiconModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextEmotionModel for LexiconModel {
    fn name(&self) -> &str {
        "lexicon"
    }

    async fn predict(&self, text: &str) -> Result<Vec<LabelScore>, ModelError> {
        Ok(self.scores(text))
    }
}
