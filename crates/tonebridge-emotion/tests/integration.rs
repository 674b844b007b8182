use tonebridge_core::config::EmotionConfig;
use tonebridge_core::{AudioBuffer, Emotion, EmotionSource};
use tonebridge_emotion::{AudioEmotionClassifier, FusionPolicy, TextEmotionClassifier};

fn tone(freq: f32, amplitude: f32, seconds: f32) -> AudioBuffer {
    let n = (16_000.0 * seconds) as usize;
    AudioBuffer::new(
        (0..n)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / 16_000.0).sin())
            .collect(),
    )
}

#[tokio::test]
async fn test_text_and_audio_fuse_from_default_config() {
    let config = EmotionConfig::default();
    let text = TextEmotionClassifier::from_config(&config);
    let audio = AudioEmotionClassifier::from_config(&config);

    let t = text.classify("I am so happy to see you!").await;
    assert_eq!(t.emotion, Emotion::Happy);
    let a = audio.classify(&tone(220.0, 0.4, 1.0)).await;
    assert!(!a.degraded);

    let fused = FusionPolicy::default().fuse(Some(t.clone()), Some(a.clone())).unwrap();
    assert_eq!(fused.source, EmotionSource::Fused);
    assert!(fused.confidence <= t.confidence.max(a.confidence));
    assert!(fused.emotion == t.emotion || fused.emotion == a.emotion);
}

#[tokio::test]
async fn test_disabled_models_never_fail() {
    let config = EmotionConfig {
        text_model: "none".to_string(),
        audio_model: "none".to_string(),
        ..Default::default()
    };
    let t = TextEmotionClassifier::from_config(&config)
        .classify("furious")
        .await;
    let a = AudioEmotionClassifier::from_config(&config)
        .classify(&tone(220.0, 0.4, 0.2))
        .await;
    assert!(t.degraded && a.degraded);

    let fused = FusionPolicy::default().fuse(Some(t), Some(a)).unwrap();
    assert_eq!(fused.emotion, Emotion::Neutral);
    assert_eq!(fused.confidence, 0.0);
    assert_eq!(fused.glyph, "😐");
}

#[tokio::test]
async fn test_text_only_result_keeps_text_source() {
    let text = TextEmotionClassifier::from_config(&EmotionConfig::default());
    let result = FusionPolicy::default()
        .fuse(Some(text.classify("this is disgusting").await), None)
        .unwrap();
    assert_eq!(result.emotion, Emotion::Disgust);
    assert_eq!(result.source, EmotionSource::TextOnly);
}
