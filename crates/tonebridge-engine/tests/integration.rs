use std::io::Cursor;
use tonebridge_core::config::TranscriptionConfig;
use tonebridge_core::{AudioFormat, EngineKind, TranscribeError};
use tonebridge_engine::{
    EngineRegistry, EngineSet, ScriptedEngine, ScriptedReply, TranscriptionEngine,
    TranscriptionOrchestrator,
};

fn wav_bytes(frames: usize) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..frames {
            writer.write_sample(((i % 64) as i16 - 32) * 200).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn scripted_table(kind: &str, text: Option<&str>) -> toml::Value {
    let mut table = toml::map::Map::new();
    table.insert("kind".to_string(), toml::Value::String(kind.to_string()));
    if let Some(text) = text {
        table.insert("text".to_string(), toml::Value::String(text.to_string()));
    }
    toml::Value::Table(table)
}

#[tokio::test]
async fn test_configured_chain_falls_through_to_working_engine() {
    let mut config = TranscriptionConfig {
        chain: vec![
            "whisper".to_string(),
            "cloud".to_string(),
            "scripted".to_string(),
        ],
        ..Default::default()
    };
    config.engines.insert(
        "scripted".to_string(),
        scripted_table("offline_fallback", Some("turn on the lights")),
    );

    let set = EngineSet::build(&config, &EngineRegistry::new()).await;
    assert_eq!(set.statuses.iter().filter(|s| s.available).count(), 1);

    let orchestrator = TranscriptionOrchestrator::new(set.engines);
    let result = orchestrator
        .transcribe(&wav_bytes(16_000), AudioFormat::Wav)
        .await
        .unwrap();

    assert_eq!(result.text, "turn on the lights");
    assert_eq!(result.engine, EngineKind::OfflineFallback);
    assert_eq!(result.confidence, 0.5);
}

#[tokio::test]
async fn test_primary_engine_from_wav_scores_heuristically() {
    let engine: Box<dyn TranscriptionEngine> =
        Box::new(ScriptedEngine::new(EngineKind::PrimaryModel).with_text("hello"));
    let orchestrator = TranscriptionOrchestrator::new(vec![engine]).with_language("en");

    let result = orchestrator
        .transcribe(&wav_bytes(100_000), AudioFormat::Wav)
        .await
        .unwrap();
    // 0.3 + 0.1 + 5 / 100_000 * 100
    assert!((result.confidence - 0.405).abs() < 1e-4, "{}", result.confidence);
    assert_eq!(result.engine_name, "scripted");
}

#[tokio::test]
async fn test_every_engine_failing_reports_all_kinds() {
    let engines: Vec<Box<dyn TranscriptionEngine>> = vec![
        Box::new(ScriptedEngine::new(EngineKind::CloudApi).with_reply(ScriptedReply::NoMatch)),
        Box::new(ScriptedEngine::new(EngineKind::OfflineFallback).with_reply(ScriptedReply::Empty)),
        Box::new(ScriptedEngine::new(EngineKind::PrimaryModel).failing("no model")),
    ];
    let orchestrator = TranscriptionOrchestrator::new(engines);

    match orchestrator
        .transcribe(&wav_bytes(1_600), AudioFormat::Wav)
        .await
    {
        Err(TranscribeError::AllEnginesFailed { attempted, last }) => {
            assert_eq!(attempted, EngineKind::PRIORITY.to_vec());
            assert_eq!(
                last.and_then(|e| e.engine()),
                Some(EngineKind::OfflineFallback)
            );
        }
        other => panic!("expected AllEnginesFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_undecodable_audio_never_reaches_engines() {
    let engine = ScriptedEngine::new(EngineKind::PrimaryModel);
    let attempts = engine.attempt_counter();
    let orchestrator = TranscriptionOrchestrator::new(vec![Box::new(engine)]);

    let result = orchestrator
        .transcribe(&[0x13u8; 300], AudioFormat::Mp3)
        .await;
    assert!(matches!(result, Err(TranscribeError::Audio(_))), "{result:?}");
    assert_eq!(attempts.load(std::sync::atomic::Ordering::Relaxed), 0);
}
