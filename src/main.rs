use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tonebridge_core::{AppConfig, AudioFormat};
use tonebridge_pipeline::{DetectionMode, EmotionRequest, InferenceService};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tonebridge", about = "Speech transcription and emotion detection")]
struct Cli {
    /// Path to the configuration file (defaults apply when it does not exist)
    #[arg(short, long, default_value = "tonebridge.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transcribe one audio file
    Transcribe {
        file: PathBuf,
        /// Audio format; guessed from the file extension when omitted
        #[arg(short, long)]
        format: Option<String>,
        /// Skip emotion classification of the transcript
        #[arg(long)]
        no_emotion: bool,
    },
    /// Detect emotion from text, audio, or both
    Emotion {
        #[arg(short, long)]
        text: Option<String>,
        #[arg(short, long)]
        audio: Option<PathBuf>,
        #[arg(short, long)]
        format: Option<String>,
        /// text | audio | combined
        #[arg(short, long, default_value = "combined")]
        mode: String,
    },
    /// Transcribe several files as one batch
    Batch {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(short, long)]
        format: Option<String>,
    },
    /// Show engines, models and supported emotions
    Models,
}

fn resolve_format(explicit: Option<&str>, path: &Path) -> Result<AudioFormat> {
    match explicit {
        Some(name) => name
            .parse()
            .with_context(|| format!("invalid --format '{name}'")),
        None => AudioFormat::from_path(path).with_context(|| {
            format!(
                "cannot guess audio format of {}; pass --format",
                path.display()
            )
        }),
    }
}

fn read_audio(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load config from {:?}", cli.config))?;

    let env_filter = EnvFilter::try_new(&config.general.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::Registry::default()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        );

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    tracing::info!("tonebridge starting");

    let service = InferenceService::from_config(&config).await;

    match cli.command {
        Command::Transcribe {
            file,
            format,
            no_emotion,
        } => {
            let format = resolve_format(format.as_deref(), &file)?;
            let bytes = read_audio(&file)?;
            let report = service
                .transcribe_with_emotion(&bytes, format, !no_emotion)
                .await
                .with_context(|| format!("transcription of {} failed", file.display()))?;
            print_json(&report)?;
        }
        Command::Emotion {
            text,
            audio,
            format,
            mode,
        } => {
            let mode: DetectionMode = mode.parse()?;
            let mut request = EmotionRequest {
                text,
                mode,
                ..Default::default()
            };
            if let Some(path) = audio {
                let format = resolve_format(format.as_deref(), &path)?;
                request = request.with_audio(read_audio(&path)?, format);
            }
            let report = service
                .detect_emotion_report(request)
                .await
                .context("emotion detection failed")?;
            print_json(&report)?;
        }
        Command::Batch { files, format } => {
            let mut chunks = Vec::with_capacity(files.len());
            let mut batch_format = None;
            for file in &files {
                let file_format = resolve_format(format.as_deref(), file)?;
                match batch_format {
                    None => batch_format = Some(file_format),
                    Some(f) if f != file_format => {
                        bail!("batch files must share one format ({f} vs {file_format})")
                    }
                    Some(_) => {}
                }
                chunks.push(read_audio(file)?);
            }
            let format = batch_format.unwrap_or_default();
            let report = service.process_batch(chunks, format).await;
            print_json(&report)?;
        }
        Command::Models => {
            print_json(&service.capabilities())?;
        }
    }

    tracing::info!("tonebridge finished");
    Ok(())
}
