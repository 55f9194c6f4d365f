use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing::{error, info, warn};

use lecture_analyzer::config::Config;
use lecture_analyzer::pipeline::TranscriptionPipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("lecture-transcribe")
        .version("0.1.0")
        .about("Extracts audio from a lecture video, transcribes it, and writes transcript artifacts")
        .arg(
            Arg::new("video")
                .value_name("VIDEO")
                .help("Path to the source video file")
                .required(true),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("Output directory for audio and transcript artifacts [default: ./transcripts]"),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("NAME")
                .help("Whisper model name, resolved to models/ggml-<NAME>.bin [default: base]"),
        )
        .arg(
            Arg::new("model-path")
                .long("model-path")
                .value_name("FILE")
                .help("Explicit path to a ggml model file, overriding --model"),
        )
        .arg(
            Arg::new("language")
                .short('l')
                .long("language")
                .value_name("LANG")
                .help("Language hint for transcription, or 'auto' to detect [default: en]"),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .help("Re-extract audio even if the destination file already exists")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    init_logging(verbose);

    let video_path = PathBuf::from(matches.get_one::<String>("video").expect("required arg"));

    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    if let Some(dir) = matches.get_one::<String>("output-dir") {
        config.output.base_dir = PathBuf::from(dir);
    }
    if let Some(model) = matches.get_one::<String>("model") {
        config.transcription.model = model.clone();
    }
    if let Some(path) = matches.get_one::<String>("model-path") {
        config.transcription.model_path = Some(PathBuf::from(path));
    }
    if let Some(language) = matches.get_one::<String>("language") {
        config.transcription.language = if language == "auto" {
            None
        } else {
            Some(language.clone())
        };
    }
    if matches.get_flag("overwrite") {
        config.audio.overwrite = true;
    }

    config.validate()?;

    info!("🚀 Lecture transcription starting");
    info!("📹 Video: {}", video_path.display());

    let pipeline = TranscriptionPipeline::new(config);

    match pipeline.run(&video_path).await {
        Ok(report) => {
            if report.artifacts.empty_transcript {
                warn!("⚠️ Transcription produced no text; no artifacts were written");
            } else {
                info!("✅ Transcription workflow complete");
                if let Some(path) = &report.artifacts.text_path {
                    info!("💾 Transcript text: {}", path.display());
                }
                if let Some(path) = &report.artifacts.subtitle_path {
                    info!("💾 Subtitles: {}", path.display());
                }
                if let Some(path) = &report.artifacts.json_path {
                    info!("💾 Transcript JSON: {}", path.display());
                }
            }
            Ok(())
        }
        Err(e) => {
            error!("❌ Pipeline failed: {:#}", e);
            Err(e)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "lecture_analyzer=debug,lecture_transcribe=debug,info"
    } else {
        "lecture_analyzer=info,lecture_transcribe=info,warn"
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
