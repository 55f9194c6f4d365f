use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing::{error, info, warn};

use lecture_analyzer::config::Config;
use lecture_analyzer::llm::review::TranscriptReviewer;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("lecture-review")
        .version("0.1.0")
        .about("Sends a transcript to an LLM and writes a Markdown summary and corrections report")
        .arg(
            Arg::new("transcript")
                .value_name("TRANSCRIPT")
                .help("Path to the transcript text file")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Path for the review Markdown report [default: review_summary.md next to the transcript]"),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("NAME")
                .help("Chat model to use [default: gpt-4o]"),
        )
        .arg(
            Arg::new("max-chars")
                .long("max-chars")
                .value_name("N")
                .help("Character ceiling for transcript text sent to the model [default: 120000]"),
        )
        .arg(
            Arg::new("temperature")
                .short('t')
                .long("temperature")
                .value_name("T")
                .help("Sampling temperature [default: 0.4]"),
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

    let transcript_path =
        PathBuf::from(matches.get_one::<String>("transcript").expect("required arg"));

    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    if let Some(model) = matches.get_one::<String>("model") {
        config.review.model = model.clone();
    }
    if let Some(max_chars) = matches.get_one::<String>("max-chars") {
        config.review.max_transcript_chars = max_chars.parse()?;
    }
    if let Some(temperature) = matches.get_one::<String>("temperature") {
        config.review.temperature = temperature.parse()?;
    }

    config.validate()?;

    let report_path = match matches.get_one::<String>("output") {
        Some(path) => PathBuf::from(path),
        None => transcript_path
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join(&config.output.review_file),
    };

    info!("📂 Analyzing transcript: {}", transcript_path.display());
    info!("📄 Report target: {}", report_path.display());

    if !transcript_path.exists() {
        return Err(anyhow!(
            "transcript file not found: {}",
            transcript_path.display()
        ));
    }

    let transcript_text = tokio::fs::read_to_string(&transcript_path).await?;
    let transcript_text = transcript_text.trim();

    if transcript_text.is_empty() {
        return Err(anyhow!(
            "transcript file is empty: {}",
            transcript_path.display()
        ));
    }

    let reviewer = TranscriptReviewer::new(&config.review).await?;

    match reviewer.review_to_file(transcript_text, &report_path).await {
        Ok(outcome) => {
            if outcome.truncated {
                warn!(
                    "✂️ Only the first {} characters of the transcript were reviewed",
                    outcome.chars_sent
                );
            }
            if let Some(tokens) = outcome.tokens_used {
                info!("📊 Tokens used: {}", tokens);
            }
            info!("✅ Review workflow complete");
            Ok(())
        }
        Err(e) => {
            // Reported and propagated: a failed review exits non-zero with no
            // partial report on disk.
            error!("❌ Review failed: {:#}", e);
            Err(e)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "lecture_analyzer=debug,lecture_review=debug,info"
    } else {
        "lecture_analyzer=info,lecture_review=info,warn"
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
