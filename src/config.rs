use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::llm::LlmProvider;

/// Configuration for the Lecture Analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Audio extraction settings
    pub audio: AudioConfig,

    /// Transcription settings
    pub transcription: TranscriptionConfig,

    /// Transcript review (LLM) settings
    pub review: ReviewConfig,

    /// Output and storage settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Target sample rate for transcription
    pub target_sample_rate: u32,

    /// Re-extract audio even when the destination file already exists.
    /// Replaces the interactive overwrite prompt; the CLI resolves this
    /// before the pipeline runs.
    pub overwrite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Whisper model name, resolved to models/ggml-<name>.bin
    pub model: String,

    /// Explicit path to a ggml model file, overriding name resolution
    pub model_path: Option<PathBuf>,

    /// Language hint for transcription; None enables auto-detection
    pub language: Option<String>,

    /// Enable GPU inference. Off by default for CPU-safe operation.
    pub use_gpu: bool,

    /// Inference thread count (None = whisper default)
    pub threads: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// LLM provider to use
    pub provider: LlmProvider,

    /// API endpoint (required for the local provider)
    pub endpoint: Option<String>,

    /// Environment variable holding the API credential
    pub api_key_env: String,

    /// Model to use
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature for generation
    pub temperature: f32,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Character ceiling for transcript text sent to the model. Longer
    /// transcripts are truncated to exactly this many characters.
    pub max_transcript_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Base output directory for audio and transcript artifacts
    pub base_dir: PathBuf,

    /// File name of the review report, created under the output directory
    pub review_file: String,
}

impl Config {
    /// Load configuration from file, falling back to environment overrides
    /// over the defaults.
    pub fn load() -> Result<Self> {
        let config_paths = ["lecture-analyzer.toml", "config/lecture-analyzer.toml"];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Build configuration from defaults plus environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(sample_rate) = std::env::var("LECTURE_ANALYZER_SAMPLE_RATE") {
            config.audio.target_sample_rate = sample_rate.parse().unwrap_or(16000);
        }

        if let Ok(model) = std::env::var("LECTURE_ANALYZER_MODEL") {
            config.transcription.model = model;
        }

        if let Ok(language) = std::env::var("LECTURE_ANALYZER_LANGUAGE") {
            config.transcription.language = Some(language);
        }

        if let Ok(output_dir) = std::env::var("LECTURE_ANALYZER_OUTPUT_DIR") {
            config.output.base_dir = PathBuf::from(output_dir);
        }

        if let Ok(endpoint) = std::env::var("LECTURE_ANALYZER_LLM_ENDPOINT") {
            config.review.endpoint = Some(endpoint);
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.audio.target_sample_rate == 0 {
            return Err(anyhow!("target_sample_rate must be greater than 0"));
        }

        if self.transcription.model.trim().is_empty() && self.transcription.model_path.is_none() {
            return Err(anyhow!("either a model name or an explicit model_path is required"));
        }

        if self.review.max_transcript_chars == 0 {
            return Err(anyhow!("max_transcript_chars must be greater than 0"));
        }

        if !(0.0..=2.0).contains(&self.review.temperature) {
            return Err(anyhow!("temperature must be within 0.0..=2.0"));
        }

        if self.review.provider == LlmProvider::Local && self.review.endpoint.is_none() {
            return Err(anyhow!("endpoint required for the local LLM provider"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            transcription: TranscriptionConfig::default(),
            review: ReviewConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16000, // 16kHz optimal for Whisper
            overwrite: false,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: "base".to_string(),
            model_path: None,
            language: Some("en".to_string()),
            use_gpu: false,
            threads: None,
        }
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            endpoint: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o".to_string(),
            max_tokens: 4096,
            temperature: 0.4,
            timeout_seconds: 120,
            max_transcript_chars: 120_000,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./transcripts"),
            review_file: "review_summary.md".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.audio.target_sample_rate, 16000);
        assert!(!config.audio.overwrite);
        assert_eq!(config.review.max_transcript_chars, 120_000);
        assert_eq!(config.review.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_sample_rate() {
        let mut config = Config::default();
        config.audio.target_sample_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_requires_endpoint_for_local_provider() {
        let mut config = Config::default();
        config.review.provider = LlmProvider::Local;
        config.review.endpoint = None;
        assert!(config.validate().is_err());

        config.review.endpoint = Some("http://localhost:1234/v1/chat/completions".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [transcription]
            model = "large-v3"
            "#,
        )
        .unwrap();

        assert_eq!(config.transcription.model, "large-v3");
        assert_eq!(config.audio.target_sample_rate, 16000);
        assert_eq!(config.review.model, "gpt-4o");
    }
}
