use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::{debug, info};
use whisper_rs::{
    install_logging_hooks, FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters,
};

use crate::audio::AudioDecoder;
use crate::config::TranscriptionConfig;
use crate::{PipelineError, Result};

use super::WHISPER_SAMPLE_RATE;

static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// A timed span of transcript text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Segment ID
    pub id: u32,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Transcribed text
    pub text: String,
    /// No speech probability
    pub no_speech_prob: Option<f32>,
}

/// Complete transcription result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Full transcription text
    pub text: String,
    /// Detected or configured language
    pub language: Option<String>,
    /// Individual segments with timestamps
    pub segments: Vec<TranscriptSegment>,
    /// Model used for transcription
    pub model: String,
    /// Audio file the transcript was produced from
    pub audio_path: PathBuf,
    /// When the transcript was created
    pub created_at: DateTime<Utc>,
}

/// Whisper transcriber with an injected audio decoder.
///
/// The decoder is part of the construction contract so that transcription
/// never depends on the speech library's own file loading.
pub struct WhisperTranscriber {
    config: TranscriptionConfig,
    decoder: Box<dyn AudioDecoder>,
}

impl WhisperTranscriber {
    pub fn new(config: TranscriptionConfig, decoder: Box<dyn AudioDecoder>) -> Self {
        Self { config, decoder }
    }

    /// Resolve the ggml model file for the configured model.
    ///
    /// An explicit `model_path` wins; otherwise the conventional
    /// `models/ggml-<name>.bin` location is tried.
    pub fn resolve_model_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config.model_path {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(PipelineError::Transcription(format!(
                "model file not found: {}",
                path.display()
            )));
        }

        let candidate = PathBuf::from(format!("models/ggml-{}.bin", self.config.model));
        if candidate.exists() {
            return Ok(candidate);
        }

        Err(PipelineError::Transcription(format!(
            "whisper model '{}' not found at {}; download a ggml model from \
             https://huggingface.co/ggerganov/whisper.cpp",
            self.config.model,
            candidate.display()
        )))
    }

    /// Transcribe an audio file into a `Transcript`.
    ///
    /// Inference is synchronous; callers on an async runtime should run this
    /// on the blocking pool.
    pub fn transcribe(&self, audio_path: &Path) -> Result<Transcript> {
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        let model_path = self.resolve_model_path()?;

        info!("🧠 Loading whisper model: {}", model_path.display());

        let mut context_params = WhisperContextParameters::default();
        context_params.use_gpu(self.config.use_gpu);

        let model_str = model_path.to_str().ok_or_else(|| {
            PipelineError::Transcription("invalid UTF-8 in model path".to_string())
        })?;

        let context = WhisperContext::new_with_params(model_str, context_params)
            .map_err(|e| PipelineError::Transcription(format!("model load failed: {}", e)))?;

        info!("🎤 Transcribing: {}", audio_path.display());

        let samples = self.decoder.decode(audio_path, WHISPER_SAMPLE_RATE)?;
        if samples.is_empty() {
            return Err(PipelineError::Transcription(format!(
                "decoder produced no samples for {}",
                audio_path.display()
            )));
        }

        debug!(
            "Decoded {:.1}s of audio ({} samples)",
            samples.len() as f64 / WHISPER_SAMPLE_RATE as f64,
            samples.len()
        );

        let mut state = context
            .create_state()
            .map_err(|e| PipelineError::Transcription(format!("state init failed: {}", e)))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(self.config.language.as_deref());

        if let Some(threads) = self.config.threads {
            params.set_n_threads(threads as i32);
        }

        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, &samples)
            .map_err(|e| PipelineError::Transcription(format!("inference failed: {}", e)))?;

        let mut segments = Vec::new();
        for (i, segment) in state.as_iter().enumerate() {
            let text = segment.to_string().trim().to_string();
            segments.push(TranscriptSegment {
                id: i as u32,
                start: segment.start_timestamp() as f64 / 100.0,
                end: segment.end_timestamp() as f64 / 100.0,
                text,
                no_speech_prob: Some(segment.no_speech_probability()),
            });
        }

        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let language = match &self.config.language {
            Some(lang) => Some(lang.clone()),
            None => {
                let lang_id = state.full_lang_id_from_state();
                whisper_rs::get_lang_str(lang_id).map(|s| s.to_string())
            }
        };

        info!(
            "✔️ Transcription completed: {} characters, {} segments",
            text.len(),
            segments.len()
        );

        Ok(Transcript {
            text,
            language,
            segments,
            model: self.config.model.clone(),
            audio_path: audio_path.to_path_buf(),
            created_at: Utc::now(),
        })
    }
}

impl std::fmt::Debug for WhisperTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperTranscriber")
            .field("config", &self.config)
            .field("decoder", &"<AudioDecoder>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct SilentDecoder;

    impl AudioDecoder for SilentDecoder {
        fn decode(&self, _path: &Path, sample_rate: u32) -> Result<Vec<f32>> {
            Ok(vec![0.0; sample_rate as usize])
        }
    }

    fn transcriber_with(config: TranscriptionConfig) -> WhisperTranscriber {
        WhisperTranscriber::new(config, Box::new(SilentDecoder))
    }

    #[test]
    fn resolve_model_path_fails_for_missing_model() {
        let config = TranscriptionConfig {
            model: "definitely-not-installed".to_string(),
            ..Default::default()
        };

        let result = transcriber_with(config).resolve_model_path();
        assert!(matches!(result, Err(PipelineError::Transcription(_))));
    }

    #[test]
    fn resolve_model_path_prefers_explicit_path() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("ggml-tiny.bin");
        std::fs::write(&model, b"fake model data").unwrap();

        let config = TranscriptionConfig {
            model_path: Some(model.clone()),
            ..Default::default()
        };

        let resolved = transcriber_with(config).resolve_model_path().unwrap();
        assert_eq!(resolved, model);
    }

    #[test]
    fn resolve_model_path_fails_for_missing_explicit_path() {
        let config = TranscriptionConfig {
            model_path: Some(PathBuf::from("/nonexistent/ggml-base.bin")),
            ..Default::default()
        };

        let result = transcriber_with(config).resolve_model_path();
        assert!(result.is_err());
    }

    #[test]
    fn transcript_serializes_losslessly() {
        let transcript = Transcript {
            text: "hello world".to_string(),
            language: Some("en".to_string()),
            segments: vec![TranscriptSegment {
                id: 0,
                start: 0.0,
                end: 1.5,
                text: "hello world".to_string(),
                no_speech_prob: Some(0.01),
            }],
            model: "base".to_string(),
            audio_path: PathBuf::from("talk_audio.wav"),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string_pretty(&transcript).unwrap();
        let parsed: Transcript = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.text, transcript.text);
        assert_eq!(parsed.segments.len(), 1);
        assert_eq!(parsed.segments[0].end, 1.5);
        assert_eq!(parsed.model, "base");
    }
}
