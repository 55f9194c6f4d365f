use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

use crate::artifacts::{ArtifactSet, ArtifactWriter};
use crate::audio::{AudioExtractor, ExtractedAudio, FfmpegDecoder};
use crate::config::Config;
use crate::transcription::WhisperTranscriber;
use crate::PipelineError;

/// Result of one extraction pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub video_path: PathBuf,
    pub audio: ExtractedAudio,
    pub language: Option<String>,
    pub segment_count: usize,
    pub character_count: usize,
    pub artifacts: ArtifactSet,
    pub elapsed: Duration,
}

/// Sequential extraction pipeline: extract audio, transcribe, write artifacts
pub struct TranscriptionPipeline {
    config: Config,
}

impl TranscriptionPipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the pipeline for one video file
    pub async fn run(&self, video_path: &Path) -> Result<PipelineReport> {
        let start_time = Instant::now();

        if !video_path.exists() {
            return Err(PipelineError::MissingInput(video_path.display().to_string()).into());
        }

        let output_dir = self.config.output.base_dir.clone();
        tokio::fs::create_dir_all(&output_dir).await?;

        info!("🚀 Processing video: {}", video_path.display());
        info!("📂 Output directory: {}", output_dir.display());

        // Stage 1: audio extraction
        let extractor = AudioExtractor::new(&self.config.audio);
        let audio = extractor.extract(video_path, &output_dir).await?;

        if !audio.reused {
            if let Ok(probe) = extractor.probe_audio(&audio.path).await {
                info!(
                    "📊 Audio: {:.1}s, {} Hz, {} channel(s), {}",
                    probe.duration.as_secs_f64(),
                    probe.sample_rate,
                    probe.channels,
                    probe.codec
                );
            }
        }

        // Stage 2: transcription, off the async runtime
        let transcriber = WhisperTranscriber::new(
            self.config.transcription.clone(),
            Box::new(FfmpegDecoder),
        );
        let audio_path = audio.path.clone();
        let transcript = tokio::task::spawn_blocking(move || transcriber.transcribe(&audio_path))
            .await
            .context("transcription task panicked")??;

        // Stage 3: artifacts, named after the audio file
        let base_name = audio
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| PipelineError::MissingInput(audio.path.display().to_string()))?;

        let writer = ArtifactWriter::new(&output_dir);
        let artifacts = writer.write(&transcript, &base_name).await?;

        let elapsed = start_time.elapsed();
        info!(
            "🎉 Pipeline completed in {:.1}s: {} segments, {} characters",
            elapsed.as_secs_f64(),
            transcript.segments.len(),
            transcript.text.len()
        );

        Ok(PipelineReport {
            video_path: video_path.to_path_buf(),
            audio,
            language: transcript.language.clone(),
            segment_count: transcript.segments.len(),
            character_count: transcript.text.len(),
            artifacts,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_video_is_fatal_before_processing() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.output.base_dir = dir.path().join("out");

        let pipeline = TranscriptionPipeline::new(config);
        let result = pipeline.run(Path::new("/nonexistent/talk.mp4")).await;

        assert!(result.is_err());
        // Nothing was created for the failed run
        assert!(!dir.path().join("out").exists());
    }
}
