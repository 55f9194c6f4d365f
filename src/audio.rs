use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::AudioConfig;
use crate::{PipelineError, Result};

/// Result of audio extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedAudio {
    /// Path to the extracted WAV file
    pub path: PathBuf,
    /// Size of the file in bytes
    pub file_size: u64,
    /// True when an existing destination file was kept instead of re-extracting
    pub reused: bool,
}

/// Audio stream information reported by ffprobe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioInfo {
    pub duration: Duration,
    pub sample_rate: u32,
    pub channels: u32,
    pub codec: String,
}

/// Extracts a mono WAV track from a video file via ffmpeg
#[derive(Debug, Clone)]
pub struct AudioExtractor {
    target_sample_rate: u32,
    overwrite: bool,
}

impl AudioExtractor {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            target_sample_rate: config.target_sample_rate,
            overwrite: config.overwrite,
        }
    }

    /// Extract audio from a video with settings suitable for transcription.
    ///
    /// The destination is `<output_dir>/<video_stem>_audio.wav`. When the
    /// destination already exists and `overwrite` is off, the existing file is
    /// kept untouched and returned with `reused` set.
    pub async fn extract(&self, video_path: &Path, output_dir: &Path) -> Result<ExtractedAudio> {
        let stem = video_path
            .file_stem()
            .ok_or_else(|| {
                PipelineError::MissingInput(format!(
                    "invalid video filename: {}",
                    video_path.display()
                ))
            })?
            .to_string_lossy();

        let audio_path = output_dir.join(format!("{}_audio.wav", stem));

        tokio::fs::create_dir_all(output_dir).await?;

        if audio_path.exists() && !self.overwrite {
            info!(
                "✅ Keeping existing audio file for processing: {}",
                audio_path.display()
            );
            return self.checked_output(&audio_path, true).await;
        }

        info!("🎧 Extracting audio: {}", video_path.display());

        let output = tokio::process::Command::new("ffmpeg")
            .args(["-nostdin", "-y", "-i"])
            .arg(video_path)
            .args(["-vn", "-acodec", "pcm_s16le"])
            .args(["-ar", &self.target_sample_rate.to_string()])
            .args(["-ac", "1", "-f", "wav"])
            .arg(&audio_path)
            .stdout(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            return Err(PipelineError::from_tool_output("ffmpeg", &output));
        }

        self.checked_output(&audio_path, false).await
    }

    /// Post-condition check: the destination must exist and be non-empty.
    async fn checked_output(&self, audio_path: &Path, reused: bool) -> Result<ExtractedAudio> {
        let metadata = tokio::fs::metadata(audio_path).await.map_err(|_| {
            PipelineError::EmptyOutput(format!("{} does not exist", audio_path.display()))
        })?;

        if metadata.len() == 0 {
            return Err(PipelineError::EmptyOutput(format!(
                "{} is empty",
                audio_path.display()
            )));
        }

        info!(
            "✔️ Confirmed audio file: {} ({:.2} MB)",
            audio_path.display(),
            metadata.len() as f64 / 1_000_000.0
        );

        Ok(ExtractedAudio {
            path: audio_path.to_path_buf(),
            file_size: metadata.len(),
            reused,
        })
    }

    /// Get detailed audio information via ffprobe. Diagnostics only.
    pub async fn probe_audio(&self, audio_path: &Path) -> Result<AudioInfo> {
        let output = tokio::process::Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-select_streams",
                "a:0",
            ])
            .arg(audio_path)
            .output()
            .await?;

        if !output.status.success() {
            return Err(PipelineError::from_tool_output("ffprobe", &output));
        }

        let data: serde_json::Value = serde_json::from_slice(&output.stdout).map_err(|e| {
            PipelineError::EmptyOutput(format!("unparseable ffprobe output: {}", e))
        })?;

        let stream = data["streams"]
            .as_array()
            .and_then(|s| s.first())
            .ok_or_else(|| {
                PipelineError::EmptyOutput(format!(
                    "no audio stream found in {}",
                    audio_path.display()
                ))
            })?;

        let duration_seconds: f64 = data["format"]["duration"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0);

        Ok(AudioInfo {
            duration: Duration::from_secs_f64(duration_seconds),
            sample_rate: stream["sample_rate"]
                .as_str()
                .and_then(|s| s.parse().ok())
                .unwrap_or(self.target_sample_rate),
            channels: stream["channels"].as_u64().unwrap_or(1) as u32,
            codec: stream["codec_name"].as_str().unwrap_or("unknown").to_string(),
        })
    }
}

/// Audio decoding strategy used by the transcriber.
///
/// Decodes a media file into mono f32 samples at the requested rate. Injected
/// into the transcriber at construction so runs can use different decoders
/// without shared state.
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, path: &Path, sample_rate: u32) -> Result<Vec<f32>>;
}

/// Decoder that pipes raw little-endian f32 PCM out of ffmpeg.
///
/// Stands in for the speech library's own loader, which resolves paths
/// unreliably on some platforms.
#[derive(Debug, Clone, Default)]
pub struct FfmpegDecoder;

impl AudioDecoder for FfmpegDecoder {
    fn decode(&self, path: &Path, sample_rate: u32) -> Result<Vec<f32>> {
        if !path.exists() {
            return Err(PipelineError::MissingInput(path.display().to_string()));
        }

        let normalized = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

        debug!("🛠️ Decoding audio via ffmpeg: {}", normalized.display());

        let output = std::process::Command::new("ffmpeg")
            .args(["-nostdin", "-threads", "0", "-i"])
            .arg(&normalized)
            .args(["-f", "f32le", "-ac", "1"])
            .args(["-ar", &sample_rate.to_string()])
            .args(["-acodec", "pcm_f32le", "pipe:1"])
            .output()?;

        if !output.status.success() {
            return Err(PipelineError::from_tool_output("ffmpeg", &output));
        }

        let samples = bytes_to_f32_samples(&output.stdout);

        debug!(
            "✔️ Loaded {} samples at {} Hz from ffmpeg",
            samples.len(),
            sample_rate
        );

        Ok(samples)
    }
}

/// Reinterpret raw bytes as little-endian f32 samples. A trailing partial
/// chunk is dropped.
fn bytes_to_f32_samples(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let arr: [u8; 4] = chunk.try_into().unwrap();
            f32::from_le_bytes(arr)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AudioConfig;
    use tempfile::TempDir;

    fn extractor(overwrite: bool) -> AudioExtractor {
        AudioExtractor::new(&AudioConfig {
            target_sample_rate: 16000,
            overwrite,
        })
    }

    #[test]
    fn bytes_to_samples_converts_correctly() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0.5f32.to_le_bytes());
        bytes.extend_from_slice(&(-0.25f32).to_le_bytes());

        let samples = bytes_to_f32_samples(&bytes);

        assert_eq!(samples.len(), 2);
        assert!((samples[0] - 0.5).abs() < 1e-6);
        assert!((samples[1] + 0.25).abs() < 1e-6);
    }

    #[test]
    fn bytes_to_samples_drops_partial_chunk() {
        // 10 bytes = 2 samples + 2 stray bytes
        let bytes = vec![0u8; 10];
        let samples = bytes_to_f32_samples(&bytes);
        assert_eq!(samples.len(), 2);
    }

    #[test]
    fn decoder_rejects_missing_file() {
        let decoder = FfmpegDecoder;
        let result = decoder.decode(Path::new("/nonexistent/audio.wav"), 16000);
        assert!(matches!(result, Err(PipelineError::MissingInput(_))));
    }

    #[tokio::test]
    async fn existing_destination_is_reused_when_overwrite_is_off() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("talk.mp4");
        std::fs::write(&video, b"not really a video").unwrap();

        let dest = dir.path().join("talk_audio.wav");
        std::fs::write(&dest, b"previously extracted bytes").unwrap();

        let result = extractor(false).extract(&video, dir.path()).await.unwrap();

        assert!(result.reused);
        assert_eq!(result.path, dest);
        // No conversion ran; the file contents are untouched.
        assert_eq!(
            std::fs::read(&dest).unwrap(),
            b"previously extracted bytes"
        );
    }

    #[tokio::test]
    async fn empty_existing_destination_is_fatal() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("talk.mp4");
        std::fs::write(&video, b"not really a video").unwrap();

        std::fs::write(dir.path().join("talk_audio.wav"), b"").unwrap();

        let result = extractor(false).extract(&video, dir.path()).await;
        assert!(matches!(result, Err(PipelineError::EmptyOutput(_))));
    }
}
