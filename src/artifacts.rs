//! Transcript artifact persistence

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::transcription::{SubtitleEntry, SubtitleGenerator, Transcript};

/// Outcome of an artifact write.
///
/// Skips are structured fields rather than console-only prints so calling
/// code and tests can assert on them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactSet {
    /// Plain transcript text
    pub text_path: Option<PathBuf>,
    /// Subtitle file; None when the transcript carried no segments
    pub subtitle_path: Option<PathBuf>,
    /// Structured JSON dump of the complete transcript
    pub json_path: Option<PathBuf>,
    /// The transcript had no segments, so no subtitle file was produced
    pub subtitles_skipped: bool,
    /// The transcript had no text, so nothing was written
    pub empty_transcript: bool,
}

/// Writes transcript artifacts under one base name
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Persist a transcript as `<base>.txt`, `<base>.srt`, and `<base>.json`.
    ///
    /// A transcript with no text produces no files and a warning; one with no
    /// segments produces text and JSON but no subtitle file.
    pub async fn write(&self, transcript: &Transcript, base_name: &str) -> Result<ArtifactSet> {
        if transcript.text.trim().is_empty() {
            warn!("⚠️ Transcriber returned no text; skipping artifact writes");
            return Ok(ArtifactSet {
                empty_transcript: true,
                ..ArtifactSet::default()
            });
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;

        let mut artifacts = ArtifactSet::default();

        let text_path = self.output_dir.join(format!("{}.txt", base_name));
        tokio::fs::write(&text_path, &transcript.text)
            .await
            .with_context(|| format!("failed to write {}", text_path.display()))?;
        info!(
            "💾 Saved transcript text: {} ({} characters)",
            text_path.display(),
            transcript.text.len()
        );
        artifacts.text_path = Some(text_path);

        let json_path = self.output_dir.join(format!("{}.json", base_name));
        let json_data = serde_json::to_string_pretty(transcript)?;
        tokio::fs::write(&json_path, json_data)
            .await
            .with_context(|| format!("failed to write {}", json_path.display()))?;
        info!("💾 Saved transcript JSON: {}", json_path.display());
        artifacts.json_path = Some(json_path);

        if transcript.segments.is_empty() {
            debug!("Transcript has no segments; subtitle file skipped");
            artifacts.subtitles_skipped = true;
            return Ok(artifacts);
        }

        let subtitle_path = self.output_dir.join(format!("{}.srt", base_name));
        let generator = build_subtitles(transcript);

        let issues = generator.validate();
        if !issues.is_empty() {
            warn!("Subtitle validation issues: {:?}", issues);
        }

        generator
            .save_to_file(&subtitle_path)
            .await
            .with_context(|| format!("failed to write {}", subtitle_path.display()))?;
        info!(
            "💾 Saved subtitles: {} ({} entries)",
            subtitle_path.display(),
            generator.len()
        );
        artifacts.subtitle_path = Some(subtitle_path);

        Ok(artifacts)
    }
}

/// Build subtitle entries from transcript segments, one entry per segment,
/// indexed from 1.
fn build_subtitles(transcript: &Transcript) -> SubtitleGenerator {
    let mut generator = SubtitleGenerator::new();

    for (i, segment) in transcript.segments.iter().enumerate() {
        generator.add_entry(SubtitleEntry::new(
            (i + 1) as u32,
            Duration::from_secs_f64(segment.start.max(0.0)),
            Duration::from_secs_f64(segment.end.max(0.0)),
            segment.text.clone(),
        ));
    }

    generator
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::TranscriptSegment;
    use chrono::Utc;
    use tempfile::TempDir;

    fn transcript(text: &str, segments: Vec<TranscriptSegment>) -> Transcript {
        Transcript {
            text: text.to_string(),
            language: Some("en".to_string()),
            segments,
            model: "base".to_string(),
            audio_path: PathBuf::from("talk_audio.wav"),
            created_at: Utc::now(),
        }
    }

    fn segment(id: u32, start: f64, end: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            id,
            start,
            end,
            text: text.to_string(),
            no_speech_prob: None,
        }
    }

    #[tokio::test]
    async fn writes_all_three_artifacts() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path());

        let t = transcript(
            "hello world again",
            vec![
                segment(0, 0.0, 2.0, "hello world"),
                segment(1, 2.0, 4.0, "again"),
            ],
        );

        let artifacts = writer.write(&t, "talk_audio").await.unwrap();

        assert!(artifacts.text_path.is_some());
        assert!(artifacts.json_path.is_some());
        assert!(artifacts.subtitle_path.is_some());
        assert!(!artifacts.subtitles_skipped);
        assert!(!artifacts.empty_transcript);

        let text = std::fs::read_to_string(dir.path().join("talk_audio.txt")).unwrap();
        assert_eq!(text, "hello world again");

        let srt = std::fs::read_to_string(dir.path().join("talk_audio.srt")).unwrap();
        assert!(srt.starts_with("1\n0:00:00 --> 0:00:02\nhello world\n\n"));
        assert!(srt.contains("2\n0:00:02 --> 0:00:04\nagain\n"));
    }

    #[tokio::test]
    async fn zero_segments_skips_subtitles_only() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path());

        let t = transcript("text without timing", vec![]);
        let artifacts = writer.write(&t, "talk_audio").await.unwrap();

        assert!(artifacts.text_path.is_some());
        assert!(artifacts.json_path.is_some());
        assert!(artifacts.subtitle_path.is_none());
        assert!(artifacts.subtitles_skipped);
        assert!(!dir.path().join("talk_audio.srt").exists());
    }

    #[tokio::test]
    async fn empty_text_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path());

        let t = transcript("   ", vec![segment(0, 0.0, 1.0, "ghost")]);
        let artifacts = writer.write(&t, "talk_audio").await.unwrap();

        assert!(artifacts.empty_transcript);
        assert!(artifacts.text_path.is_none());
        assert!(artifacts.json_path.is_none());
        assert!(artifacts.subtitle_path.is_none());
        assert!(!dir.path().join("talk_audio.txt").exists());
        assert!(!dir.path().join("talk_audio.json").exists());
    }

    #[tokio::test]
    async fn json_dump_round_trips() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path());

        let t = transcript("hello", vec![segment(0, 0.25, 1.75, "hello")]);
        writer.write(&t, "talk_audio").await.unwrap();

        let json = std::fs::read_to_string(dir.path().join("talk_audio.json")).unwrap();
        let parsed: Transcript = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.text, "hello");
        assert_eq!(parsed.segments.len(), 1);
        assert_eq!(parsed.segments[0].start, 0.25);
    }
}
