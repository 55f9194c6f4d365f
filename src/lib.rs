/// Lecture Analyzer - Rust Implementation
///
/// Transcription pipeline for instructional video content: audio extraction,
/// local Whisper transcription, transcript artifacts, and LLM-based review.

pub mod artifacts;
pub mod audio;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod transcription;

// Re-export main types for easy access
pub use crate::artifacts::{ArtifactSet, ArtifactWriter};
pub use crate::audio::{AudioDecoder, AudioExtractor, AudioInfo, ExtractedAudio, FfmpegDecoder};
pub use crate::config::Config;
pub use crate::llm::review::{ReviewOutcome, TranscriptReviewer};
pub use crate::pipeline::{PipelineReport, TranscriptionPipeline};
pub use crate::transcription::{Transcript, TranscriptSegment, WhisperTranscriber};

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error taxonomy for the extraction pipeline
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing or empty input file: {0}")]
    MissingInput(String),

    #[error("{tool} exited with status {status}: {stderr}")]
    ExternalTool {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("audio extraction produced no usable output: {0}")]
    EmptyOutput(String),

    #[error("transcription failed: {0}")]
    Transcription(String),
}

impl PipelineError {
    /// Build an external-tool error from a finished process, keeping only the
    /// leading portion of its stderr.
    pub fn from_tool_output(tool: &str, output: &std::process::Output) -> Self {
        let status = output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());

        Self::ExternalTool {
            tool: tool.to_string(),
            status,
            stderr: stderr_tail(&output.stderr),
        }
    }
}

/// Number of stderr characters kept when reporting an external tool failure.
pub(crate) const STDERR_TAIL_CHARS: usize = 400;

pub(crate) fn stderr_tail(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .chars()
        .take(STDERR_TAIL_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_tail_truncates_long_output() {
        let long = "x".repeat(1000);
        let tail = stderr_tail(long.as_bytes());
        assert_eq!(tail.chars().count(), STDERR_TAIL_CHARS);
    }

    #[test]
    fn stderr_tail_keeps_short_output() {
        let tail = stderr_tail(b"stream not found");
        assert_eq!(tail, "stream not found");
    }

    #[test]
    fn stderr_tail_handles_invalid_utf8() {
        let tail = stderr_tail(&[0xff, 0xfe, b'o', b'k']);
        assert!(tail.contains("ok"));
    }
}
