pub mod subtitles;
pub mod whisper;

pub use subtitles::{SubtitleEntry, SubtitleGenerator};
pub use whisper::{Transcript, TranscriptSegment, WhisperTranscriber};

/// Sample rate expected by Whisper models
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;
