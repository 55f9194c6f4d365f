//! Transcript review via LLM critique

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{create_llm, ChatMessage, Llm};
use crate::config::ReviewConfig;

/// Marker prefixing each corrected statement in the requested report
pub const CORRECTION_MARKER: &str = "✅ Corrected:";

/// Fixed critique instructions; the transcript excerpt is appended below
const REVIEW_PROMPT_HEADER: &str = "\
You are a senior technical editor specializing in AI, databases, and vector search.
Analyze the following transcript and produce a clear, accurate Markdown report.

### Tasks
1. Identify and correct any factual inaccuracies or oversimplifications.
2. Write a **3-paragraph summary** preserving all key technical content.
3. Provide **5-10 corrected statements**, each beginning with ✅ Corrected:.

### Output Format
## Summary
<3 concise paragraphs>

## Technical Corrections
✅ Corrected: <item 1>
✅ Corrected: <item 2>

## Notes
- Optional commentary about clarity or pacing.";

/// Outcome of a review run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewOutcome {
    /// Where the Markdown report was written
    pub report_path: PathBuf,
    /// The transcript exceeded the character ceiling and was cut down
    pub truncated: bool,
    /// Transcript characters actually included in the prompt
    pub chars_sent: usize,
    /// Token usage reported by the provider, when available
    pub tokens_used: Option<u32>,
}

/// Requests a structured Markdown critique of a transcript
pub struct TranscriptReviewer {
    llm: Box<dyn Llm>,
    max_transcript_chars: usize,
}

impl TranscriptReviewer {
    /// Create a reviewer and verify the provider is reachable
    pub async fn new(config: &ReviewConfig) -> Result<Self> {
        let llm = create_llm(config)?;

        if !llm.is_available().await {
            return Err(anyhow!(
                "LLM provider {:?} is not available",
                config.provider
            ));
        }

        info!(
            "✅ Transcript reviewer initialized with {:?} provider",
            config.provider
        );

        Ok(Self {
            llm,
            max_transcript_chars: config.max_transcript_chars,
        })
    }

    /// Build a reviewer around an existing provider. Used by tests.
    pub fn with_llm(llm: Box<dyn Llm>, max_transcript_chars: usize) -> Self {
        Self {
            llm,
            max_transcript_chars,
        }
    }

    /// Cut the transcript to the character ceiling, on a char boundary.
    /// Returns the excerpt and whether anything was dropped.
    fn excerpt<'a>(&self, transcript: &'a str) -> (&'a str, bool) {
        match transcript.char_indices().nth(self.max_transcript_chars) {
            Some((byte_index, _)) => (&transcript[..byte_index], true),
            None => (transcript, false),
        }
    }

    /// Assemble the full prompt for a transcript
    pub fn build_prompt(&self, transcript: &str) -> (String, bool) {
        let (excerpt, truncated) = self.excerpt(transcript);
        let prompt = format!("{}\n\nTranscript:\n{}", REVIEW_PROMPT_HEADER, excerpt);
        (prompt, truncated)
    }

    /// Request the critique and write the raw response to `report_path`.
    ///
    /// On a request failure nothing is written; the error carries the
    /// provider's message.
    pub async fn review_to_file(
        &self,
        transcript_text: &str,
        report_path: &Path,
    ) -> Result<ReviewOutcome> {
        let (prompt, truncated) = self.build_prompt(transcript_text);
        let chars_sent = transcript_text
            .chars()
            .count()
            .min(self.max_transcript_chars);

        if truncated {
            warn!(
                "✂️ Transcript truncated to {} characters before prompting",
                self.max_transcript_chars
            );
        }

        info!("🧠 Sending transcript for review ({} characters)", chars_sent);

        let response = self
            .llm
            .chat(vec![ChatMessage::user(prompt)])
            .await
            .context("review request failed")?;

        tokio::fs::write(report_path, &response.content)
            .await
            .with_context(|| format!("failed to write {}", report_path.display()))?;

        info!("📘 Review written to: {}", report_path.display());

        Ok(ReviewOutcome {
            report_path: report_path.to_path_buf(),
            truncated,
            chars_sent,
            tokens_used: response.tokens_used,
        })
    }
}
