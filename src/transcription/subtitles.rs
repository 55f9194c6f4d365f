use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One subtitle entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleEntry {
    /// Sequential number, starting at 1
    pub index: u32,
    /// Start timestamp
    pub start: Duration,
    /// End timestamp
    pub end: Duration,
    /// Subtitle text
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(index: u32, start: Duration, end: Duration, text: String) -> Self {
        Self {
            index,
            start,
            end,
            text: text.trim().to_string(),
        }
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{} --> {}\n{}\n",
            self.index,
            format_timestamp(self.start),
            format_timestamp(self.end),
            self.text
        )
    }
}

/// Subtitle file generator
#[derive(Debug, Clone, Default)]
pub struct SubtitleGenerator {
    entries: Vec<SubtitleEntry>,
}

impl SubtitleGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry
    pub fn add_entry(&mut self, entry: SubtitleEntry) {
        self.entries.push(entry);
    }

    /// Sort entries by start time and re-index from 1
    pub fn sort_entries(&mut self) {
        self.entries.sort_by(|a, b| a.start.cmp(&b.start));

        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.index = (i + 1) as u32;
        }
    }

    /// Render the subtitle file: entries in order, each followed by a blank line
    pub fn generate(&self) -> String {
        let mut content = String::new();

        for entry in &self.entries {
            content.push_str(&entry.to_string());
            content.push('\n');
        }

        content
    }

    /// Save to file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        tokio::fs::write(path.as_ref(), self.generate()).await
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SubtitleEntry] {
        &self.entries
    }

    /// Check entries for common issues. Reported, never fatal.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (i, entry) in self.entries.iter().enumerate() {
            if entry.end <= entry.start {
                issues.push(format!("Entry {}: end time is not after start time", i + 1));
            }

            if entry.text.trim().is_empty() {
                issues.push(format!("Entry {}: empty text", i + 1));
            }
        }

        for i in 0..self.entries.len().saturating_sub(1) {
            if self.entries[i].end > self.entries[i + 1].start {
                issues.push(format!(
                    "Entries {} and {}: overlapping timestamps",
                    i + 1,
                    i + 2
                ));
            }
        }

        issues
    }
}

/// Format a timestamp as `H:MM:SS`, hours unpadded, seconds truncated
fn format_timestamp(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}:{:02}:{:02}", hours, minutes, seconds)
}
