//! Transcript accumulator
//!
//! The chat history handed to the live agent when a conversation escalates.
//! Lines are only ever appended; nothing reorders or removes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single line of conversation, as the live-chat backend expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptLine {
    pub is_bot: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "srcName")]
    pub source_name: String,
    #[serde(rename = "line")]
    pub text: String,
}

impl TranscriptLine {
    pub fn visitor(
        source_name: impl Into<String>,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            is_bot: false,
            timestamp,
            source_name: source_name.into(),
            text: text.into(),
        }
    }

    pub fn bot(
        source_name: impl Into<String>,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            is_bot: true,
            timestamp,
            source_name: source_name.into(),
            text: text.into(),
        }
    }
}

/// Append-only, insertion-ordered log of transcript lines
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Vec<TranscriptLine>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, line: TranscriptLine) {
        self.lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[cfg(test)]
    pub fn lines(&self) -> &[TranscriptLine] {
        &self.lines
    }

    /// Copy of the current lines, detached from later appends
    pub fn snapshot(&self) -> Vec<TranscriptLine> {
        self.lines.clone()
    }
}
