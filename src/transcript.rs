//! Interview transcript log
//!
//! An ordered, append-only record of question/answer turns. Owned by the
//! interview controller; cleared in place on reset, never replaced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// One question-and-answer pair in the interview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// The interviewer's question, as plain text
    pub question: String,

    /// The candidate's transcribed answer; empty until one arrives
    pub answer: String,

    /// When the question was asked
    pub asked_at: DateTime<Utc>,
}

impl Turn {
    /// Whether this turn has received an answer yet
    #[must_use]
    pub fn is_answered(&self) -> bool {
        !self.answer.is_empty()
    }
}

/// Ordered sequence of interview turns
///
/// Insertion order is chronological order is display order. At most the
/// last turn has an empty answer.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TranscriptLog {
    turns: Vec<Turn>,
}

impl TranscriptLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new turn with an empty answer placeholder
    pub fn append(&mut self, question: impl Into<String>) {
        self.turns.push(Turn {
            question: question.into(),
            answer: String::new(),
            asked_at: Utc::now(),
        });
        tracing::debug!(turns = self.turns.len(), "turn appended");
    }

    /// Attach an answer to the last turn
    ///
    /// No-op when the log is empty.
    pub fn attach_answer(&mut self, answer: impl Into<String>) {
        if let Some(last) = self.turns.last_mut() {
            last.answer = answer.into();
        }
    }

    /// Empty the log in place
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Whether any turns have been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Number of recorded turns
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Turns in insertion order
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Serialize the log to pretty JSON for export
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.turns)?)
    }
}
