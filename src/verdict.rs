//! Performance verdict extraction
//!
//! The feedback prompt instructs the model to end with a
//! "Performance level" line holding exactly one of three labels. Decoding
//! is a tagged-variant parse over that fixed vocabulary so the fallback
//! path is an explicit case rather than a silent regex miss.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::markdown;

/// Fixed-vocabulary performance label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Poor,
    Good,
    Excellent,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Poor => "Poor",
            Self::Good => "Good",
            Self::Excellent => "Excellent",
        };
        f.write_str(label)
    }
}

impl FromStr for Verdict {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "poor" => Ok(Self::Poor),
            "good" => Ok(Self::Good),
            "excellent" => Ok(Self::Excellent),
            _ => Err(()),
        }
    }
}

fn verdict_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)Performance level:\s*(Poor|Good|Excellent)")
            .expect("verdict pattern is valid")
    })
}

impl Verdict {
    /// Scan feedback text for the performance-level line
    ///
    /// Case-insensitive; returns `None` when no recognizable label is
    /// present.
    #[must_use]
    pub fn extract(feedback: &str) -> Option<Self> {
        verdict_pattern()
            .captures(feedback)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

/// Build the line to narrate after the feedback stream completes
///
/// The extracted verdict wins; otherwise fall back to the first non-empty
/// line of the plain-text rendering, or a stock phrase when even that is
/// empty.
#[must_use]
pub fn narration_line(feedback_markdown: &str) -> String {
    if let Some(verdict) = Verdict::extract(feedback_markdown) {
        return format!("Performance level: {verdict}");
    }

    markdown::to_plain_text(feedback_markdown)
        .lines()
        .find(|line| !line.trim().is_empty())
        .map_or_else(|| "Feedback ready.".to_string(), ToString::to_string)
}
