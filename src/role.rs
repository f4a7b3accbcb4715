//! Job role profiles
//!
//! A role describes the position being interviewed for: the title and
//! description that every prompt embeds, plus optional voice overrides.

use serde::{Deserialize, Serialize};

/// A job role profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRole {
    /// Role identifier (e.g. "ai-scientist")
    pub id: String,

    /// Job title shown to the model (e.g. "AI Scientist")
    pub title: String,

    /// Full job description embedded in every prompt
    pub description: String,

    /// Output language tag (BCP-47, e.g. "en")
    #[serde(default = "default_language")]
    pub language: String,

    /// Voice overrides for narration
    #[serde(default)]
    pub voice: RoleVoice,
}

/// Per-role voice settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleVoice {
    /// TTS voice identifier
    #[serde(default = "default_tts_voice")]
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    #[serde(default = "default_tts_speed")]
    pub tts_speed: f64,
}

impl Default for RoleVoice {
    fn default() -> Self {
        Self {
            tts_voice: default_tts_voice(),
            tts_speed: default_tts_speed(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_tts_voice() -> String {
    "alloy".to_string()
}

const fn default_tts_speed() -> f64 {
    1.0
}

impl JobRole {
    /// Role identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Job title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Job description, with surrounding whitespace stripped
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.trim()
    }

    /// Speech recognition language tag for this role (e.g. "en-US")
    ///
    /// Bare language codes get a region default so STT APIs that require
    /// a full tag still work.
    #[must_use]
    pub fn recognition_language(&self) -> String {
        if self.language.contains('-') {
            self.language.clone()
        } else {
            format!("{}-US", self.language)
        }
    }
}
