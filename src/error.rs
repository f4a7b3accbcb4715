//! Error types for the interview simulator

use thiserror::Error;

/// Result type alias for candor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running an interview
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Job role profile not found
    #[error("role not found: {0}")]
    RoleNotFound(String),

    /// A capability (generation, recognition) is missing from the environment
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// Generation stream failed mid-flight
    #[error("streaming error: {0}")]
    Stream(String),

    /// Speech recognition error
    #[error("recognition error: {0}")]
    Recognition(String),

    /// Speech narration error
    #[error("narration error: {0}")]
    Narration(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// A generation call is already in flight
    #[error("a generation call is already in flight")]
    Busy,

    /// Finish requested before any turn was recorded
    #[error("no interview turns recorded yet")]
    EmptyTranscript,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
