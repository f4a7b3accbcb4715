//! Candor - voice-driven mock interview simulator
//!
//! This library provides the core functionality for candor:
//! - Interview turn control (question, answer, feedback phases)
//! - Streaming response assembly from an LLM backend
//! - Voice processing (capture, endpointing, STT, narration)
//! - Job role profiles and transcript export
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     Console                          │
//! │   start  │  answer  │  listen  │  finish  │  reset  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Interview                          │
//! │   Transcript  │  Prompts  │  Assembler  │  Verdict  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              Capability backends                     │
//! │   LLM (streaming)  │  Whisper STT  │  TTS playback  │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod assembler;
pub mod config;
pub mod daemon;
pub mod error;
pub mod interview;
pub mod markdown;
pub mod prompt;
pub mod role;
pub mod session;
pub mod transcript;
pub mod verdict;
pub mod voice;

pub use assembler::{ChunkMode, StreamAssembler};
pub use config::{Config, GenerationConfig, VoiceConfig};
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use interview::{Feedback, Interview, Phase};
pub use role::{JobRole, RoleVoice};
pub use session::{
    ChunkStream, LanguageModelProvider, LanguageModelSession, SessionConfig, SessionManager,
};
pub use transcript::{TranscriptLog, Turn};
pub use verdict::Verdict;
