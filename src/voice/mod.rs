//! Voice pipeline: microphone capture, speech recognition, narration

pub mod capture;
pub mod narrator;
pub mod playback;
pub mod recognizer;

pub use capture::{samples_to_wav, AudioCapture, Endpointer, SAMPLE_RATE};
pub use narrator::{Narrator, NullNarrator, VoiceNarrator};
pub use playback::AudioPlayback;
pub use recognizer::{
    RecognitionEvent, SpeechToText, UtteranceCollector, WhisperRecognizer,
};
