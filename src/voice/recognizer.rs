//! Speech recognition
//!
//! The recognizer contract mirrors a browser-style recognition session:
//! incremental result events flagged interim or final, a terminal end
//! event, and error events with a reason. `UtteranceCollector` merges
//! those events into a single utterance; `WhisperRecognizer` transcribes
//! recorded audio over HTTP and emits one final result.

use async_trait::async_trait;

use crate::{Error, Result};

/// An event from a recognition session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// A recognition result fragment
    Result {
        /// Transcribed text for this fragment
        text: String,
        /// Whether the fragment is final (true) or interim (false)
        is_final: bool,
    },
    /// The recognition session ended
    End,
    /// Recognition failed with a reason code
    Error(String),
}

/// Transcribes recorded speech to text
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe one utterance of WAV audio, emitting recognition events
    ///
    /// Implementations always terminate the sequence with `End`, even
    /// after an `Error` event.
    ///
    /// # Errors
    ///
    /// Returns error if the transcription request cannot be made at all
    async fn transcribe(&self, audio: &[u8]) -> Result<Vec<RecognitionEvent>>;
}

/// Merges recognition events into a single utterance
///
/// Final fragments accumulate; interim fragments replace each other.
/// The snapshot at any moment is the accumulated finals plus the latest
/// interim, trimmed.
#[derive(Debug, Default)]
pub struct UtteranceCollector {
    finals: String,
    interim: String,
}

impl UtteranceCollector {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one recognition event
    pub fn push(&mut self, event: &RecognitionEvent) {
        if let RecognitionEvent::Result { text, is_final } = event {
            if *is_final {
                self.finals.push_str(text);
                self.finals.push(' ');
                self.interim.clear();
            } else {
                self.interim.clone_from(text);
            }
        }
    }

    /// Current best transcript: finals plus latest interim, trimmed
    #[must_use]
    pub fn snapshot(&self) -> String {
        format!("{}{}", self.finals, self.interim).trim().to_string()
    }

    /// Final transcript after the session ends (interims discarded)
    #[must_use]
    pub fn into_final(self) -> String {
        self.finals.trim().to_string()
    }

    /// Clear collected state for a fresh utterance
    pub fn reset(&mut self) {
        self.finals.clear();
        self.interim.clear();
    }
}

/// Response from the Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Recognizer backed by OpenAI Whisper over HTTP
///
/// Batch transcription cannot produce true interim results; each
/// utterance yields one final `Result` event followed by `End`.
#[derive(Debug)]
pub struct WhisperRecognizer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    language: String,
}

impl WhisperRecognizer {
    /// Create a recognizer
    ///
    /// `language` is a BCP-47 tag; only the primary subtag is sent to
    /// the API.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::CapabilityUnavailable(
                "speech recognition API key missing".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            language: language.into(),
        })
    }

    /// Primary language subtag for the transcription request
    fn language_subtag(&self) -> &str {
        self.language.split('-').next().unwrap_or(&self.language)
    }
}

#[async_trait]
impl SpeechToText for WhisperRecognizer {
    async fn transcribe(&self, audio: &[u8]) -> Result<Vec<RecognitionEvent>> {
        tracing::debug!(audio_bytes = audio.len(), "starting transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("answer.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Recognition(e.to_string()))?,
            )
            .text("model", self.model.clone())
            .text("language", self.language_subtag().to_string());

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "transcription request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Ok(vec![
                RecognitionEvent::Error(format!("transcription API error {status}")),
                RecognitionEvent::End,
            ]);
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse transcription response");
            e
        })?;

        tracing::info!(transcript = %result.text, "transcription complete");

        Ok(vec![
            RecognitionEvent::Result {
                text: result.text,
                is_final: true,
            },
            RecognitionEvent::End,
        ])
    }
}
