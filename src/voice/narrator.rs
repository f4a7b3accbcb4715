//! Speech narration
//!
//! Questions and the feedback verdict are narrated out loud. Narration is
//! fire-and-forget: each `speak` supersedes any narration still playing,
//! matching the cancel-then-speak behavior of browser speech synthesis.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::voice::playback::AudioPlayback;
use crate::{Error, Result};

/// Narrates text out loud
pub trait Narrator: Send + Sync {
    /// Start narrating, cancelling any narration in progress
    fn speak(&self, text: &str);

    /// Cancel any narration in progress
    fn cancel(&self);
}

/// Narrator that discards everything (voice-disabled sessions)
pub struct NullNarrator;

impl Narrator for NullNarrator {
    fn speak(&self, _text: &str) {}
    fn cancel(&self) {}
}

/// Narrator backed by an HTTP TTS API and local playback
#[derive(Debug)]
pub struct VoiceNarrator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    voice: String,
    speed: f64,
    /// Cancel flag of the narration currently in flight
    current: Mutex<Arc<AtomicBool>>,
}

impl VoiceNarrator {
    /// Create a narrator
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        voice: impl Into<String>,
        speed: f64,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::CapabilityUnavailable(
                "speech synthesis API key missing".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            voice: voice.into(),
            speed,
            current: Mutex::new(Arc::new(AtomicBool::new(false))),
        })
    }

    /// Synthesize text once and return the MP3 bytes without playing them
    ///
    /// # Errors
    ///
    /// Returns error if the synthesis call fails
    pub async fn synthesize_once(&self, text: &str) -> Result<Vec<u8>> {
        let url = format!("{}/audio/speech", self.base_url);
        synthesize(
            &self.client,
            &url,
            &self.api_key,
            &self.model,
            &self.voice,
            self.speed,
            text,
        )
        .await
    }

    /// Raise the active cancel flag and install a fresh one
    fn supersede(&self) -> Arc<AtomicBool> {
        let fresh = Arc::new(AtomicBool::new(false));
        if let Ok(mut guard) = self.current.lock() {
            guard.store(true, Ordering::Relaxed);
            *guard = Arc::clone(&fresh);
        }
        fresh
    }
}

impl Narrator for VoiceNarrator {
    fn speak(&self, text: &str) {
        let cancel = self.supersede();

        let text = text.trim().to_string();
        if text.is_empty() {
            return;
        }

        let client = self.client.clone();
        let url = format!("{}/audio/speech", self.base_url);
        let api_key = self.api_key.clone();
        let model = self.model.clone();
        let voice = self.voice.clone();
        let speed = self.speed;

        tokio::spawn(async move {
            let audio =
                match synthesize(&client, &url, &api_key, &model, &voice, speed, &text).await {
                    Ok(audio) => audio,
                    Err(e) => {
                        tracing::warn!(error = %e, "narration synthesis failed");
                        return;
                    }
                };

            if cancel.load(Ordering::Relaxed) {
                return;
            }

            let played = tokio::task::spawn_blocking(move || {
                let playback = AudioPlayback::new()?;
                playback.play_mp3(&audio, &cancel)
            })
            .await;

            match played {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "narration playback failed"),
                Err(e) => tracing::warn!(error = %e, "narration task failed"),
            }
        });
    }

    fn cancel(&self) {
        if let Ok(guard) = self.current.lock() {
            guard.store(true, Ordering::Relaxed);
        }
    }
}

/// Request body for an OpenAI-compatible speech synthesis call
#[derive(Serialize)]
struct TtsRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f64,
}

/// Synthesize text to MP3 bytes
async fn synthesize(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    model: &str,
    voice: &str,
    speed: f64,
    text: &str,
) -> Result<Vec<u8>> {
    let request = TtsRequest {
        model,
        input: text,
        voice,
        speed,
    };

    let response = client
        .post(url)
        .bearer_auth(api_key)
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Narration(format!("TTS API error {status}: {body}")));
    }

    let audio = response.bytes().await?;
    tracing::debug!(audio_bytes = audio.len(), "speech synthesized");
    Ok(audio.to_vec())
}
