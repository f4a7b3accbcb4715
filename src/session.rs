//! Generation session lifecycle
//!
//! The interview holds at most one generation session at a time, created
//! lazily with fixed sampling configuration and destroyed on reset. The
//! backend sits behind a trait seam so tests can script streams and a
//! different provider can slot in without touching the controller.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::assembler::ChunkMode;
use crate::config::GenerationConfig;
use crate::{Error, Result};

/// Stream of raw text chunks from one generation call
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Fixed per-interview session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// System instruction describing the interviewer persona
    pub system_prompt: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Top-k sampling cutoff
    pub top_k: u32,

    /// Output language tag
    pub language: String,
}

/// A live generation session
#[async_trait]
pub trait LanguageModelSession: Send + Sync {
    /// Send a prompt and receive the response as a chunk stream
    ///
    /// # Errors
    ///
    /// Returns error if the call cannot be started; mid-stream failures
    /// surface as `Err` items on the stream.
    async fn prompt_streaming(&self, prompt: &str) -> Result<ChunkStream>;

    /// The chunk-delivery convention this backend follows
    fn chunk_mode(&self) -> ChunkMode {
        ChunkMode::Auto
    }
}

impl std::fmt::Debug for dyn LanguageModelSession + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn LanguageModelSession")
    }
}

/// Factory for generation sessions
#[async_trait]
pub trait LanguageModelProvider: Send + Sync {
    /// Whether the generation capability is present in this environment
    fn is_available(&self) -> bool;

    /// Create a new session with fixed configuration
    ///
    /// # Errors
    ///
    /// Returns error if session creation fails
    async fn create(&self, config: &SessionConfig) -> Result<Box<dyn LanguageModelSession>>;
}

/// Owns the single live session: lazy creation, explicit teardown
pub struct SessionManager {
    provider: Arc<dyn LanguageModelProvider>,
    config: SessionConfig,
    session: Option<Box<dyn LanguageModelSession>>,
}

impl SessionManager {
    /// Create a manager with no live session
    #[must_use]
    pub fn new(provider: Arc<dyn LanguageModelProvider>, config: SessionConfig) -> Self {
        Self {
            provider,
            config,
            session: None,
        }
    }

    /// Return the live session, creating one lazily if needed
    ///
    /// # Errors
    ///
    /// Returns `CapabilityUnavailable` if the environment lacks the
    /// generation capability, or the provider's error if creation fails.
    pub async fn ensure(&mut self) -> Result<&dyn LanguageModelSession> {
        if !self.provider.is_available() {
            return Err(Error::CapabilityUnavailable(
                "generation API not configured".to_string(),
            ));
        }

        if self.session.is_none() {
            let session = self.provider.create(&self.config).await?;
            tracing::info!("generation session created");
            self.session = Some(session);
        }

        Ok(self
            .session
            .as_deref()
            .expect("session exists after creation"))
    }

    /// Destroy the live session, if any
    ///
    /// Safe to call when no session exists; the next `ensure` recreates
    /// one lazily.
    pub fn destroy(&mut self) {
        if self.session.take().is_some() {
            tracing::info!("generation session destroyed");
        }
    }

    /// Whether a session is currently live
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }
}

/// Request body for an OpenAI-compatible streaming chat completion
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// One SSE event from a streaming chat completion
#[derive(Deserialize)]
struct ChatChunk {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    delta: ChatDelta,
}

#[derive(Deserialize, Default)]
struct ChatDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Generation provider backed by an OpenAI-compatible HTTP API
pub struct HttpProvider {
    client: reqwest::Client,
    config: GenerationConfig,
}

impl HttpProvider {
    /// Create a provider from generation configuration
    #[must_use]
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl LanguageModelProvider for HttpProvider {
    fn is_available(&self) -> bool {
        self.config.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    async fn create(&self, config: &SessionConfig) -> Result<Box<dyn LanguageModelSession>> {
        let api_key = self
            .config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::CapabilityUnavailable("generation API key missing".to_string())
            })?;

        let session = HttpSession {
            id: uuid::Uuid::new_v4().to_string(),
            client: self.client.clone(),
            base_url: self.config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: self.config.model.clone(),
            config: config.clone(),
        };

        tracing::debug!(
            session_id = %session.id,
            model = %session.model,
            temperature = config.temperature,
            top_k = config.top_k,
            language = %config.language,
            "http session configured"
        );

        Ok(Box::new(session))
    }
}

/// A session bound to one chat endpoint with fixed sampling parameters
struct HttpSession {
    id: String,
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    config: SessionConfig,
}

#[async_trait]
impl LanguageModelSession for HttpSession {
    async fn prompt_streaming(&self, prompt: &str) -> Result<ChunkStream> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.config.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: true,
            temperature: self.config.temperature,
            top_k: Some(self.config.top_k),
        };

        tracing::debug!(session_id = %self.id, prompt_len = prompt.len(), "starting stream");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat API error");
            return Err(Error::Stream(format!("chat API error {status}: {body}")));
        }

        let (tx, rx) = mpsc::channel::<Result<String>>(32);
        tokio::spawn(pump_sse(response, tx));

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    fn chunk_mode(&self) -> ChunkMode {
        // Chat-completions deltas are true increments
        ChunkMode::Incremental
    }
}

/// Forward SSE `data:` payloads from the response body as text chunks
async fn pump_sse(response: reqwest::Response, tx: mpsc::Sender<Result<String>>) {
    let mut body = response.bytes_stream();
    let mut buf: Vec<u8> = Vec::new();

    while let Some(item) = body.next().await {
        let bytes = match item {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tx.send(Err(Error::Http(e))).await;
                return;
            }
        };
        buf.extend_from_slice(&bytes);

        while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end();

            let Some(data) = line.strip_prefix("data: ") else {
                continue;
            };
            if data == "[DONE]" {
                return;
            }

            match serde_json::from_str::<ChatChunk>(data) {
                Ok(event) => {
                    let delta = event
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta.content);
                    if let Some(text) = delta {
                        if tx.send(Ok(text)).await.is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    let _ = tx
                        .send(Err(Error::Stream(format!("malformed stream event: {e}"))))
                        .await;
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeSession;

    #[async_trait]
    impl LanguageModelSession for FakeSession {
        async fn prompt_streaming(&self, _prompt: &str) -> Result<ChunkStream> {
            Ok(Box::pin(futures::stream::empty()))
        }
    }

    struct FakeProvider {
        available: bool,
        created: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl LanguageModelProvider for FakeProvider {
        fn is_available(&self) -> bool {
            self.available
        }

        async fn create(&self, _config: &SessionConfig) -> Result<Box<dyn LanguageModelSession>> {
            self.created
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(Box::new(FakeSession))
        }
    }

    fn test_config() -> SessionConfig {
        SessionConfig {
            system_prompt: "You are an interviewer.".to_string(),
            temperature: 0.3,
            top_k: 3,
            language: "en".to_string(),
        }
    }

    #[tokio::test]
    async fn ensure_creates_exactly_one_session() {
        let provider = Arc::new(FakeProvider {
            available: true,
            created: std::sync::atomic::AtomicUsize::new(0),
        });
        let mut manager = SessionManager::new(Arc::clone(&provider) as _, test_config());

        manager.ensure().await.unwrap();
        manager.ensure().await.unwrap();

        assert!(manager.has_session());
        assert_eq!(provider.created.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ensure_fails_when_capability_missing() {
        let provider = Arc::new(FakeProvider {
            available: false,
            created: std::sync::atomic::AtomicUsize::new(0),
        });
        let mut manager = SessionManager::new(provider, test_config());

        let err = manager.ensure().await.unwrap_err();
        assert!(matches!(err, Error::CapabilityUnavailable(_)));
        assert!(!manager.has_session());
    }

    #[tokio::test]
    async fn destroy_then_ensure_recreates_lazily() {
        let provider = Arc::new(FakeProvider {
            available: true,
            created: std::sync::atomic::AtomicUsize::new(0),
        });
        let mut manager = SessionManager::new(Arc::clone(&provider) as _, test_config());

        manager.ensure().await.unwrap();
        manager.destroy();
        assert!(!manager.has_session());

        // destroy with no session is a no-op
        manager.destroy();

        manager.ensure().await.unwrap();
        assert_eq!(provider.created.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn http_provider_availability_tracks_api_key() {
        let mut config = GenerationConfig {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            top_k: 3,
        };
        assert!(!HttpProvider::new(config.clone()).is_available());

        config.api_key = Some(String::new());
        assert!(!HttpProvider::new(config.clone()).is_available());

        config.api_key = Some("sk-test".to_string());
        assert!(HttpProvider::new(config).is_available());
    }
}
