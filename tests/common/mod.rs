//! Shared test utilities

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use candor::assembler::ChunkMode;
use candor::voice::Narrator;
use candor::{
    ChunkStream, Interview, JobRole, LanguageModelProvider, LanguageModelSession, Result,
    SessionConfig, SessionManager,
};

/// Provider that replays scripted chunk sequences, one per generation call
///
/// Each scripted chunk is `Ok` text or an `Err` reason surfaced as a
/// mid-stream `Error::Stream` item.
pub struct ScriptedProvider {
    responses: Arc<Mutex<VecDeque<Vec<std::result::Result<String, String>>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    available: bool,
}

impl ScriptedProvider {
    #[must_use]
    pub fn new(responses: &[&[&str]]) -> Self {
        let scripted: Vec<Vec<std::result::Result<&str, &str>>> = responses
            .iter()
            .map(|chunks| chunks.iter().map(|c| Ok(*c)).collect())
            .collect();
        Self::with_results(&scripted.iter().map(Vec::as_slice).collect::<Vec<_>>())
    }

    /// Script streams that can fail mid-flight
    #[must_use]
    pub fn with_results(responses: &[&[std::result::Result<&str, &str>]]) -> Self {
        let queue = responses
            .iter()
            .map(|chunks| {
                chunks
                    .iter()
                    .map(|c| c.map(ToString::to_string).map_err(ToString::to_string))
                    .collect()
            })
            .collect();
        Self {
            responses: Arc::new(Mutex::new(queue)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            available: true,
        }
    }

    /// Provider with no backing capability
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            available: false,
        }
    }

    /// Every prompt sent to a session so far, in order
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

struct ScriptedSession {
    responses: Arc<Mutex<VecDeque<Vec<std::result::Result<String, String>>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl LanguageModelSession for ScriptedSession {
    async fn prompt_streaming(&self, prompt: &str) -> Result<ChunkStream> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let chunks = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();
        let items: Vec<Result<String>> = chunks
            .into_iter()
            .map(|c| c.map_err(candor::Error::Stream))
            .collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }

    fn chunk_mode(&self) -> ChunkMode {
        ChunkMode::Incremental
    }
}

#[async_trait]
impl LanguageModelProvider for ScriptedProvider {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn create(&self, _config: &SessionConfig) -> Result<Box<dyn LanguageModelSession>> {
        Ok(Box::new(ScriptedSession {
            responses: Arc::clone(&self.responses),
            prompts: Arc::clone(&self.prompts),
        }))
    }
}

/// Narrator that records everything instead of playing audio
#[derive(Default)]
pub struct RecordingNarrator {
    spoken: Mutex<Vec<String>>,
    cancels: Mutex<usize>,
}

impl RecordingNarrator {
    #[must_use]
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    #[must_use]
    pub fn cancel_count(&self) -> usize {
        *self.cancels.lock().unwrap()
    }
}

impl Narrator for RecordingNarrator {
    fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }

    fn cancel(&self) {
        *self.cancels.lock().unwrap() += 1;
    }
}

/// Build an interview over a scripted provider and recording narrator
#[must_use]
pub fn scripted_interview(
    responses: &[&[&str]],
) -> (Interview, Arc<ScriptedProvider>, Arc<RecordingNarrator>) {
    let provider = Arc::new(ScriptedProvider::new(responses));
    let narrator = Arc::new(RecordingNarrator::default());
    let interview = build_interview(Arc::clone(&provider), Arc::clone(&narrator));
    (interview, provider, narrator)
}

/// Build an interview over an arbitrary provider
#[must_use]
pub fn build_interview(
    provider: Arc<ScriptedProvider>,
    narrator: Arc<RecordingNarrator>,
) -> Interview {
    let role = test_role();
    let config = SessionConfig {
        system_prompt: "You are conducting a mock job interview.".to_string(),
        temperature: 0.3,
        top_k: 3,
        language: role.recognition_language(),
    };
    let sessions = SessionManager::new(provider, config);
    Interview::new(role, sessions, narrator)
}

/// A small role profile for tests
#[must_use]
pub fn test_role() -> JobRole {
    serde_json::from_str(
        r#"{
            "id": "ai-scientist",
            "title": "AI Scientist",
            "description": "Research and build machine learning systems."
        }"#,
    )
    .expect("test role parses")
}
