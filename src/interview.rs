//! Interview turn controller
//!
//! Drives the question → listen → answer → next-question loop and the
//! final feedback pass, coordinating the transcript log, the session
//! manager, and the streaming assembler.

use std::sync::Arc;

use futures::StreamExt;

use crate::assembler::StreamAssembler;
use crate::prompt;
use crate::role::JobRole;
use crate::session::SessionManager;
use crate::transcript::TranscriptLog;
use crate::verdict::{self, Verdict};
use crate::voice::Narrator;
use crate::{markdown, Error, Result};

/// Where the interview currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No interview in progress
    Idle,
    /// A question stream is in progress
    AwaitingQuestion,
    /// Waiting for the candidate's spoken answer
    AwaitingAnswer,
    /// The feedback stream is in progress
    AwaitingFeedback,
}

/// Result of the final feedback pass
#[derive(Debug, Clone)]
pub struct Feedback {
    /// Raw (possibly markdown) feedback text
    pub raw: String,

    /// Extracted performance verdict, if the model followed instructions
    pub verdict: Option<Verdict>,

    /// The line that was narrated
    pub narration: String,
}

/// The interview state machine
///
/// All state lives here: the transcript, the previous question used for
/// answer-independent question generation, and the single-flight guard
/// that makes the one-generation-call-at-a-time invariant explicit
/// instead of relying on the front end to serialize commands.
pub struct Interview {
    role: JobRole,
    sessions: SessionManager,
    narrator: Arc<dyn Narrator>,
    log: TranscriptLog,
    previous_question: String,
    phase: Phase,
    in_flight: bool,
}

impl Interview {
    /// Create an idle interview for a role
    #[must_use]
    pub fn new(role: JobRole, sessions: SessionManager, narrator: Arc<dyn Narrator>) -> Self {
        Self {
            role,
            sessions,
            narrator,
            log: TranscriptLog::new(),
            previous_question: String::new(),
            phase: Phase::Idle,
            in_flight: false,
        }
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The transcript recorded so far
    #[must_use]
    pub fn transcript(&self) -> &TranscriptLog {
        &self.log
    }

    /// The most recent question, as plain text
    #[must_use]
    pub fn previous_question(&self) -> &str {
        &self.previous_question
    }

    /// The job role being interviewed for
    #[must_use]
    pub fn role(&self) -> &JobRole {
        &self.role
    }

    /// Cancel any narration in progress
    ///
    /// Called before listening starts so the interviewer's voice does not
    /// bleed into the candidate's recording.
    pub fn cancel_narration(&self) {
        self.narrator.cancel();
    }

    /// Begin the interview with the opening question
    ///
    /// # Errors
    ///
    /// Returns error if the generation capability is unavailable or the
    /// stream fails; the controller stays retryable.
    pub async fn start(&mut self) -> Result<String> {
        let prompt = prompt::starter_prompt(&self.role);
        self.ask_question(&prompt).await
    }

    /// Record the candidate's answer and ask the next question
    ///
    /// The next-question prompt is built from the previous question and
    /// the job description only; the answer never feeds back into
    /// question generation.
    ///
    /// # Errors
    ///
    /// Returns error on empty answer text or a failed question stream.
    pub async fn submit_answer(&mut self, answer: &str) -> Result<String> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(Error::Recognition("empty answer text".to_string()));
        }

        self.log.attach_answer(answer);
        tracing::info!(answer_len = answer.len(), "answer recorded");

        let prompt = prompt::next_question_prompt(&self.role, &self.previous_question);
        self.ask_question(&prompt).await
    }

    /// End the interview and request structured feedback
    ///
    /// # Errors
    ///
    /// Returns `EmptyTranscript` when no turns were recorded (no state
    /// change), or a stream error.
    pub async fn finish(&mut self) -> Result<Feedback> {
        if self.log.is_empty() {
            return Err(Error::EmptyTranscript);
        }

        self.narrator.cancel();
        self.phase = Phase::AwaitingFeedback;

        let prompt = prompt::feedback_prompt(&self.role, &self.log);
        let raw = self.stream_prompt(&prompt).await?;

        let feedback_verdict = Verdict::extract(&raw);
        let narration = verdict::narration_line(&raw);
        tracing::info!(verdict = ?feedback_verdict, "feedback complete");
        self.narrator.speak(&narration);

        self.phase = Phase::Idle;
        Ok(Feedback {
            raw,
            verdict: feedback_verdict,
            narration,
        })
    }

    /// Abandon the current interview and start over
    ///
    /// Cancels narration, clears the transcript, destroys the session,
    /// then replays the opening question. Reachable from any phase.
    ///
    /// # Errors
    ///
    /// Returns error if the fresh opening question cannot be generated.
    pub async fn reset(&mut self) -> Result<String> {
        tracing::info!("interview reset");
        self.narrator.cancel();
        self.log.clear();
        self.previous_question.clear();
        self.sessions.destroy();
        self.phase = Phase::Idle;

        self.start().await
    }

    /// Stream one question, log it, and narrate it
    async fn ask_question(&mut self, prompt: &str) -> Result<String> {
        self.phase = Phase::AwaitingQuestion;

        let raw = self.stream_prompt(prompt).await?;
        let question = markdown::to_plain_text(&raw).trim().to_string();
        if question.is_empty() {
            tracing::warn!("question stream produced no text");
        }

        self.previous_question.clone_from(&question);
        self.log.append(&question);
        self.narrator.speak(&question);

        self.phase = Phase::AwaitingAnswer;
        Ok(question)
    }

    /// Run one streamed generation call under the single-flight guard
    async fn stream_prompt(&mut self, prompt: &str) -> Result<String> {
        if self.in_flight {
            return Err(Error::Busy);
        }

        self.in_flight = true;
        let result = self.stream_prompt_inner(prompt).await;
        self.in_flight = false;
        result
    }

    async fn stream_prompt_inner(&mut self, prompt: &str) -> Result<String> {
        let session = self.sessions.ensure().await?;

        let mut assembler = StreamAssembler::with_mode(session.chunk_mode());
        let mut stream = session.prompt_streaming(prompt).await?;

        while let Some(chunk) = stream.next().await {
            assembler.push(&chunk?);
        }

        let result = assembler.finish();
        tracing::debug!(result_len = result.len(), "stream complete");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{
        ChunkStream, LanguageModelProvider, LanguageModelSession, SessionConfig,
    };
    use async_trait::async_trait;

    struct SilentNarrator;

    impl Narrator for SilentNarrator {
        fn speak(&self, _text: &str) {}
        fn cancel(&self) {}
    }

    struct EchoSession;

    #[async_trait]
    impl LanguageModelSession for EchoSession {
        async fn prompt_streaming(&self, _prompt: &str) -> Result<ChunkStream> {
            let chunks = vec![Ok("Intro".to_string()), Ok("Introduce yourself".to_string())];
            Ok(Box::pin(futures::stream::iter(chunks)))
        }
    }

    struct EchoProvider;

    #[async_trait]
    impl LanguageModelProvider for EchoProvider {
        fn is_available(&self) -> bool {
            true
        }

        async fn create(&self, _config: &SessionConfig) -> Result<Box<dyn LanguageModelSession>> {
            Ok(Box::new(EchoSession))
        }
    }

    fn test_interview() -> Interview {
        let role = serde_json::from_str(
            r#"{"id": "qa", "title": "QA Engineer", "description": "Break software."}"#,
        )
        .unwrap();
        let config = SessionConfig {
            system_prompt: "sys".to_string(),
            temperature: 0.3,
            top_k: 3,
            language: "en".to_string(),
        };
        let sessions = SessionManager::new(std::sync::Arc::new(EchoProvider), config);
        Interview::new(role, sessions, Arc::new(SilentNarrator))
    }

    #[tokio::test]
    async fn start_logs_question_and_awaits_answer() {
        let mut interview = test_interview();
        assert_eq!(interview.phase(), Phase::Idle);

        let question = interview.start().await.unwrap();
        assert_eq!(question, "Introduce yourself");
        assert_eq!(interview.phase(), Phase::AwaitingAnswer);
        assert_eq!(interview.transcript().len(), 1);
        assert_eq!(interview.previous_question(), "Introduce yourself");
    }

    #[tokio::test]
    async fn finish_on_empty_log_is_an_error_without_state_change() {
        let mut interview = test_interview();
        let err = interview.finish().await.unwrap_err();
        assert!(matches!(err, Error::EmptyTranscript));
        assert_eq!(interview.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn empty_answer_is_rejected() {
        let mut interview = test_interview();
        interview.start().await.unwrap();

        let err = interview.submit_answer("   ").await.unwrap_err();
        assert!(matches!(err, Error::Recognition(_)));
        assert!(!interview.transcript().turns()[0].is_answered());
    }

    #[tokio::test]
    async fn reset_clears_state_and_restarts() {
        let mut interview = test_interview();
        interview.start().await.unwrap();
        interview.submit_answer("my answer").await.unwrap();
        assert_eq!(interview.transcript().len(), 2);

        interview.reset().await.unwrap();
        assert_eq!(interview.transcript().len(), 1);
        assert!(!interview.transcript().turns()[0].is_answered());
        assert_eq!(interview.phase(), Phase::AwaitingAnswer);
    }
}
