//! Daemon - the interactive interview session
//!
//! Drives the console loop: dispatches typed commands, records spoken
//! answers with energy-based endpointing, and exports transcripts.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::interview::Interview;
use crate::session::{HttpProvider, SessionConfig, SessionManager};
use crate::voice::{
    samples_to_wav, AudioCapture, Endpointer, Narrator, NullNarrator, RecognitionEvent,
    SpeechToText, UtteranceCollector, VoiceNarrator, WhisperRecognizer, SAMPLE_RATE,
};
use crate::{prompt, Config, Error, Result};

/// Poll interval for the capture buffer while recording
const CAPTURE_POLL_MS: u64 = 100;

/// In-progress voice recording
struct Recording {
    capture: AudioCapture,
    endpointer: Endpointer,
    samples: Vec<f32>,
}

/// The candor daemon - one interactive interview session
pub struct Daemon {
    config: Config,
    interview: Interview,
    recognizer: Option<Arc<WhisperRecognizer>>,
    recording: Option<Recording>,
}

impl Daemon {
    /// Create a new daemon instance
    ///
    /// # Errors
    ///
    /// Returns error if voice components fail to initialize
    pub fn new(config: Config) -> Result<Self> {
        let api_key = config.generation.api_key.clone().unwrap_or_default();

        let narrator: Arc<dyn Narrator> = if config.voice.enabled {
            match VoiceNarrator::new(
                &config.generation.base_url,
                &api_key,
                &config.voice.tts_model,
                &config.voice.tts_voice,
                config.voice.tts_speed,
            ) {
                Ok(narrator) => Arc::new(narrator),
                Err(e) => {
                    tracing::warn!(error = %e, "narration unavailable, questions will be text-only");
                    Arc::new(NullNarrator)
                }
            }
        } else {
            Arc::new(NullNarrator)
        };

        let recognizer = if config.voice.enabled {
            match WhisperRecognizer::new(
                &config.generation.base_url,
                &api_key,
                &config.voice.stt_model,
                &config.voice.language,
            ) {
                Ok(recognizer) => Some(Arc::new(recognizer)),
                Err(e) => {
                    tracing::warn!(error = %e, "speech recognition unavailable, answers must be typed");
                    None
                }
            }
        } else {
            None
        };

        let session_config = SessionConfig {
            system_prompt: prompt::system_prompt(&config.role),
            temperature: config.generation.temperature,
            top_k: config.generation.top_k,
            language: config.role.recognition_language(),
        };
        let provider = Arc::new(HttpProvider::new(config.generation.clone()));
        let sessions = SessionManager::new(provider, session_config);
        let interview = Interview::new(config.role.clone(), sessions, narrator);

        Ok(Self {
            config,
            interview,
            recognizer,
            recording: None,
        })
    }

    /// Run the daemon until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if console input fails
    pub async fn run(mut self) -> Result<()> {
        tracing::info!(role = self.config.role.title(), "interview session ready");

        println!("Mock interview: {}", self.config.role.title());
        println!("Type 'start' to begin, 'help' for commands.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Ok(Some(line)) = line else {
                        break;
                    };
                    if !self.handle_command(line.trim()).await {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown requested");
                    break;
                }
                () = tokio::time::sleep(Duration::from_millis(CAPTURE_POLL_MS)),
                        if self.recording.is_some() => {
                    if let Err(e) = self.poll_recording().await {
                        tracing::error!(error = %e, "voice answer failed");
                        println!("Could not process the answer: {e}");
                    }
                }
            }
        }

        if let Some(mut recording) = self.recording.take() {
            recording.capture.stop();
        }
        Ok(())
    }

    /// Dispatch one console command; returns false to quit
    async fn handle_command(&mut self, line: &str) -> bool {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((head, tail)) => (head, tail.trim()),
            None => (line, ""),
        };

        let outcome = match command {
            "" => Ok(()),
            "start" => self.cmd_start().await,
            "answer" => self.cmd_answer(rest).await,
            "listen" => self.cmd_listen(),
            "stop" => self.cmd_stop().await,
            "finish" => self.cmd_finish().await,
            "reset" => self.cmd_reset().await,
            "export" => self.cmd_export(),
            "help" => {
                print_help();
                Ok(())
            }
            "quit" | "exit" => return false,
            other => {
                println!("Unknown command '{other}'. Type 'help' for commands.");
                Ok(())
            }
        };

        // Command failures are transient; the session keeps running
        if let Err(e) = outcome {
            tracing::warn!(command, error = %e, "command failed");
            println!("{e}");
        }
        true
    }

    async fn cmd_start(&mut self) -> Result<()> {
        let question = self.interview.start().await?;
        println!("\nInterviewer: {question}\n");
        Ok(())
    }

    async fn cmd_answer(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            println!("Usage: answer <your answer>");
            return Ok(());
        }
        let question = self.interview.submit_answer(text).await?;
        println!("\nInterviewer: {question}\n");
        Ok(())
    }

    fn cmd_listen(&mut self) -> Result<()> {
        if self.recognizer.is_none() {
            return Err(Error::CapabilityUnavailable(
                "speech recognition is not available, type your answer with 'answer'".to_string(),
            ));
        }
        if self.recording.is_some() {
            println!("Already listening.");
            return Ok(());
        }

        // The interviewer's voice must not bleed into the recording
        self.interview.cancel_narration();

        let mut capture = AudioCapture::new()?;
        capture.start()?;
        self.recording = Some(Recording {
            capture,
            endpointer: Endpointer::new(),
            samples: Vec::new(),
        });

        println!("Listening... speak your answer, then pause (or type 'stop').");
        Ok(())
    }

    async fn cmd_stop(&mut self) -> Result<()> {
        if self.recording.is_none() {
            println!("Not listening.");
            return Ok(());
        }
        self.finalize_recording().await
    }

    async fn cmd_finish(&mut self) -> Result<()> {
        let feedback = self.interview.finish().await?;
        println!("\n--- Feedback ---\n{}\n", feedback.raw);
        match feedback.verdict {
            Some(verdict) => println!("Performance level: {verdict}"),
            None => tracing::warn!("feedback contained no performance level"),
        }
        Ok(())
    }

    async fn cmd_reset(&mut self) -> Result<()> {
        if let Some(mut recording) = self.recording.take() {
            recording.capture.stop();
        }
        let question = self.interview.reset().await?;
        println!("\nInterview restarted.\n\nInterviewer: {question}\n");
        Ok(())
    }

    fn cmd_export(&mut self) -> Result<()> {
        let log = self.interview.transcript();
        if log.is_empty() {
            return Err(Error::EmptyTranscript);
        }

        let path = self.export_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, log.to_json()?)?;

        tracing::info!(path = %path.display(), turns = log.len(), "transcript exported");
        println!("Transcript written to {}", path.display());
        Ok(())
    }

    fn export_path(&self) -> PathBuf {
        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
        self.config
            .data_dir
            .join(format!("transcript-{}-{stamp}.json", self.config.role.id()))
    }

    /// Drain the capture buffer and submit the answer once speech ends
    async fn poll_recording(&mut self) -> Result<()> {
        let Some(recording) = self.recording.as_mut() else {
            return Ok(());
        };

        let chunk = recording.capture.take_buffer();
        if !chunk.is_empty() {
            recording.endpointer.feed(&chunk);
            recording.samples.extend_from_slice(&chunk);
        }
        let complete = recording.endpointer.is_complete();

        if complete {
            self.finalize_recording().await?;
        }
        Ok(())
    }

    /// Stop capture, transcribe, and hand the answer to the interview
    async fn finalize_recording(&mut self) -> Result<()> {
        let Some(mut recording) = self.recording.take() else {
            return Ok(());
        };
        recording.capture.stop();
        recording.samples.extend(recording.capture.take_buffer());

        if !recording.endpointer.heard_speech() {
            println!("No speech detected. Still waiting for your answer.");
            return Ok(());
        }

        let recognizer = self
            .recognizer
            .as_ref()
            .ok_or_else(|| {
                Error::CapabilityUnavailable("speech recognition is not available".to_string())
            })?
            .clone();

        let wav = samples_to_wav(&recording.samples, SAMPLE_RATE)?;
        let events = recognizer.transcribe(&wav).await?;

        let (answer, errors) = merge_recognition_events(&events);
        for reason in &errors {
            tracing::warn!(reason = %reason, "recognition error");
            println!("Recognition error: {reason}");
        }
        if answer.is_empty() {
            println!("Could not make out an answer. Still waiting.");
            return Ok(());
        }

        println!("You: {answer}");
        let question = self.interview.submit_answer(&answer).await?;
        println!("\nInterviewer: {question}\n");
        Ok(())
    }
}

/// Merge recognition events into an answer, separating out error reasons
///
/// The answer is the collector snapshot: accumulated finals plus the
/// latest interim, so an utterance ending mid-fragment still counts.
fn merge_recognition_events(events: &[RecognitionEvent]) -> (String, Vec<String>) {
    let mut collector = UtteranceCollector::new();
    let mut errors = Vec::new();

    for event in events {
        match event {
            RecognitionEvent::Error(reason) => errors.push(reason.clone()),
            _ => collector.push(event),
        }
    }

    (collector.snapshot(), errors)
}

fn print_help() {
    println!("Commands:");
    println!("  start            begin the interview");
    println!("  answer <text>    submit a typed answer");
    println!("  listen           record a spoken answer (ends on silence)");
    println!("  stop             stop recording and submit what was heard");
    println!("  finish           end the interview and get feedback");
    println!("  reset            discard everything and start over");
    println!("  export           write the transcript JSON to the data directory");
    println!("  quit             leave");
}
