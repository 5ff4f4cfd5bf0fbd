//! Text-to-speech collaborators and the playback queue.
//!
//! `Speaker` serializes every utterance through one playback task so that
//! fire-and-forget callers never talk over each other. The primary backend
//! is used until it fails once; after that every utterance goes to the
//! fallback.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::openai::OpenAiClient;

/// Voices accepted by the speech service
pub const VOICES: [&str; 6] = ["alloy", "echo", "fable", "onyx", "nova", "shimmer"];

pub const DEFAULT_VOICE: &str = "shimmer";

/// Validate a requested voice, falling back to the default
pub fn validate_voice(voice: &str) -> &'static str {
    let voice = voice.trim().to_ascii_lowercase();
    match VOICES.iter().find(|v| **v == voice) {
        Some(v) => *v,
        None => {
            warn!("Invalid voice '{}', using default: {}", voice, DEFAULT_VOICE);
            DEFAULT_VOICE
        }
    }
}

/// Speech collaborator: `speak(text, voice)`, returns when playback ends
#[async_trait::async_trait]
pub trait SpeechBackend: Send + Sync {
    async fn speak(&self, text: &str, voice: &str) -> Result<()>;

    /// Backend name for logging and status reporting
    fn name(&self) -> &str;
}

/// OpenAI text-to-speech, played through a local command-line player
pub struct OpenAiSpeech {
    client: Arc<OpenAiClient>,
    player: String,
    scratch_dir: PathBuf,
}

impl OpenAiSpeech {
    pub fn new(client: Arc<OpenAiClient>, player: String, scratch_dir: PathBuf) -> Self {
        Self {
            client,
            player,
            scratch_dir,
        }
    }
}

#[async_trait::async_trait]
impl SpeechBackend for OpenAiSpeech {
    async fn speak(&self, text: &str, voice: &str) -> Result<()> {
        info!("OpenAI TTS ({}): {}", voice, text);

        let audio = self.client.speech(text, voice).await?;

        tokio::fs::create_dir_all(&self.scratch_dir)
            .await
            .context("Failed to create speech scratch directory")?;
        let file = self.scratch_dir.join("speech.mp3");
        tokio::fs::write(&file, &audio)
            .await
            .context("Failed to write synthesized speech")?;

        let file = file.to_string_lossy().into_owned();
        run_command(&self.player, &[file.as_str()]).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Local system speech (`say` on macOS, or any command taking the text as its argument)
pub struct SystemSpeech {
    command: String,
}

impl SystemSpeech {
    pub fn new(command: String) -> Self {
        Self { command }
    }
}

#[async_trait::async_trait]
impl SpeechBackend for SystemSpeech {
    async fn speak(&self, text: &str, _voice: &str) -> Result<()> {
        info!("System voice: {}", text);
        run_command(&self.command, &[text]).await
    }

    fn name(&self) -> &str {
        "system"
    }
}

/// Last resort: log the text and pause roughly as long as speaking it would take
pub struct PrintedSpeech {
    seconds_per_word: f64,
}

impl PrintedSpeech {
    pub fn new(seconds_per_word: f64) -> Self {
        Self {
            seconds_per_word: seconds_per_word.max(0.0),
        }
    }
}

#[async_trait::async_trait]
impl SpeechBackend for PrintedSpeech {
    async fn speak(&self, text: &str, _voice: &str) -> Result<()> {
        info!("SPEAKING (text only): {}", text);

        let words = text.split_whitespace().count() as f64;
        let pause = Duration::from_secs_f64(words * self.seconds_per_word);
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "printed"
    }
}

async fn run_command(program: &str, args: &[&str]) -> Result<()> {
    let status = Command::new(program)
        .args(args)
        .status()
        .await
        .with_context(|| format!("Failed to run {}", program))?;

    if !status.success() {
        bail!("{} exited with {}", program, status);
    }
    Ok(())
}

/// Whether `program` resolves to an executable on PATH
pub fn command_available(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Completion signal for one queued utterance
pub struct SpeechTicket(oneshot::Receiver<()>);

impl SpeechTicket {
    /// Wait until the utterance has been played (or dropped)
    pub async fn wait(self) {
        let _ = self.0.await;
    }
}

struct Utterance {
    text: String,
    voice: String,
    done: oneshot::Sender<()>,
}

/// Ordered, non-blocking access to the speech backends
#[derive(Clone)]
pub struct Speaker {
    queue: mpsc::UnboundedSender<Utterance>,
    primary_name: String,
    fallback_name: String,
    degraded: Arc<AtomicBool>,
}

impl Speaker {
    /// Spawn the playback task. Must be called inside a Tokio runtime.
    pub fn spawn(primary: Arc<dyn SpeechBackend>, fallback: Arc<dyn SpeechBackend>) -> Self {
        let (queue, mut rx) = mpsc::unbounded_channel::<Utterance>();
        let degraded = Arc::new(AtomicBool::new(false));
        let primary_name = primary.name().to_string();
        let fallback_name = fallback.name().to_string();

        let flag = Arc::clone(&degraded);
        tokio::spawn(async move {
            while let Some(utterance) = rx.recv().await {
                if !flag.load(Ordering::SeqCst) {
                    match primary.speak(&utterance.text, &utterance.voice).await {
                        Ok(()) => {
                            let _ = utterance.done.send(());
                            continue;
                        }
                        Err(e) => {
                            warn!("{} speech failed ({:#}); falling back to {}", primary.name(), e, fallback.name());
                            flag.store(true, Ordering::SeqCst);
                        }
                    }
                }

                if let Err(e) = fallback.speak(&utterance.text, &utterance.voice).await {
                    warn!("{} speech failed: {:#}", fallback.name(), e);
                }
                let _ = utterance.done.send(());
            }
            debug!("Speech queue closed");
        });

        info!("Speech: {} (fallback: {})", primary_name, fallback_name);

        Self {
            queue,
            primary_name,
            fallback_name,
            degraded,
        }
    }

    /// Queue `text` for playback and return immediately
    pub fn say(&self, text: impl Into<String>, voice: &str) -> SpeechTicket {
        let (done, rx) = oneshot::channel();
        let utterance = Utterance {
            text: text.into(),
            voice: voice.to_string(),
            done,
        };

        if self.queue.send(utterance).is_err() {
            warn!("Speech queue is closed; utterance dropped");
        }

        SpeechTicket(rx)
    }

    /// Name of the backend currently used for playback
    pub fn active_backend(&self) -> &str {
        if self.degraded.load(Ordering::SeqCst) {
            &self.fallback_name
        } else {
            &self.primary_name
        }
    }

    pub fn fallback_backend(&self) -> &str {
        &self.fallback_name
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    /// Route the next utterance to the primary again. Returns true if it had been degraded.
    pub fn recheck(&self) -> bool {
        self.degraded.swap(false, Ordering::SeqCst)
    }
}
