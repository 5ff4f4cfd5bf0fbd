use anyhow::{bail, Result};
use std::path::PathBuf;
use std::str::FromStr;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::file::FileBackend;
use super::simulated::SimulatedBackend;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for audio backend
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Target sample rate
    pub target_sample_rate: u32,
    /// Target channel count (1 = mono, 2 = stereo)
    pub target_channels: u16,
    /// Frame size in milliseconds
    pub buffer_duration_ms: u64,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16000, // 16kHz for Whisper
            target_channels: 1,        // Mono
            buffer_duration_ms: 100,   // 100ms buffers
        }
    }
}

/// Audio capture backend trait
///
/// One backend instance serves one capture. Implementations:
/// - Microphone: cpal default input device (`microphone` feature)
/// - File: replays a WAV file, then idles until stopped
/// - Simulated: produces no audio, idles until stopped
///
/// A backend that closes its frame channel while still reporting
/// `is_capturing()` has failed; one that closes it after clearing the flag
/// has simply run out of input.
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive audio frames
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing audio
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Audio source type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// Default microphone input
    Microphone,
    /// Replay of a WAV file
    File(PathBuf),
    /// No real input; the capture waits for stop or timeout and yields silence
    Simulated,
}

impl FromStr for AudioSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "microphone" | "mic" => Ok(AudioSource::Microphone),
            "simulated" | "none" => Ok(AudioSource::Simulated),
            _ => match s.strip_prefix("file:") {
                Some(path) if !path.is_empty() => Ok(AudioSource::File(PathBuf::from(path))),
                _ => bail!("Unknown audio source '{}' (expected microphone, simulated or file:<path>)", s),
            },
        }
    }
}

impl std::fmt::Display for AudioSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioSource::Microphone => write!(f, "microphone"),
            AudioSource::File(path) => write!(f, "file:{}", path.display()),
            AudioSource::Simulated => write!(f, "simulated"),
        }
    }
}

/// Audio backend factory
pub struct AudioBackendFactory;

impl AudioBackendFactory {
    /// Resolve the source to use for this process.
    ///
    /// Called once at startup; sources that cannot work on this machine
    /// degrade to `Simulated`.
    pub fn probe(preferred: AudioSource) -> AudioSource {
        let resolved = match &preferred {
            AudioSource::Microphone => {
                if microphone_available() {
                    AudioSource::Microphone
                } else {
                    warn!("No usable microphone; recordings will be simulated");
                    AudioSource::Simulated
                }
            }
            AudioSource::File(path) => {
                if path.is_file() {
                    preferred.clone()
                } else {
                    warn!("Audio file {} not found; recordings will be simulated", path.display());
                    AudioSource::Simulated
                }
            }
            AudioSource::Simulated => AudioSource::Simulated,
        };

        info!("Audio source: {}", resolved);
        resolved
    }

    /// Create audio backend based on source and configuration
    pub fn create(source: &AudioSource, config: AudioBackendConfig) -> Result<Box<dyn AudioBackend>> {
        match source {
            AudioSource::Microphone => {
                #[cfg(feature = "microphone")]
                {
                    use super::microphone::MicrophoneBackend;
                    let backend = MicrophoneBackend::new(config)?;
                    Ok(Box::new(backend))
                }

                #[cfg(not(feature = "microphone"))]
                {
                    let _ = config;
                    bail!("Microphone capture requires the `microphone` feature")
                }
            }

            AudioSource::File(path) => Ok(Box::new(FileBackend::new(path.clone(), config))),

            AudioSource::Simulated => Ok(Box::new(SimulatedBackend::new(config))),
        }
    }

    /// Create the backend for `source`, or a simulated one if that fails
    pub fn create_or_simulated(source: &AudioSource, config: AudioBackendConfig) -> Box<dyn AudioBackend> {
        match Self::create(source, config.clone()) {
            Ok(backend) => backend,
            Err(e) => {
                warn!("Audio backend {} unavailable ({:#}); using simulated capture", source, e);
                Box::new(SimulatedBackend::new(config))
            }
        }
    }
}

#[cfg(feature = "microphone")]
fn microphone_available() -> bool {
    super::microphone::is_available()
}

#[cfg(not(feature = "microphone"))]
fn microphone_available() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_audio_sources() {
        assert_eq!("microphone".parse::<AudioSource>().unwrap(), AudioSource::Microphone);
        assert_eq!(" Simulated ".parse::<AudioSource>().unwrap(), AudioSource::Simulated);
        assert_eq!(
            "file:/tmp/answer.wav".parse::<AudioSource>().unwrap(),
            AudioSource::File(PathBuf::from("/tmp/answer.wav"))
        );
        assert!("file:".parse::<AudioSource>().is_err());
        assert!("speaker".parse::<AudioSource>().is_err());
    }

    #[test]
    fn test_probe_missing_file_degrades() {
        let source = AudioBackendFactory::probe(AudioSource::File(PathBuf::from("/nonexistent/a.wav")));
        assert_eq!(source, AudioSource::Simulated);
    }

    #[test]
    fn test_create_or_simulated_never_fails() {
        let backend = AudioBackendFactory::create_or_simulated(
            &AudioSource::Simulated,
            AudioBackendConfig::default(),
        );
        assert_eq!(backend.name(), "simulated");
        assert!(!backend.is_capturing());
    }
}
