// Stand-in capture used when no real audio input is available

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tracing::info;

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};

/// Backend that produces no audio.
///
/// The frame channel stays open until `stop()`, so a capture over this
/// backend ends exactly like a real one: on stop request or timeout.
pub struct SimulatedBackend {
    config: AudioBackendConfig,
    sender: Option<mpsc::Sender<AudioFrame>>,
}

impl SimulatedBackend {
    pub fn new(config: AudioBackendConfig) -> Self {
        Self { config, sender: None }
    }
}

#[async_trait::async_trait]
impl AudioBackend for SimulatedBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.sender.is_some() {
            bail!("Already capturing");
        }

        let (tx, rx) = mpsc::channel(1);
        self.sender = Some(tx);

        info!(
            "Simulated audio capture started ({}Hz, {} channels)",
            self.config.target_sample_rate, self.config.target_channels
        );

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if self.sender.take().is_some() {
            info!("Simulated audio capture stopped");
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.sender.is_some()
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
