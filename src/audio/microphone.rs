// Microphone backend using cpal
//
// cpal streams are not Send on every platform, so the stream lives on a
// dedicated thread that holds it until stop() signals shutdown.

use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};

/// Check whether a default input device exists
pub fn is_available() -> bool {
    cpal::default_host().default_input_device().is_some()
}

pub struct MicrophoneBackend {
    config: AudioBackendConfig,
    capturing: Arc<AtomicBool>,
    shutdown: Option<std::sync::mpsc::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl MicrophoneBackend {
    pub fn new(config: AudioBackendConfig) -> Result<Self> {
        if !is_available() {
            bail!("No audio input device found");
        }

        Ok(Self {
            config,
            capturing: Arc::new(AtomicBool::new(false)),
            shutdown: None,
            thread: None,
        })
    }
}

#[async_trait::async_trait]
impl AudioBackend for MicrophoneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.capturing.load(Ordering::SeqCst) {
            bail!("Already capturing");
        }

        let (tx, rx) = mpsc::channel(100);
        let (ready_tx, ready_rx) = oneshot::channel::<Result<()>>();
        let (shutdown_tx, shutdown_rx) = std::sync::mpsc::channel::<()>();
        let capturing = Arc::clone(&self.capturing);
        let target_channels = self.config.target_channels;

        let thread = std::thread::Builder::new()
            .name("microphone".into())
            .spawn(move || {
                let stream = match open_stream(tx, target_channels) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(anyhow!("Failed to start stream: {}", e)));
                    return;
                }

                capturing.store(true, Ordering::SeqCst);
                let _ = ready_tx.send(Ok(()));

                // Hold the stream until stop() or the backend is dropped
                let _ = shutdown_rx.recv();
                drop(stream);
            })
            .context("Failed to spawn microphone thread")?;

        ready_rx
            .await
            .map_err(|_| anyhow!("Microphone thread exited before starting"))??;

        self.shutdown = Some(shutdown_tx);
        self.thread = Some(thread);

        info!("Microphone capture started");

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        // Flag first: the channel closing after this is a clean stop
        self.capturing.store(false, Ordering::SeqCst);

        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        if let Some(thread) = self.thread.take() {
            tokio::task::spawn_blocking(move || thread.join())
                .await
                .context("Failed to join microphone thread")?
                .map_err(|_| anyhow!("Microphone thread panicked"))?;
            info!("Microphone capture stopped");
        }

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "microphone"
    }
}

fn open_stream(tx: mpsc::Sender<AudioFrame>, target_channels: u16) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No audio input device found"))?;

    let supported = device
        .default_input_config()
        .context("No supported audio configuration")?;

    info!(
        "Using input device {:?}: {} Hz, {} channels, {:?}",
        device.name().ok(),
        supported.sample_rate().0,
        supported.channels(),
        supported.sample_format()
    );

    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.into();

    match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, tx, target_channels),
        SampleFormat::I16 => build_stream::<i16>(&device, &config, tx, target_channels),
        SampleFormat::U16 => build_stream::<u16>(&device, &config, tx, target_channels),
        other => bail!("Unsupported sample format {:?}", other),
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    tx: mpsc::Sender<AudioFrame>,
    target_channels: u16,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    let sample_rate = config.sample_rate.0;
    let channels = config.channels;
    let started = Instant::now();

    let stream = device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let samples: Vec<i16> = data.iter().map(|&s| s.to_sample::<i16>()).collect();
                let (samples, out_channels) = if target_channels == 1 && channels > 1 {
                    (downmix_to_mono(&samples, channels), 1)
                } else {
                    (samples, channels)
                };

                let frame = AudioFrame {
                    samples,
                    sample_rate,
                    channels: out_channels,
                    timestamp_ms: started.elapsed().as_millis() as u64,
                };

                // Never block the audio callback
                if tx.try_send(frame).is_err() {
                    warn!("Dropping audio frame: capture is not keeping up");
                }
            },
            move |err| error!("Audio stream error: {}", err),
            None,
        )
        .context("Failed to create audio stream")?;

    Ok(stream)
}

/// Downmix interleaved multi-channel audio to mono by averaging channels per frame
fn downmix_to_mono(data: &[i16], channels: u16) -> Vec<i16> {
    let ch = channels as usize;
    data.chunks_exact(ch)
        .map(|frame| (frame.iter().map(|&s| s as i32).sum::<i32>() / ch as i32) as i16)
        .collect()
}
