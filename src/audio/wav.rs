use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Deterministic recording path for the answer to `question_index`
pub fn answer_path(dir: &Path, question_index: usize) -> PathBuf {
    dir.join(format!("answer_{}.wav", question_index))
}

/// Writes one captured answer to disk as a 16-bit WAV file
pub struct AnswerWriter {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    path: PathBuf,
    sample_count: usize,
}

impl AnswerWriter {
    pub fn create(path: &Path, sample_rate: u32, channels: u16) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create recordings directory")?;
        }

        let spec = hound::WavSpec {
            channels: channels.max(1),
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let writer = hound::WavWriter::create(path, spec)
            .with_context(|| format!("Failed to create WAV file: {:?}", path))?;

        Ok(Self {
            writer: Some(writer),
            path: path.to_path_buf(),
            sample_count: 0,
        })
    }

    pub fn write_samples(&mut self, samples: &[i16]) -> Result<()> {
        if let Some(writer) = &mut self.writer {
            for &sample in samples {
                writer
                    .write_sample(sample)
                    .context("Failed to write sample to WAV")?;
            }
            self.sample_count += samples.len();
        }

        Ok(())
    }

    pub fn finish(mut self) -> Result<PathBuf> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().context("Failed to finalize WAV file")?;
        }

        info!("Saved {} samples to {}", self.sample_count, self.path.display());

        Ok(self.path.clone())
    }
}

impl Drop for AnswerWriter {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                warn!("Failed to finalize WAV writer on drop: {}", e);
            }
        }
    }
}

/// Write a whole buffer; an empty buffer still yields a valid WAV header
pub fn save_answer(path: &Path, samples: &[i16], sample_rate: u32, channels: u16) -> Result<PathBuf> {
    let mut writer = AnswerWriter::create(path, sample_rate, channels)?;
    writer.write_samples(samples)?;
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_path_is_keyed_by_question() {
        let dir = Path::new("/tmp/recordings");
        assert_eq!(answer_path(dir, 2), PathBuf::from("/tmp/recordings/answer_2.wav"));
        assert_eq!(answer_path(dir, 2), answer_path(dir, 2));
    }

    #[test]
    fn test_empty_answer_is_valid_wav() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = answer_path(dir.path(), 1);

        save_answer(&path, &[], 16000, 1)?;

        let reader = hound::WavReader::open(&path)?;
        assert_eq!(reader.len(), 0);
        assert_eq!(reader.spec().sample_rate, 16000);
        Ok(())
    }
}
