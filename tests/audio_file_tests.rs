// Integration tests for WAV handling
//
// These tests verify that answers are written as valid WAV files and read
// back with the expected format and samples.

use anyhow::Result;
use interview_coach::audio::{answer_path, save_answer, AnswerWriter, AudioFile};
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_audio_file_open() -> Result<()> {
    let dir = TempDir::new()?;
    let path = answer_path(dir.path(), 1);
    let samples: Vec<i16> = (0..16000).map(|i| ((i % 64) * 100) as i16).collect();
    save_answer(&path, &samples, 16000, 1)?;

    let audio = AudioFile::open(&path)?;

    assert!((audio.duration_seconds - 1.0).abs() < 1e-9);
    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.samples, samples);
    assert!(audio.path.contains("answer_1.wav"));

    Ok(())
}

#[test]
fn test_audio_file_nonexistent() {
    let path = PathBuf::from("/nonexistent/path/to/audio.wav");
    let result = AudioFile::open(&path);

    assert!(result.is_err(), "Opening nonexistent file should fail");
}

#[test]
fn test_stereo_frames_stay_interleaved() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("stereo.wav");
    // 0.25s of stereo at 8kHz
    let samples: Vec<i16> = (0..4000).map(|i| if i % 2 == 0 { 1 } else { -1 }).collect();
    save_answer(&path, &samples, 8000, 2)?;

    let audio = AudioFile::open(&path)?;
    assert_eq!(audio.channels, 2);
    assert!((audio.duration_seconds - 0.25).abs() < 1e-9);

    let frames = audio.frames(100);
    // 100ms at 8kHz stereo = 1600 samples; the last frame is partial
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].samples.len(), 1600);
    assert_eq!(frames[2].samples.len(), 800);
    for frame in &frames {
        assert_eq!(frame.samples.len() % 2, 0, "frames never split a stereo pair");
    }

    Ok(())
}

#[test]
fn test_answer_writer_creates_directories() -> Result<()> {
    let dir = TempDir::new()?;
    let path = answer_path(&dir.path().join("nested").join("recordings"), 4);

    let mut writer = AnswerWriter::create(&path, 16000, 1)?;
    writer.write_samples(&[1, 2, 3])?;
    writer.write_samples(&[4, 5])?;
    let written = writer.finish()?;

    assert_eq!(written, path);
    let audio = AudioFile::open(&path)?;
    assert_eq!(audio.samples, vec![1, 2, 3, 4, 5]);

    Ok(())
}

#[test]
fn test_dropped_writer_still_finalizes() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("partial.wav");

    {
        let mut writer = AnswerWriter::create(&path, 16000, 1)?;
        writer.write_samples(&[10; 160])?;
    }

    let audio = AudioFile::open(&path)?;
    assert_eq!(audio.samples.len(), 160);

    Ok(())
}
