//! Per-frame audio loudness for speaker scoring.
//!
//! The clip's audio track is decoded once, before the frame loop, into one
//! RMS loudness value per output video frame plus an adaptive voice-activity
//! threshold. The signal is read-only afterwards.

use std::path::Path;
use std::process::Stdio;

use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Sample rate the audio track is resampled to for analysis.
const ANALYSIS_SAMPLE_RATE: u32 = 16_000;

/// Threshold heuristic: clamp(median * 2.2 + p90 * 0.25, floor, ceiling).
///
/// Empirically tuned to sit above ambient noise but below clear speech;
/// treat as tunable parameters, not fixed physics.
const THRESHOLD_MEDIAN_GAIN: f32 = 2.2;
const THRESHOLD_P90_GAIN: f32 = 0.25;
const THRESHOLD_FLOOR: f32 = 0.015;
const THRESHOLD_CEILING: f32 = 0.08;

/// Per-video-frame RMS loudness with a derived voice-activity threshold.
#[derive(Debug, Clone)]
pub struct AudioActivity {
    rms: Vec<f32>,
    threshold: f32,
}

impl AudioActivity {
    /// Bucket mono samples into one RMS value per video frame.
    ///
    /// Samples are expected normalized to [-1, 1]. A degenerate sample rate
    /// or frame rate yields a single silent bucket.
    pub fn from_samples(samples: &[f32], sample_rate: u32, fps: f64) -> Self {
        let rms = rms_per_frame(samples, sample_rate, fps);
        let threshold = rms_threshold(&rms);
        Self { rms, threshold }
    }

    /// Extract and analyze the audio track of a clip.
    ///
    /// Any failure (no audio stream, decode error) is reported as
    /// [`MediaError::AudioExtraction`]; callers downgrade speaker mode to
    /// face mode instead of failing the clip.
    pub async fn from_clip(path: impl AsRef<Path>, fps: f64) -> MediaResult<Self> {
        let path = path.as_ref();
        let samples = extract_mono_samples(path).await?;

        if samples.is_empty() {
            return Err(MediaError::audio_extraction(format!(
                "no audio samples decoded from {}",
                path.display()
            )));
        }

        let activity = Self::from_samples(&samples, ANALYSIS_SAMPLE_RATE, fps);
        debug!(
            frames = activity.len(),
            threshold = activity.threshold,
            "Audio activity signal ready"
        );
        Ok(activity)
    }

    /// Whether the given video frame falls in a voiced window.
    ///
    /// Indices past the end read the last bucket, so video slightly longer
    /// than its audio track keeps the final activity state.
    pub fn is_voiced(&self, frame_idx: usize) -> bool {
        match self.rms.last() {
            Some(_) => {
                let idx = frame_idx.min(self.rms.len() - 1);
                self.rms[idx] >= self.threshold
            }
            None => false,
        }
    }

    /// The derived voice-activity threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Number of per-frame buckets.
    pub fn len(&self) -> usize {
        self.rms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rms.is_empty()
    }
}

/// Decode the audio track to mono 16 kHz samples via FFmpeg.
async fn extract_mono_samples(path: &Path) -> MediaResult<Vec<f32>> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let temp = NamedTempFile::with_suffix(".pcm")
        .map_err(|e| MediaError::audio_extraction(format!("temp file: {}", e)))?;

    let output = Command::new("ffmpeg")
        .args([
            "-y",
            "-v",
            "error",
            "-i",
            path.to_str().unwrap_or(""),
            "-vn",
            "-ac",
            "1",
            "-ar",
            &ANALYSIS_SAMPLE_RATE.to_string(),
            "-f",
            "s16le",
            "-acodec",
            "pcm_s16le",
            temp.path().to_str().unwrap_or(""),
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| MediaError::audio_extraction(format!("spawn ffmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaError::audio_extraction(format!(
            "ffmpeg exited with {:?}: {}",
            output.status.code(),
            stderr.trim()
        )));
    }

    let raw = tokio::fs::read(temp.path())
        .await
        .map_err(|e| MediaError::audio_extraction(format!("read pcm: {}", e)))?;

    Ok(raw
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
        .collect())
}

/// One RMS bucket per video frame.
fn rms_per_frame(samples: &[f32], sample_rate: u32, fps: f64) -> Vec<f32> {
    if sample_rate == 0 || fps <= 0.0 {
        return vec![0.0];
    }

    let samples_per_frame = (sample_rate as f64 / fps) as usize;
    if samples_per_frame == 0 {
        return vec![0.0];
    }

    let total_frames = (samples.len() / samples_per_frame).max(1);
    let mut rms = Vec::with_capacity(total_frames);

    for i in 0..total_frames {
        let start = i * samples_per_frame;
        let end = (start + samples_per_frame).min(samples.len());
        let chunk = &samples[start..end];
        if chunk.is_empty() {
            rms.push(0.0);
        } else {
            let mean_sq: f64 =
                chunk.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>() / chunk.len() as f64;
            rms.push(mean_sq.sqrt() as f32);
        }
    }

    rms
}

/// Adaptive voice-activity threshold over the RMS distribution.
fn rms_threshold(rms: &[f32]) -> f32 {
    if rms.is_empty() {
        return 0.02;
    }

    let mut sorted = rms.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let med = percentile(&sorted, 50.0);
    let p90 = percentile(&sorted, 90.0);

    (med * THRESHOLD_MEDIAN_GAIN + p90 * THRESHOLD_P90_GAIN).clamp(THRESHOLD_FLOOR, THRESHOLD_CEILING)
}

/// Linear-interpolated percentile over sorted values.
fn percentile(sorted: &[f32], p: f64) -> f32 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = (rank - lo as f64) as f32;

    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_bucketing() {
        // 1 second of audio at 100 Hz "sample rate", 10 fps -> 10 samples/frame
        let mut samples = vec![0.0f32; 50];
        samples.extend(vec![0.5f32; 50]);

        let rms = rms_per_frame(&samples, 100, 10.0);
        assert_eq!(rms.len(), 10);
        assert!(rms[0].abs() < 1e-6);
        assert!((rms[9] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_inputs_yield_single_silent_bucket() {
        assert_eq!(rms_per_frame(&[0.1, 0.2], 0, 30.0), vec![0.0]);
        assert_eq!(rms_per_frame(&[0.1, 0.2], 16_000, 0.0), vec![0.0]);
        // Fewer samples than one frame still produces one bucket
        let rms = rms_per_frame(&[0.5; 100], 16_000, 30.0);
        assert_eq!(rms.len(), 1);
        assert!((rms[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_clamping() {
        // Loud signal: median alone would exceed the ceiling
        let loud = vec![0.9f32; 100];
        assert_eq!(rms_threshold(&loud), THRESHOLD_CEILING);

        // Near-silence clamps to the floor
        let quiet = vec![0.0001f32; 100];
        assert_eq!(rms_threshold(&quiet), THRESHOLD_FLOOR);

        assert_eq!(rms_threshold(&[]), 0.02);
    }

    #[test]
    fn test_threshold_between_noise_and_speech() {
        // 80% ambient noise around 0.01, 20% speech around 0.2
        let mut rms = vec![0.01f32; 80];
        rms.extend(vec![0.2f32; 20]);
        let thr = rms_threshold(&rms);
        assert!(thr > 0.01, "threshold {} should sit above noise", thr);
        assert!(thr < 0.2, "threshold {} should sit below speech", thr);
    }

    #[test]
    fn test_is_voiced_saturates_at_last_bucket() {
        let mut samples = vec![0.0f32; 100];
        samples.extend(vec![0.5f32; 100]);
        // 100 Hz, 10 fps -> 20 buckets, last 10 loud
        let activity = AudioActivity::from_samples(&samples, 100, 10.0);

        assert!(!activity.is_voiced(0));
        assert!(activity.is_voiced(15));
        // Past-the-end indices read the final bucket
        assert!(activity.is_voiced(10_000));
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = vec![0.0f32, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 50.0), 2.0);
        assert_eq!(percentile(&sorted, 100.0), 4.0);
        assert_eq!(percentile(&sorted, 0.0), 0.0);
        assert!((percentile(&sorted, 90.0) - 3.6).abs() < 1e-6);
    }
}
