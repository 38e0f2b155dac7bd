//! Subject-follow reframing engine.
//!
//! Converts a clip to a different aspect ratio by moving a fixed-size crop
//! window that follows a detected subject: the largest face, or whichever
//! visible face is currently speaking. A hysteresis controller keeps the
//! virtual camera free of jitter and flicker.
//!
//! Pipeline stages:
//! 1. Open the source and derive the crop geometry
//! 2. Precompute the per-frame audio loudness signal (speaker mode)
//! 3. Run the frame loop: sample-detect, score, stabilize, crop, resize
//! 4. Mux the original audio back onto the silent tracked video
//!
//! The pure stages (geometry, scoring, stabilization, audio bucketing) have
//! no OpenCV dependency and are unit-tested without decoding video.

pub mod audio;
pub mod frame;
pub mod geometry;
pub mod models;
pub mod scorer;
pub mod stabilizer;

#[cfg(feature = "opencv")]
pub mod detector;
#[cfg(feature = "opencv")]
pub mod pipeline;

#[cfg(feature = "opencv")]
pub use pipeline::FollowStats;

#[cfg(feature = "opencv")]
mod run {
    use std::path::Path;

    use tracing::{info, warn};

    use autoframe_models::{EncodingConfig, FollowConfig, FollowMode};

    use super::audio::AudioActivity;
    use super::detector::FaceDetector;
    use super::geometry::crop_geometry;
    use super::pipeline::{run_follow_loop, FollowStats, FrameSink, FrameSource};
    use crate::error::{MediaError, MediaResult};
    use crate::mux::mux_audio;

    /// Reframe a clip by following the detected subject.
    ///
    /// Consumes a pre-normalized [`FollowConfig`] (see
    /// [`FollowConfig::normalized`]). On success the final output, with the
    /// source's audio track reattached, is at `dest`. On failure the partial
    /// output is discarded; intermediate files live in a temp location and
    /// are removed on every exit path.
    ///
    /// Speaker mode degrades to face mode when the audio track cannot be
    /// extracted; that downgrade is logged, not surfaced as an error.
    pub async fn reframe(
        source_path: impl AsRef<Path>,
        dest_path: impl AsRef<Path>,
        config: &FollowConfig,
        encoding: &EncodingConfig,
    ) -> MediaResult<FollowStats> {
        let source_path = source_path.as_ref();
        let dest_path = dest_path.as_ref();
        let config = config.normalized();

        let mut source = FrameSource::open(source_path)?;
        let geometry = crop_geometry(source.width, source.height, config.aspect)?;

        let mut detector = FaceDetector::new(config.exclude_right)?;

        let (mode, audio) = match config.mode {
            FollowMode::Speaker => match AudioActivity::from_clip(source_path, source.fps).await {
                Ok(signal) => (FollowMode::Speaker, Some(signal)),
                Err(e) => {
                    warn!(
                        clip = %source_path.display(),
                        error = %e,
                        "Audio analysis failed, downgrading speaker mode to face mode"
                    );
                    (FollowMode::Face, None)
                }
            },
            FollowMode::Face => (FollowMode::Face, None),
        };
        let config = FollowConfig { mode, ..config };

        // The tracked video is written silent to a temp file, then muxed
        // with the source audio. The temp file is deleted on drop, which
        // also covers every error path below.
        let silent = tempfile::Builder::new()
            .prefix("autoframe-")
            .suffix(".mp4")
            .tempfile()
            .map_err(|e| MediaError::sink_open(dest_path, format!("temp sink: {}", e)))?;

        let stats = {
            let mut sink = FrameSink::open(silent.path(), config.out_width, config.out_height, source.fps)?;
            run_follow_loop(&mut source, &mut sink, &mut detector, audio.as_ref(), &config, geometry)?
            // sink drops here, flushing the encoder before the mux reads the file
        };

        info!(
            clip = %source_path.display(),
            frames = stats.frames,
            sampled = stats.sampled_frames,
            with_subjects = stats.frames_with_subjects,
            switches = stats.switches,
            mode = %config.mode,
            "Follow loop complete"
        );

        mux_audio(silent.path(), source_path, dest_path, encoding).await?;

        Ok(stats)
    }
}

#[cfg(feature = "opencv")]
pub use run::reframe;
