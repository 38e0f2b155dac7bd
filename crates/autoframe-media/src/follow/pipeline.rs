//! Frame-by-frame follow loop.
//!
//! Frames are read, processed, and written strictly in order: the
//! stabilizer's state at frame *i* depends on frame *i−1*, so the loop must
//! not be reordered. Source and sink handles release their underlying
//! resources on drop, including on early error returns.

use std::path::Path;

use opencv::{core, imgproc, prelude::*, videoio};
use tracing::debug;

use autoframe_models::FollowConfig;

use super::audio::AudioActivity;
use super::detector::FaceDetector;
use super::frame::GrayFrame;
use super::geometry::{crop_origin, CropGeometry};
use super::models::PointF;
use super::scorer::{pick_target, ScoreContext, ScoreWeights};
use super::stabilizer::Stabilizer;
use crate::error::{MediaError, MediaResult};

/// Decoded frame source with known dimensions and frame rate.
pub(crate) struct FrameSource {
    capture: videoio::VideoCapture,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl FrameSource {
    /// Open a video file for sequential decoding.
    pub fn open(path: &Path) -> MediaResult<Self> {
        let capture = videoio::VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)
            .map_err(|e| MediaError::source_open(path, e.to_string()))?;

        let opened = capture
            .is_opened()
            .map_err(|e| MediaError::source_open(path, e.to_string()))?;
        if !opened {
            return Err(MediaError::source_open(path, "decoder rejected the file"));
        }

        let width = capture
            .get(videoio::CAP_PROP_FRAME_WIDTH)
            .unwrap_or(0.0) as u32;
        let height = capture
            .get(videoio::CAP_PROP_FRAME_HEIGHT)
            .unwrap_or(0.0) as u32;
        let mut fps = capture.get(videoio::CAP_PROP_FPS).unwrap_or(0.0);
        if !fps.is_finite() || fps <= 0.0 {
            fps = 30.0;
        }

        if width == 0 || height == 0 {
            return Err(MediaError::source_open(path, "zero frame dimensions"));
        }

        Ok(Self {
            capture,
            width,
            height,
            fps,
        })
    }

    /// Read the next frame; `false` at end of stream.
    pub fn read(&mut self, frame: &mut Mat) -> MediaResult<bool> {
        self.capture
            .read(frame)
            .map_err(|e| MediaError::internal(format!("frame read: {}", e)))
    }
}

/// Ordered frame sink producing a silent video file.
pub(crate) struct FrameSink {
    writer: videoio::VideoWriter,
    size: core::Size,
}

impl FrameSink {
    /// Create a writer for `width`x`height` frames at `fps`.
    pub fn open(path: &Path, width: u32, height: u32, fps: f64) -> MediaResult<Self> {
        let fourcc = videoio::VideoWriter::fourcc('m', 'p', '4', 'v')
            .map_err(|e| MediaError::sink_open(path, e.to_string()))?;

        let size = core::Size::new(width as i32, height as i32);
        let writer = videoio::VideoWriter::new(&path.to_string_lossy(), fourcc, fps, size, true)
            .map_err(|e| MediaError::sink_open(path, e.to_string()))?;

        let opened = writer
            .is_opened()
            .map_err(|e| MediaError::sink_open(path, e.to_string()))?;
        if !opened {
            return Err(MediaError::sink_open(path, "encoder rejected the parameters"));
        }

        Ok(Self { writer, size })
    }

    /// Append one frame, resized to the sink dimensions.
    pub fn write_resized(&mut self, frame: &impl core::ToInputArray) -> MediaResult<()> {
        let mut resized = Mat::default();
        imgproc::resize(frame, &mut resized, self.size, 0.0, 0.0, imgproc::INTER_AREA)
            .map_err(|e| MediaError::internal(format!("output resize: {}", e)))?;

        self.writer
            .write(&resized)
            .map_err(|e| MediaError::internal(format!("frame write: {}", e)))
    }
}

/// Counters reported after a completed run.
#[derive(Debug, Default, Clone, Copy)]
pub struct FollowStats {
    /// Frames read and written
    pub frames: u64,
    /// Frames on which detection ran
    pub sampled_frames: u64,
    /// Sampled frames with at least one surviving candidate
    pub frames_with_subjects: u64,
    /// Accepted target switches
    pub switches: u64,
}

/// Drive the per-frame loop over an opened source.
///
/// `audio` must be `Some` exactly when `config.mode` is speaker mode (the
/// caller downgrades the mode when extraction fails).
pub(crate) fn run_follow_loop(
    source: &mut FrameSource,
    sink: &mut FrameSink,
    detector: &mut FaceDetector,
    audio: Option<&AudioActivity>,
    config: &FollowConfig,
    geometry: CropGeometry,
) -> MediaResult<FollowStats> {
    let stride = (source.fps / config.sample_fps).round().max(1.0) as u64;
    debug!(
        stride,
        fps = source.fps,
        crop_w = geometry.width,
        crop_h = geometry.height,
        "Starting follow loop"
    );

    let mut stabilizer = Stabilizer::new(
        config,
        PointF::new(source.width as f64 / 2.0, source.height as f64 / 2.0),
    );
    let weights = ScoreWeights::default();

    let mut stats = FollowStats::default();
    let mut prev_gray: Option<GrayFrame> = None;
    let mut frame = Mat::default();
    let mut gray_mat = Mat::default();
    let mut frame_idx: u64 = 0;

    loop {
        if !source.read(&mut frame)? {
            break;
        }
        if frame.empty() {
            break;
        }

        imgproc::cvt_color(
            &frame,
            &mut gray_mat,
            imgproc::COLOR_BGR2GRAY,
            0,
            core::AlgorithmHint::ALGO_HINT_DEFAULT,
        )
        .map_err(|e| MediaError::internal(format!("bgr2gray: {}", e)))?;
        let gray = gray_frame_of(&gray_mat)?;

        if frame_idx % stride == 0 {
            stats.sampled_frames += 1;

            let subjects = detector.detect(&frame)?;
            if !subjects.is_empty() {
                stats.frames_with_subjects += 1;
            }

            let voiced = audio
                .map(|a| a.is_voiced(frame_idx as usize))
                .unwrap_or(false);

            let candidate = pick_target(
                &subjects,
                &ScoreContext {
                    mode: config.mode,
                    voiced,
                    gray: &gray,
                    prev_gray: prev_gray.as_ref(),
                    tracked: stabilizer.center(),
                    weights,
                },
            );

            stabilizer.observe(candidate);
        }

        let center = stabilizer.step(source.fps);
        let (x, y) = crop_origin(center, &geometry, source.width, source.height);

        let roi = Mat::roi(
            &frame,
            core::Rect::new(x, y, geometry.width as i32, geometry.height as i32),
        )
        .map_err(|e| MediaError::internal(format!("crop roi: {}", e)))?;
        sink.write_resized(&roi)?;

        prev_gray = Some(gray);
        frame_idx += 1;
        stats.frames += 1;
    }

    stats.switches = stabilizer.switches();
    Ok(stats)
}

/// Copy an 8-bit single-channel Mat into an owned buffer.
fn gray_frame_of(mat: &Mat) -> MediaResult<GrayFrame> {
    let data = mat
        .data_bytes()
        .map_err(|e| MediaError::internal(format!("gray buffer: {}", e)))?
        .to_vec();
    Ok(GrayFrame::new(mat.cols() as u32, mat.rows() as u32, data))
}
