//! Haar-cascade face detection for the follow pipeline.
//!
//! Detection runs on a downscaled, histogram-equalized grayscale copy of
//! each sampled frame (longer side capped near 640 px) and rescales the
//! returned boxes to source coordinates.
//!
//! The frontal cascade is required; a job cannot run without it. The
//! profile cascade is a best-effort fallback for turned heads: when its
//! model file is missing the fallback pass is silently disabled.

use std::path::{Path, PathBuf};

use opencv::{core, imgproc, objdetect, prelude::*};
use tracing::{debug, warn};

use super::models::SubjectBox;
use crate::error::{MediaError, MediaResult};

/// Cascade model file names shipped with OpenCV.
const FRONTAL_CASCADE_FILE: &str = "haarcascade_frontalface_default.xml";
const PROFILE_CASCADE_FILE: &str = "haarcascade_profileface.xml";

/// Directories searched for cascade files, in preference order.
/// `AUTOFRAME_CASCADE_DIR` is consulted first when set.
const CASCADE_DIRS: &[&str] = &[
    "/usr/share/opencv4/haarcascades",
    "/usr/local/share/opencv4/haarcascades",
    "/usr/share/opencv/haarcascades",
    "./models/haarcascades",
];

/// Target size of the longer frame side during detection.
const DETECT_TARGET_SIDE: f64 = 640.0;

/// Cascade sweep parameters, matching the tuned production values.
const CASCADE_SCALE_FACTOR: f64 = 1.08;
const CASCADE_MIN_NEIGHBORS: i32 = 4;
const CASCADE_MIN_SIZE: i32 = 30;

/// Locate a cascade file on disk.
fn find_cascade(file_name: &str) -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("AUTOFRAME_CASCADE_DIR") {
        let candidate = Path::new(&dir).join(file_name);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    CASCADE_DIRS
        .iter()
        .map(|dir| Path::new(dir).join(file_name))
        .find(|candidate| candidate.exists())
}

fn load_cascade(path: &Path) -> MediaResult<objdetect::CascadeClassifier> {
    let classifier = objdetect::CascadeClassifier::new(&path.to_string_lossy())
        .map_err(|e| MediaError::detector_unavailable(format!("{}: {}", path.display(), e)))?;

    let empty = classifier
        .empty()
        .map_err(|e| MediaError::detector_unavailable(format!("{}: {}", path.display(), e)))?;
    if empty {
        return Err(MediaError::detector_unavailable(format!(
            "cascade loaded empty from {}",
            path.display()
        )));
    }

    Ok(classifier)
}

/// Owned face detector for one pipeline run.
///
/// Constructed explicitly and passed into the pipeline so concurrent clip
/// jobs get independent instances.
pub struct FaceDetector {
    frontal: objdetect::CascadeClassifier,
    profile: Option<objdetect::CascadeClassifier>,
    /// Fraction of the frame width at the right edge to ignore
    exclude_right: f64,
}

impl FaceDetector {
    /// Load cascade models and build a detector.
    ///
    /// Fails with [`MediaError::DetectorUnavailable`] when the frontal
    /// cascade cannot be loaded. A missing profile cascade only disables
    /// the fallback pass.
    pub fn new(exclude_right: f64) -> MediaResult<Self> {
        let frontal_path = find_cascade(FRONTAL_CASCADE_FILE).ok_or_else(|| {
            MediaError::detector_unavailable(format!(
                "{} not found; set AUTOFRAME_CASCADE_DIR or install the OpenCV data files",
                FRONTAL_CASCADE_FILE
            ))
        })?;
        let frontal = load_cascade(&frontal_path)?;
        debug!(path = %frontal_path.display(), "Loaded frontal face cascade");

        let profile = match find_cascade(PROFILE_CASCADE_FILE) {
            Some(path) => match load_cascade(&path) {
                Ok(classifier) => {
                    debug!(path = %path.display(), "Loaded profile face cascade");
                    Some(classifier)
                }
                Err(e) => {
                    warn!("Profile cascade unusable, fallback disabled: {}", e);
                    None
                }
            },
            None => {
                warn!("Profile cascade not found, fallback disabled");
                None
            }
        };

        Ok(Self {
            frontal,
            profile,
            exclude_right: exclude_right.clamp(0.0, 1.0),
        })
    }

    /// Detect faces in one frame, returning boxes in source coordinates.
    pub fn detect(&mut self, frame: &Mat) -> MediaResult<Vec<SubjectBox>> {
        let src_width = frame.cols();
        let src_height = frame.rows();
        if src_width <= 0 || src_height <= 0 {
            return Ok(Vec::new());
        }

        let longer_side = src_width.max(src_height) as f64;
        let scale = if longer_side > DETECT_TARGET_SIDE {
            DETECT_TARGET_SIDE / longer_side
        } else {
            1.0
        };

        // Downscale, grayscale, equalize.
        let mut small = Mat::default();
        if scale < 1.0 {
            imgproc::resize(
                frame,
                &mut small,
                core::Size::new(
                    (src_width as f64 * scale) as i32,
                    (src_height as f64 * scale) as i32,
                ),
                0.0,
                0.0,
                imgproc::INTER_AREA,
            )
            .map_err(|e| MediaError::internal(format!("detect resize: {}", e)))?;
        } else {
            small = frame.clone();
        }

        let mut gray = Mat::default();
        imgproc::cvt_color(
            &small,
            &mut gray,
            imgproc::COLOR_BGR2GRAY,
            0,
            core::AlgorithmHint::ALGO_HINT_DEFAULT,
        )
        .map_err(|e| MediaError::internal(format!("detect bgr2gray: {}", e)))?;

        let mut equalized = Mat::default();
        imgproc::equalize_hist(&gray, &mut equalized)
            .map_err(|e| MediaError::internal(format!("detect equalize: {}", e)))?;

        let mut boxes = self.run_cascade_frontal(&equalized)?;

        if boxes.is_empty() {
            boxes = self.run_cascade_profile(&equalized)?;
        }

        // Map back to source coordinates.
        let inv = 1.0 / scale;
        let mut subjects: Vec<SubjectBox> = boxes
            .into_iter()
            .map(|r| {
                SubjectBox::new(
                    r.x as f64 * inv,
                    r.y as f64 * inv,
                    r.width as f64 * inv,
                    r.height as f64 * inv,
                )
            })
            .collect();

        // Ignore a secondary on-screen source (e.g. a shared screen) pinned
        // to the right edge.
        if self.exclude_right > 0.0 {
            let cutoff = src_width as f64 * (1.0 - self.exclude_right);
            subjects.retain(|s| s.cx() < cutoff);
        }

        Ok(subjects)
    }

    fn run_cascade_frontal(&mut self, gray: &Mat) -> MediaResult<Vec<core::Rect>> {
        let mut faces = core::Vector::<core::Rect>::new();
        self.frontal
            .detect_multi_scale(
                gray,
                &mut faces,
                CASCADE_SCALE_FACTOR,
                CASCADE_MIN_NEIGHBORS,
                0,
                core::Size::new(CASCADE_MIN_SIZE, CASCADE_MIN_SIZE),
                core::Size::default(),
            )
            .map_err(|e| MediaError::internal(format!("frontal cascade: {}", e)))?;
        Ok(faces.to_vec())
    }

    /// Profile pass: the cascade is trained on one orientation, so it runs
    /// on the image and its horizontal mirror, de-mirroring the x of the
    /// flipped hits.
    fn run_cascade_profile(&mut self, gray: &Mat) -> MediaResult<Vec<core::Rect>> {
        let Some(profile) = self.profile.as_mut() else {
            return Ok(Vec::new());
        };

        let min_size = core::Size::new(CASCADE_MIN_SIZE, CASCADE_MIN_SIZE);

        let mut faces = core::Vector::<core::Rect>::new();
        profile
            .detect_multi_scale(
                gray,
                &mut faces,
                CASCADE_SCALE_FACTOR,
                CASCADE_MIN_NEIGHBORS,
                0,
                min_size,
                core::Size::default(),
            )
            .map_err(|e| MediaError::internal(format!("profile cascade: {}", e)))?;
        let mut merged = faces.to_vec();

        let mut flipped = Mat::default();
        core::flip(gray, &mut flipped, 1)
            .map_err(|e| MediaError::internal(format!("profile flip: {}", e)))?;

        let mut mirrored = core::Vector::<core::Rect>::new();
        profile
            .detect_multi_scale(
                &flipped,
                &mut mirrored,
                CASCADE_SCALE_FACTOR,
                CASCADE_MIN_NEIGHBORS,
                0,
                min_size,
                core::Size::default(),
            )
            .map_err(|e| MediaError::internal(format!("mirrored profile cascade: {}", e)))?;

        let width = gray.cols();
        for r in mirrored {
            merged.push(core::Rect::new(width - (r.x + r.width), r.y, r.width, r.height));
        }

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_cascade_missing_file() {
        assert!(find_cascade("definitely_not_a_cascade.xml").is_none());
    }
}
