//! Candidate ranking for the subject-follow engine.
//!
//! Every sampled frame, each detected region gets a scalar suitability
//! score; the best region's center becomes the frame's proposed target.

use autoframe_models::FollowMode;

use super::frame::GrayFrame;
use super::models::{PointF, SubjectBox};

/// Fraction of the box height where the mouth region starts.
const MOUTH_REGION_TOP: f64 = 0.55;

/// Scoring weights.
///
/// Empirically tuned values carried as defaults; tune per deployment rather
/// than deriving from first principles.
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    /// Mouth-motion multiplier while the audio signal is voiced
    pub voiced_gain: f64,
    /// Mouth-motion multiplier while unvoiced
    pub unvoiced_gain: f64,
    /// Weight of the box area term in speaker mode
    pub area_weight: f64,
    /// Penalty per squared pixel of distance from the tracked center
    pub stability_weight: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            voiced_gain: 8.0,
            unvoiced_gain: 2.0,
            area_weight: 0.000_02,
            stability_weight: 0.000_8,
        }
    }
}

/// Inputs for scoring one sampled frame.
pub struct ScoreContext<'a> {
    /// Subject selection mode
    pub mode: FollowMode,
    /// Whether this frame falls in a voiced audio window
    pub voiced: bool,
    /// Current frame luminance
    pub gray: &'a GrayFrame,
    /// Previous frame luminance, if any
    pub prev_gray: Option<&'a GrayFrame>,
    /// Current smoothed camera center
    pub tracked: PointF,
    /// Scoring weights
    pub weights: ScoreWeights,
}

/// Mean absolute inter-frame difference over the lower part of the box,
/// approximating the mouth region. Zero without a previous frame.
pub fn mouth_motion(gray: &GrayFrame, prev_gray: Option<&GrayFrame>, subject: &SubjectBox) -> f64 {
    let Some(prev) = prev_gray else {
        return 0.0;
    };

    gray.region_mean_abs_diff(
        prev,
        subject.x,
        subject.y + subject.height * MOUTH_REGION_TOP,
        subject.x + subject.width,
        subject.y + subject.height,
    )
}

/// Score a single candidate region.
pub fn score_candidate(subject: &SubjectBox, ctx: &ScoreContext<'_>) -> f64 {
    let base = match ctx.mode {
        FollowMode::Face => subject.area(),
        FollowMode::Speaker => {
            let motion = mouth_motion(ctx.gray, ctx.prev_gray, subject);
            let gain = if ctx.voiced {
                ctx.weights.voiced_gain
            } else {
                ctx.weights.unvoiced_gain
            };
            motion * gain + subject.area() * ctx.weights.area_weight
        }
    };

    // Bias toward the currently tracked point to resist flicker between
    // similarly ranked candidates.
    base - ctx.weights.stability_weight * subject.center().distance_sq(&ctx.tracked)
}

/// Pick the best-scoring candidate center. Ties keep the first candidate
/// encountered.
pub fn pick_target(subjects: &[SubjectBox], ctx: &ScoreContext<'_>) -> Option<PointF> {
    let mut best: Option<PointF> = None;
    let mut best_score = f64::NEG_INFINITY;

    for subject in subjects {
        let score = score_candidate(subject, ctx);
        if score > best_score {
            best_score = score;
            best = Some(subject.center());
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(width: u32, height: u32, value: u8) -> GrayFrame {
        GrayFrame::new(width, height, vec![value; (width * height) as usize])
    }

    fn face_ctx<'a>(gray: &'a GrayFrame, tracked: PointF) -> ScoreContext<'a> {
        ScoreContext {
            mode: FollowMode::Face,
            voiced: false,
            gray,
            prev_gray: None,
            tracked,
            weights: ScoreWeights::default(),
        }
    }

    #[test]
    fn test_face_mode_prefers_largest() {
        let gray = flat(1920 / 4, 1080 / 4, 0);
        let ctx = face_ctx(&gray, PointF::new(960.0, 540.0));

        let small = SubjectBox::new(900.0, 500.0, 80.0, 80.0);
        let large = SubjectBox::new(300.0, 200.0, 200.0, 200.0);

        let target = pick_target(&[small, large], &ctx).unwrap();
        assert_eq!(target, large.center());
    }

    #[test]
    fn test_stability_penalty_resists_flicker() {
        let gray = flat(480, 270, 0);
        // Tracked point sits on the left face; an equally sized face far
        // right must not win.
        let ctx = face_ctx(&gray, PointF::new(400.0, 500.0));

        let near = SubjectBox::new(360.0, 460.0, 80.0, 80.0);
        let far = SubjectBox::new(1400.0, 460.0, 80.0, 80.0);

        let target = pick_target(&[far, near], &ctx).unwrap();
        assert_eq!(target, near.center());
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        let gray = flat(480, 270, 0);
        let ctx = face_ctx(&gray, PointF::new(0.0, 0.0));

        // Mirror-symmetric boxes around the tracked point: identical scores.
        let a = SubjectBox::new(-90.0, 10.0, 80.0, 80.0);
        let b = SubjectBox::new(10.0, -90.0, 80.0, 80.0);
        assert_eq!(
            score_candidate(&a, &ctx),
            score_candidate(&b, &ctx),
            "test requires a genuine tie"
        );

        let target = pick_target(&[a, b], &ctx).unwrap();
        assert_eq!(target, a.center());
    }

    #[test]
    fn test_no_candidates_yields_none() {
        let gray = flat(16, 16, 0);
        let ctx = face_ctx(&gray, PointF::new(8.0, 8.0));
        assert!(pick_target(&[], &ctx).is_none());
    }

    #[test]
    fn test_mouth_motion_zero_without_previous_frame() {
        let gray = flat(64, 64, 200);
        let subject = SubjectBox::new(8.0, 8.0, 32.0, 32.0);
        assert_eq!(mouth_motion(&gray, None, &subject), 0.0);
    }

    #[test]
    fn test_mouth_motion_restricted_to_lower_box() {
        let prev = flat(64, 64, 0);
        let mut data = vec![0u8; 64 * 64];
        // Light up the top half of the box only; the mouth region (lower
        // 45%) stays dark.
        for y in 8..16 {
            for x in 8..40 {
                data[y * 64 + x] = 255;
            }
        }
        let cur = GrayFrame::new(64, 64, data);

        let subject = SubjectBox::new(8.0, 8.0, 32.0, 32.0);
        assert_eq!(mouth_motion(&cur, Some(&prev), &subject), 0.0);
    }

    #[test]
    fn test_speaker_mode_voiced_motion_beats_area() {
        let prev = flat(200, 200, 0);
        let mut data = vec![0u8; 200 * 200];
        // Strong motion in the mouth region of the small face at (20,20)-(60,60)
        for y in 42..60 {
            for x in 20..60 {
                data[y * 200 + x] = 255;
            }
        }
        let cur = GrayFrame::new(200, 200, data);

        let talking_small = SubjectBox::new(20.0, 20.0, 40.0, 40.0);
        let silent_large = SubjectBox::new(100.0, 100.0, 90.0, 90.0);

        let ctx = ScoreContext {
            mode: FollowMode::Speaker,
            voiced: true,
            gray: &cur,
            prev_gray: Some(&prev),
            tracked: PointF::new(100.0, 100.0),
            weights: ScoreWeights::default(),
        };

        let target = pick_target(&[silent_large, talking_small], &ctx).unwrap();
        assert_eq!(target, talking_small.center());
    }

    #[test]
    fn test_voiced_gain_exceeds_unvoiced() {
        let prev = flat(100, 100, 0);
        let cur = flat(100, 100, 40);
        let subject = SubjectBox::new(10.0, 10.0, 50.0, 50.0);

        let mut ctx = ScoreContext {
            mode: FollowMode::Speaker,
            voiced: true,
            gray: &cur,
            prev_gray: Some(&prev),
            tracked: subject.center(),
            weights: ScoreWeights::default(),
        };
        let voiced_score = score_candidate(&subject, &ctx);

        ctx.voiced = false;
        let unvoiced_score = score_candidate(&subject, &ctx);

        assert!(voiced_score > unvoiced_score);
        // 8x vs 2x on the motion term
        let motion = mouth_motion(&cur, Some(&prev), &subject);
        assert!((voiced_score - unvoiced_score - motion * 6.0).abs() < 1e-9);
    }
}
