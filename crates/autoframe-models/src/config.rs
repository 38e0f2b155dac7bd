//! Tuning configuration for the subject-follow engine.

use serde::{Deserialize, Serialize};

use crate::aspect::TargetAspect;
use crate::style::FollowMode;

/// Configuration for one subject-follow reframing job.
///
/// All numeric fields are expected to be normalized via [`FollowConfig::normalized`]
/// before reaching the engine: output dimensions forced to even non-negative
/// values, fractions clamped to their documented ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowConfig {
    /// Output width in pixels (forced even)
    pub out_width: u32,

    /// Output height in pixels (forced even)
    pub out_height: u32,

    /// Target output aspect ratio
    pub aspect: TargetAspect,

    /// Subject selection mode
    pub mode: FollowMode,

    /// Detection sample rate in frames per second (default: 10)
    pub sample_fps: f64,

    /// Exponential smoothing factor in (0, 1]; higher follows faster (default: 0.18)
    pub smoothing: f64,

    /// Frames to hold the current target once accepted (default: 24)
    pub hold_frames: u32,

    /// Ignore faces whose center lies within this fraction of the right
    /// edge, e.g. 0.40 for a shared-screen layout (default: 0.0)
    pub exclude_right: f64,

    /// Minimum target shift in pixels before the camera moves (default: 28)
    pub deadzone_px: f64,

    /// Minimum frames between accepted target switches (default: 16)
    pub min_switch_frames: u32,

    /// Maximum virtual camera pan speed in pixels per second (default: 320)
    pub max_pan_speed: f64,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            out_width: 1080,
            out_height: 1920,
            aspect: TargetAspect::Portrait,
            mode: FollowMode::Speaker,
            sample_fps: 10.0,
            smoothing: 0.18,
            hold_frames: 24,
            exclude_right: 0.0,
            deadzone_px: 28.0,
            min_switch_frames: 16,
            max_pan_speed: 320.0,
        }
    }
}

impl FollowConfig {
    /// Return a copy with every numeric field clamped to its valid range.
    ///
    /// Output dimensions are rounded down to even values, fractions to
    /// [0, 1], and rates to strictly positive values.
    pub fn normalized(&self) -> FollowConfig {
        FollowConfig {
            out_width: (self.out_width / 2) * 2,
            out_height: (self.out_height / 2) * 2,
            aspect: self.aspect,
            mode: self.mode,
            sample_fps: self.sample_fps.max(1.0),
            smoothing: self.smoothing.clamp(0.01, 1.0),
            hold_frames: self.hold_frames,
            exclude_right: self.exclude_right.clamp(0.0, 1.0),
            deadzone_px: self.deadzone_px.max(0.0),
            min_switch_frames: self.min_switch_frames,
            max_pan_speed: self.max_pan_speed.max(0.0),
        }
    }

    /// Snappier tracking for fast-cut content: denser sampling, shorter
    /// holds, faster pans.
    pub fn responsive() -> Self {
        Self {
            sample_fps: 15.0,
            smoothing: 0.25,
            hold_frames: 12,
            min_switch_frames: 8,
            max_pan_speed: 480.0,
            ..Default::default()
        }
    }

    /// Calmer tracking for podcast-style content with long takes.
    pub fn steady() -> Self {
        Self {
            sample_fps: 6.0,
            smoothing: 0.12,
            hold_frames: 36,
            deadzone_px: 40.0,
            min_switch_frames: 24,
            max_pan_speed: 240.0,
            ..Default::default()
        }
    }
}
