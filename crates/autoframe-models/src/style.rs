//! Crop style and follow mode definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How the crop window is positioned inside the source frame.
///
/// The geometric styles (`Center`, `Left`, `Right`, `Manual`) are one-shot
/// calculations rendered as FFmpeg filters. `Face` and `Speaker` run the
/// subject-follow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CropStyle {
    /// No cropping, resize only
    None,
    /// Center crop
    #[default]
    Center,
    /// Crop anchored to the left edge
    Left,
    /// Crop anchored to the right edge
    Right,
    /// User-defined percent crop
    Manual,
    /// Follow the largest detected face
    Face,
    /// Follow whichever face is currently speaking
    Speaker,
}

impl CropStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropStyle::None => "none",
            CropStyle::Center => "center",
            CropStyle::Left => "left",
            CropStyle::Right => "right",
            CropStyle::Manual => "manual",
            CropStyle::Face => "face",
            CropStyle::Speaker => "speaker",
        }
    }

    /// The follow mode for tracking styles, `None` for geometric crops.
    pub fn follow_mode(&self) -> Option<FollowMode> {
        match self {
            CropStyle::Face => Some(FollowMode::Face),
            CropStyle::Speaker => Some(FollowMode::Speaker),
            _ => None,
        }
    }
}

impl fmt::Display for CropStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CropStyle {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(CropStyle::None),
            "center" => Ok(CropStyle::Center),
            "left" => Ok(CropStyle::Left),
            "right" => Ok(CropStyle::Right),
            "manual" => Ok(CropStyle::Manual),
            "face" => Ok(CropStyle::Face),
            "speaker" => Ok(CropStyle::Speaker),
            _ => Err(StyleParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown crop style: {0}")]
pub struct StyleParseError(String);

/// Subject selection mode for the follow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FollowMode {
    /// Track the largest face
    Face,
    /// Track the face correlated with voice activity and mouth motion
    #[default]
    Speaker,
}

impl fmt::Display for FollowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FollowMode::Face => write!(f, "face"),
            FollowMode::Speaker => write!(f, "speaker"),
        }
    }
}

impl FromStr for FollowMode {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "face" => Ok(FollowMode::Face),
            "speaker" => Ok(FollowMode::Speaker),
            _ => Err(StyleParseError(s.to_string())),
        }
    }
}

/// Manual crop window expressed in percent of the source frame.
///
/// `x`/`y` are the crop center, `width`/`height` the crop size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManualCrop {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ManualCrop {
    /// Clamp center to [0, 100] and size to [10, 100] percent.
    pub fn clamped(&self) -> ManualCrop {
        ManualCrop {
            x: self.x.clamp(0.0, 100.0),
            y: self.y.clamp(0.0, 100.0),
            width: self.width.clamp(10.0, 100.0),
            height: self.height.clamp(10.0, 100.0),
        }
    }
}

impl Default for ManualCrop {
    fn default() -> Self {
        Self {
            x: 50.0,
            y: 50.0,
            width: 56.0,
            height: 100.0,
        }
    }
}
