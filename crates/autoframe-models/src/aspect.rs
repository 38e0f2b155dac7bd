//! Target aspect ratio definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Target output aspect ratio.
///
/// `Source` keeps the aspect of the input clip, turning the crop into a
/// no-op and the output into a plain resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TargetAspect {
    /// Portrait 9:16 (TikTok, Reels, Shorts)
    #[default]
    Portrait,
    /// Square 1:1 (Instagram)
    Square,
    /// Landscape 16:9 (YouTube)
    Landscape,
    /// Match the source aspect ratio
    Source,
}

impl TargetAspect {
    /// Width/height as a float, or `None` for `Source`.
    pub fn ratio(&self) -> Option<f64> {
        match self {
            TargetAspect::Portrait => Some(9.0 / 16.0),
            TargetAspect::Square => Some(1.0),
            TargetAspect::Landscape => Some(16.0 / 9.0),
            TargetAspect::Source => None,
        }
    }

    /// Resolve to a concrete ratio, falling back to the source dimensions.
    pub fn resolve(&self, src_width: u32, src_height: u32) -> f64 {
        self.ratio().unwrap_or_else(|| {
            if src_height > 0 {
                src_width as f64 / src_height as f64
            } else {
                1.0
            }
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetAspect::Portrait => "9:16",
            TargetAspect::Square => "1:1",
            TargetAspect::Landscape => "16:9",
            TargetAspect::Source => "source",
        }
    }
}

impl fmt::Display for TargetAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TargetAspect {
    type Err = AspectParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "9:16" | "portrait" => Ok(TargetAspect::Portrait),
            "1:1" | "square" => Ok(TargetAspect::Square),
            "16:9" | "landscape" => Ok(TargetAspect::Landscape),
            "source" | "original" => Ok(TargetAspect::Source),
            _ => Err(AspectParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown aspect ratio: {0}")]
pub struct AspectParseError(String);
