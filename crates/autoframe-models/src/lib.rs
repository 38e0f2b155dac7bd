//! Shared data models for the Autoframe reframing engine.
//!
//! This crate provides Serde-serializable types for:
//! - Target aspect ratios and crop styles
//! - Subject-follow tuning configuration
//! - Video encoding settings

pub mod aspect;
pub mod config;
pub mod encoding;
pub mod style;

// Re-export common types
pub use aspect::TargetAspect;
pub use config::FollowConfig;
pub use encoding::EncodingConfig;
pub use style::{CropStyle, FollowMode, ManualCrop};
