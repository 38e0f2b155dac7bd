#![deny(unreachable_patterns)]
//! FFmpeg wrapper and subject-follow reframing engine.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - FFprobe-based media inspection
//! - Static crop filters (center/left/right/manual)
//! - Clip cutting and thumbnail generation
//! - The closed-loop subject-follow reframing core (`follow` module)
//! - Audio muxing for the silent tracked output

pub mod clip;
pub mod command;
pub mod error;
pub mod filters;
pub mod follow;
pub mod mux;
pub mod probe;
pub mod thumbnail;

pub use clip::{cut_clip_copy, cut_clip_reencode};
pub use command::FfmpegCommand;
pub use error::{MediaError, MediaResult};
pub use filters::build_crop_filter;
pub use follow::audio::AudioActivity;
pub use follow::geometry::{crop_geometry, crop_origin, CropGeometry};
pub use follow::stabilizer::Stabilizer;
#[cfg(feature = "opencv")]
pub use follow::reframe;
pub use mux::mux_audio;
pub use probe::{probe_video, VideoInfo};
pub use thumbnail::generate_thumbnail;
