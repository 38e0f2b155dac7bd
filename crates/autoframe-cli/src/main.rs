//! Autoframe command-line interface.
//!
//! Reframes a clip to a new aspect ratio, either with a one-shot geometric
//! crop or by following the detected subject.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use autoframe_media::{
    build_crop_filter, cut_clip_reencode, generate_thumbnail, probe_video, reframe,
};
use autoframe_models::{CropStyle, EncodingConfig, FollowConfig, ManualCrop, TargetAspect};

#[derive(Debug, Parser)]
#[command(name = "autoframe", about = "Aspect-ratio reframing with subject tracking")]
struct Args {
    /// Input video file
    input: PathBuf,

    /// Output video file
    output: PathBuf,

    /// Crop style: none, center, left, right, manual, face, speaker
    #[arg(long, default_value = "speaker")]
    style: CropStyle,

    /// Target aspect ratio: 9:16, 1:1, 16:9, source
    #[arg(long, default_value = "9:16")]
    aspect: TargetAspect,

    /// Output width in pixels
    #[arg(long, default_value_t = 1080)]
    width: u32,

    /// Output height in pixels
    #[arg(long, default_value_t = 1920)]
    height: u32,

    /// Detection sample rate in frames per second
    #[arg(long, default_value_t = 10.0)]
    sample_fps: f64,

    /// Smoothing factor in (0, 1]
    #[arg(long, default_value_t = 0.18)]
    smoothing: f64,

    /// Frames to hold an accepted target
    #[arg(long, default_value_t = 24)]
    hold_frames: u32,

    /// Deadzone radius in pixels
    #[arg(long, default_value_t = 28.0)]
    deadzone: f64,

    /// Minimum frames between target switches
    #[arg(long, default_value_t = 16)]
    min_switch_frames: u32,

    /// Maximum pan speed in pixels per second
    #[arg(long, default_value_t = 320.0)]
    max_pan_speed: f64,

    /// Ignore faces in this fraction of the frame's right edge (0-1),
    /// for shared-screen layouts
    #[arg(long, default_value_t = 0.0)]
    exclude_right: f64,

    /// Manual crop center x in percent (manual style)
    #[arg(long, default_value_t = 50.0)]
    crop_x: f64,

    /// Manual crop center y in percent (manual style)
    #[arg(long, default_value_t = 50.0)]
    crop_y: f64,

    /// Manual crop width in percent (manual style)
    #[arg(long, default_value_t = 56.0)]
    crop_w: f64,

    /// Manual crop height in percent (manual style)
    #[arg(long, default_value_t = 100.0)]
    crop_h: f64,

    /// x264 CRF quality
    #[arg(long, default_value_t = 18)]
    crf: u8,

    /// x264 preset
    #[arg(long, default_value = "veryfast")]
    preset: String,

    /// Also write a thumbnail next to the output
    #[arg(long)]
    thumbnail: bool,
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("autoframe=info,warn"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(false))
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    let encoding = EncodingConfig {
        crf: args.crf,
        preset: args.preset.clone(),
        ..Default::default()
    };

    match args.style.follow_mode() {
        Some(mode) => {
            let config = FollowConfig {
                out_width: args.width,
                out_height: args.height,
                aspect: args.aspect,
                mode,
                sample_fps: args.sample_fps,
                smoothing: args.smoothing,
                hold_frames: args.hold_frames,
                exclude_right: args.exclude_right,
                deadzone_px: args.deadzone,
                min_switch_frames: args.min_switch_frames,
                max_pan_speed: args.max_pan_speed,
            }
            .normalized();

            let stats = reframe(&args.input, &args.output, &config, &encoding)
                .await
                .with_context(|| format!("reframing {}", args.input.display()))?;

            info!(
                output = %args.output.display(),
                frames = stats.frames,
                switches = stats.switches,
                "Reframe complete"
            );
        }
        None => {
            let probe = probe_video(&args.input)
                .await
                .with_context(|| format!("probing {}", args.input.display()))?;
            if probe.width == 0 || probe.height == 0 || probe.duration <= 0.0 {
                bail!("{} has no decodable video stream", args.input.display());
            }

            let manual = ManualCrop {
                x: args.crop_x,
                y: args.crop_y,
                width: args.crop_w,
                height: args.crop_h,
            };
            let filter = build_crop_filter(
                probe.width,
                probe.height,
                args.aspect,
                args.style,
                &manual,
                (args.width / 2) * 2,
                (args.height / 2) * 2,
            );

            cut_clip_reencode(
                &args.input,
                &args.output,
                0.0,
                probe.duration,
                filter.as_deref(),
                &encoding,
            )
            .await
            .with_context(|| format!("rendering {}", args.output.display()))?;

            info!(output = %args.output.display(), "Static crop complete");
        }
    }

    if args.thumbnail {
        let thumb = args.output.with_extension("jpg");
        generate_thumbnail(&args.output, &thumb, None)
            .await
            .with_context(|| format!("thumbnail {}", thumb.display()))?;
        info!(thumbnail = %thumb.display(), "Thumbnail written");
    }

    Ok(())
}
