//! Clip cutting operations.

use std::path::Path;
use tracing::info;

use autoframe_models::EncodingConfig;

use crate::command::FfmpegCommand;
use crate::error::MediaResult;

/// Cut a clip with stream copy (no re-encoding).
///
/// Fast but keyframe-aligned; use [`cut_clip_reencode`] when a filter or
/// frame-accurate cut is needed.
pub async fn cut_clip_copy(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    start_secs: f64,
    duration: f64,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    info!(
        input = %input.display(),
        output = %output.display(),
        start = start_secs,
        duration,
        "Cutting clip (stream copy)"
    );

    FfmpegCommand::new(input, output)
        .seek(start_secs)
        .duration(duration)
        .codec_copy()
        .run()
        .await
}

/// Cut a clip with re-encoding and an optional video filter.
pub async fn cut_clip_reencode(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    start_secs: f64,
    duration: f64,
    video_filter: Option<&str>,
    encoding: &EncodingConfig,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    info!(
        input = %input.display(),
        output = %output.display(),
        start = start_secs,
        duration,
        filter = video_filter.unwrap_or("-"),
        "Cutting clip (re-encode)"
    );

    let mut cmd = FfmpegCommand::new(input, output)
        .seek(start_secs)
        .duration(duration);

    if let Some(vf) = video_filter {
        cmd = cmd.video_filter(vf);
    }

    cmd.video_codec(&encoding.codec)
        .preset(&encoding.preset)
        .crf(encoding.crf)
        .output_arg("-pix_fmt")
        .output_arg("yuv420p")
        .audio_codec(&encoding.audio_codec)
        .audio_bitrate(&encoding.audio_bitrate)
        .output_arg("-movflags")
        .output_arg("+faststart")
        .run()
        .await
}
