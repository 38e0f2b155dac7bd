//! Thumbnail generation.

use std::path::Path;

use autoframe_models::encoding::THUMBNAIL_TIMESTAMP_SECS;

use crate::command::FfmpegCommand;
use crate::error::MediaResult;

/// Capture a single JPEG frame from a video.
pub async fn generate_thumbnail(
    video_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    at_seconds: Option<f64>,
) -> MediaResult<()> {
    let at = at_seconds.unwrap_or(THUMBNAIL_TIMESTAMP_SECS);

    FfmpegCommand::new(video_path.as_ref(), output_path.as_ref())
        .seek(at)
        .single_frame()
        .output_arg("-q:v")
        .output_arg("2")
        .run()
        .await
}
