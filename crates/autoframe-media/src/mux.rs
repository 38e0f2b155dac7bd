//! Audio muxing for the silent tracked output.
//!
//! The follow pipeline writes video-only frames; this module reattaches the
//! original clip's audio track in a final encode pass. A source without an
//! audio stream is tolerated (the `1:a:0?` mapping) and yields video-only
//! output.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use autoframe_models::EncodingConfig;

use crate::error::{MediaError, MediaResult};

/// Combine a silent video with the audio track of another file.
pub async fn mux_audio(
    video: impl AsRef<Path>,
    audio_source: impl AsRef<Path>,
    output: impl AsRef<Path>,
    encoding: &EncodingConfig,
) -> MediaResult<()> {
    let video = video.as_ref();
    let audio_source = audio_source.as_ref();
    let output = output.as_ref();

    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    info!(
        video = %video.display(),
        audio = %audio_source.display(),
        output = %output.display(),
        "Muxing audio onto tracked video"
    );

    let mut cmd = Command::new("ffmpeg");
    cmd.args([
        "-y",
        "-v",
        "error",
        "-i",
        video.to_str().unwrap_or(""),
        "-i",
        audio_source.to_str().unwrap_or(""),
        "-map",
        "0:v:0",
        "-map",
        "1:a:0?",
        "-c:v",
        &encoding.codec,
        "-preset",
        &encoding.preset,
        "-crf",
        &encoding.crf.to_string(),
        "-pix_fmt",
        "yuv420p",
        "-movflags",
        "+faststart",
        "-c:a",
        &encoding.audio_codec,
        "-b:a",
        &encoding.audio_bitrate,
        output.to_str().unwrap_or(""),
    ])
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    debug!("Mux command: {:?}", cmd);

    let result = cmd.output().await.map_err(|e| {
        MediaError::ffmpeg_failed(format!("Failed to spawn ffmpeg for mux: {}", e), None, None)
    })?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr).to_string();
        return Err(MediaError::ffmpeg_failed(
            format!("Audio mux failed for {}", output.display()),
            Some(stderr),
            result.status.code(),
        ));
    }

    Ok(())
}
