//! ffmpeg front-end.
//!
//! Converts the input video to a fragmented mp4 at the requested height and
//! returns the produced bytes. The output is fragmented so the ledger-side
//! player can start from any chunk boundary.

use std::path::Path;

use anyhow::{Context, bail};
use tracing::info;

/// Maximum accepted output height, exclusive.
pub const MAX_HEIGHT: u32 = 2160;

/// Transcodes `input` to a fragmented mp4 scaled to `height` pixels and
/// returns the file contents. The temporary output file is deleted before
/// returning.
pub async fn transcode(input: &Path, height: u32) -> anyhow::Result<Vec<u8>> {
    if height == 0 || height >= MAX_HEIGHT {
        bail!("height must be between 1 and {}", MAX_HEIGHT - 1);
    }

    let temp = std::env::temp_dir().join("chainvid_converted.mp4");
    info!(input = %input.display(), height, "starting transcode");

    let status = tokio::process::Command::new("ffmpeg")
        .arg("-i")
        .arg(input)
        .args([
            "-f",
            "lavfi",
            "-i",
            "anullsrc=channel_layout=stereo:sample_rate=44100",
            "-c:v",
            "libx264",
            "-profile:v",
            "main",
            "-level:v",
            "4.2",
            "-vf",
        ])
        .arg(format!("scale=-2:{height}"))
        .args([
            "-c:a",
            "aac",
            "-b:a",
            "128k",
            "-shortest",
            "-movflags",
            "frag_keyframe+empty_moov+default_base_moof",
            "-f",
            "mp4",
            "-y",
        ])
        .arg(&temp)
        .status()
        .await
        .context("failed to run ffmpeg; is it installed?")?;

    if !status.success() {
        bail!("ffmpeg exited with {status}");
    }

    let bytes = tokio::fs::read(&temp)
        .await
        .context("reading transcoded output")?;
    tokio::fs::remove_file(&temp).await?;

    info!(bytes = bytes.len(), "transcode finished");
    Ok(bytes)
}
