// ffmpeg.rs - External ffmpeg process wrapper
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffmpeg failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Render the concat demuxer manifest, one `file` directive per clip.
pub fn concat_manifest(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|clip| format!("file '{}'\n", clip.display()))
        .collect()
}

/// Stream-copy concatenate clips into `output`.
///
/// Writes the manifest, then runs
/// `ffmpeg -f concat -safe 0 -i <manifest> -c copy <output> -y`.
/// All clips must share codec and container parameters; the concat demuxer
/// does not re-encode. The manifest is left on disk for the caller to
/// clean up alongside the clips.
pub async fn concat_videos(
    clips: &[PathBuf],
    manifest_path: &Path,
    output: &Path,
) -> Result<(), FfmpegError> {
    tokio::fs::write(manifest_path, concat_manifest(clips)).await?;

    let result = tokio::process::Command::new("ffmpeg")
        .args(["-f", "concat", "-safe", "0", "-i"])
        .arg(manifest_path)
        .args(["-c", "copy"])
        .arg(output)
        .arg("-y")
        .output()
        .await
        .map_err(FfmpegError::NotFound)?;

    if !result.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: result.status.code(),
            stderr: String::from_utf8_lossy(&result.stderr).to_string(),
        });
    }

    Ok(())
}
