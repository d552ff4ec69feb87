// video.rs - Per-scene video synthesis and final stitching
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::ffmpeg::{self, FfmpegError};
use crate::gemini_client::{
    GeminiClient, GeminiError, SeedImage, VideoGenerationConfig, VideoInstance, VideoOperation,
};
use crate::types::{ImagePair, Scene, ScriptEntry};

/// Camera movement appended to the opening scene's prompt.
const OPENING_PAN: &str = " The camera pans from left to center on the first person, \
    then from right to center on the second person.";

#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error("video generation failed: {0}")]
    Generation(#[from] GeminiError),

    #[error("video job {operation} still running after {attempts} polls")]
    PollTimeout { operation: String, attempts: u32 },

    #[error("video job failed ({code:?}): {message}")]
    OperationFailed {
        code: Option<i32>,
        message: String,
    },

    #[error("video concatenation failed: {0}")]
    Concat(#[from] FfmpegError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Generate one clip per scene and stitch the results.
///
/// A scene whose job fails, errors out, or exceeds the poll budget is
/// logged and skipped: it contributes no clip and the final video is
/// simply shorter. Only the final concatenation aborts the run.
///
/// The story is part of the stage contract; current prompts are derived
/// entirely from the script.
pub async fn create_video(
    _story: &[Scene],
    script: &[ScriptEntry],
    images: &[ImagePair],
    client: &GeminiClient,
    config: &AppConfig,
) -> Result<Option<PathBuf>, VideoError> {
    tokio::fs::create_dir_all(&config.videos_dir).await?;

    let mut clips = Vec::new();
    for (index, (entry, pair)) in script.iter().zip(images).enumerate() {
        tracing::info!("Generating video for scene {}...", entry.scene_number);

        let mut prompt = entry.description.clone();
        if index == 0 {
            prompt.push_str(OPENING_PAN);
        }

        match generate_clip(client, config, &prompt, &pair.start_image_path, entry.scene_number)
            .await
        {
            Ok(clip_path) => clips.push(clip_path),
            Err(VideoError::PollTimeout { operation, attempts }) => {
                tracing::warn!(
                    "Scene {} timed out: job {} still running after {} polls",
                    entry.scene_number,
                    operation,
                    attempts
                );
            }
            Err(e) => {
                tracing::warn!("Failed to generate video for scene {}: {}", entry.scene_number, e)
            }
        }
    }

    finalize_clips(clips, &config.videos_dir).await
}

/// Run one video job from submission to persisted clip.
async fn generate_clip(
    client: &GeminiClient,
    config: &AppConfig,
    prompt: &str,
    start_image: &Path,
    scene_number: u32,
) -> Result<PathBuf, VideoError> {
    let image_bytes = tokio::fs::read(start_image).await?;
    let seed = SeedImage::from_bytes(&image_bytes, mime_for_path(start_image));

    let operation = client
        .start_video_generation(
            &config.video_model,
            VideoInstance {
                prompt: prompt.to_string(),
                image: Some(seed),
            },
            VideoGenerationConfig::default(),
        )
        .await?;

    let operation = poll_operation(client, operation, config).await?;

    if let Some(error) = operation.error {
        return Err(VideoError::OperationFailed {
            code: error.code,
            message: error.message.unwrap_or_else(|| "unknown".to_string()),
        });
    }

    let video = operation
        .response
        .as_ref()
        .and_then(|response| response.first_video())
        .ok_or(GeminiError::NoVideoData)?;

    let bytes = client.fetch_video_bytes(video).await?;
    let clip_path = config.videos_dir.join(format!("scene_{}.mp4", scene_number));
    tokio::fs::write(&clip_path, bytes).await?;

    Ok(clip_path)
}

/// Poll a job at the configured interval until done or the attempt budget
/// runs out.
async fn poll_operation(
    client: &GeminiClient,
    mut operation: VideoOperation,
    config: &AppConfig,
) -> Result<VideoOperation, VideoError> {
    let mut attempts = 0;
    while !operation.done {
        if attempts >= config.video_poll_max_attempts {
            return Err(VideoError::PollTimeout {
                operation: operation.name,
                attempts,
            });
        }
        tokio::time::sleep(config.video_poll_interval).await;
        attempts += 1;
        operation = client.get_video_operation(&operation.name).await?;
    }
    Ok(operation)
}

/// Reduce the per-scene clips to the final video path.
///
/// With two or more clips, stream-copy concatenate into `final_video.mp4`
/// and remove the intermediates and the manifest. A single clip is the
/// final video as-is. No clips means no video.
pub async fn finalize_clips(
    clips: Vec<PathBuf>,
    videos_dir: &Path,
) -> Result<Option<PathBuf>, VideoError> {
    if clips.len() < 2 {
        return Ok(clips.into_iter().next());
    }

    tracing::info!("Stitching {} video clips together...", clips.len());
    let manifest_path = videos_dir.join("file_list.txt");
    let final_path = videos_dir.join("final_video.mp4");
    ffmpeg::concat_videos(&clips, &manifest_path, &final_path).await?;

    for clip in &clips {
        if let Err(e) = tokio::fs::remove_file(clip).await {
            tracing::warn!("Failed to remove intermediate clip {}: {}", clip.display(), e);
        }
    }
    tokio::fs::remove_file(&manifest_path).await?;

    Ok(Some(final_path))
}

fn mime_for_path(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("png") => "image/png",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_finalize_no_clips_is_no_video() {
        let dir = tempfile::tempdir().unwrap();
        let result = finalize_clips(Vec::new(), dir.path()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_finalize_single_clip_is_returned_unmodified() {
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("scene_1.mp4");
        std::fs::write(&clip, b"clip").unwrap();

        let result = finalize_clips(vec![clip.clone()], dir.path()).await.unwrap();
        assert_eq!(result, Some(clip.clone()));
        // The single clip is not an intermediate; it must survive.
        assert!(clip.exists());
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("a/scene_2_start.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("a/john.jpg")), "image/jpeg");
    }
}
