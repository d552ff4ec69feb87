// pipeline.rs - The orchestrator: fetch → story → script → images → video
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::gemini_client::GeminiClient;
use crate::images::{self, ImageSynthError};
use crate::metadata::{self, FetchError};
use crate::script;
use crate::story::{self, StoryError};
use crate::video::{self, VideoError};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to fetch character metadata: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Story(#[from] StoryError),

    #[error("image synthesis failed: {0}")]
    Images(#[from] ImageSynthError),

    #[error("video synthesis failed: {0}")]
    Video(#[from] VideoError),
}

/// Run the whole pipeline for one family.
///
/// Stages run strictly in sequence; each stage's output is the next one's
/// sole input. A failed lookup or the two-character story guard stops the
/// run before any media is generated. Per-scene image/video failures stay
/// inside their stages and only shorten the result.
pub async fn generate_family_story_video(
    family_name: &str,
    client: &GeminiClient,
    config: &AppConfig,
) -> Result<Option<PathBuf>, PipelineError> {
    tracing::info!("Starting video generation for the {} family...", family_name);

    tracing::info!("Fetching character images and metadata for {}...", family_name);
    let characters = metadata::fetch_characters(&config.lookup_base_url(), family_name).await?;

    tracing::info!("Creating story...");
    let scenes = story::build_story(&characters)?;

    tracing::info!("Creating script...");
    let entries = script::build_script(&scenes);

    tracing::info!("Creating images...");
    let images = images::create_images(&entries, &characters, client, config).await?;

    tracing::info!("Creating video...");
    let final_path = video::create_video(&scenes, &entries, &images, client, config).await?;

    Ok(final_path)
}
