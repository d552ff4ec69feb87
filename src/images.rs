// images.rs - Per-scene before/after image synthesis
use std::path::Path;

use crate::config::AppConfig;
use crate::gemini_client::GeminiClient;
use crate::types::{local_portrait_path, CharacterRecord, ImagePair, ScriptEntry};

const NARRATOR_PREFIX: &str = "Narrator: ";

/// Fixed style applied to every generated image prompt.
const STYLE_SUFFIX: &str = ", in the style of a vintage photograph, with a warm, sepia-toned palette, \
    cinematic, photorealistic, the characters are looking away from the camera, \
    their faces are not clearly visible, detailed environment.";

/// Written in place of an image when generation fails.
const PLACEHOLDER_BODY: &str = "Placeholder: Image generation failed.";

#[derive(Debug, thiserror::Error)]
pub enum ImageSynthError {
    #[error("scene 1 reuses the two lead portraits, but only {got} characters were provided")]
    MissingPortraits { got: usize },

    #[error("failed to write image file: {0}")]
    Io(#[from] std::io::Error),
}

/// Strip the narrator prefix so the prompt reads as a scene description.
pub fn base_prompt(description: &str) -> &str {
    description.strip_prefix(NARRATOR_PREFIX).unwrap_or(description)
}

/// Before/after prompts for one scene.
///
/// Scene 4's after-image is always the wedding photo of the two leads,
/// overriding the generic template.
pub fn scene_prompts(entry: &ScriptEntry, characters: &[CharacterRecord]) -> (String, String) {
    let base = base_prompt(&entry.description);
    let before = format!("Before the action: {base}{STYLE_SUFFIX}");
    let after = if entry.scene_number == 4 && characters.len() >= 2 {
        format!(
            "A wedding picture of {} and {}{STYLE_SUFFIX}",
            characters[0].name, characters[1].name
        )
    } else {
        format!("After the action: {base}{STYLE_SUFFIX}")
    };
    (before, after)
}

/// Characters whose name appears in the prompt text.
///
/// Plain substring matching: nicknames miss and short names can collide.
pub fn matching_characters<'a>(
    characters: &'a [CharacterRecord],
    base: &str,
) -> Vec<&'a CharacterRecord> {
    characters
        .iter()
        .filter(|character| base.contains(&character.name))
        .collect()
}

/// Produce one image pair per script entry.
///
/// Scene 1 reuses the two input portraits directly; every other scene gets
/// a generated before/after image seeded with the portraits of whichever
/// characters the prompt mentions. A failed generation leaves a placeholder
/// file and the pipeline moves on.
pub async fn create_images(
    script: &[ScriptEntry],
    characters: &[CharacterRecord],
    client: &GeminiClient,
    config: &AppConfig,
) -> Result<Vec<ImagePair>, ImageSynthError> {
    tokio::fs::create_dir_all(&config.images_dir).await?;

    let mut pairs = Vec::with_capacity(script.len());
    for entry in script {
        if entry.scene_number == 1 {
            if characters.len() < 2 {
                return Err(ImageSynthError::MissingPortraits {
                    got: characters.len(),
                });
            }
            pairs.push(ImagePair {
                scene_number: entry.scene_number,
                start_image_path: local_portrait_path(&characters[0].image_url),
                end_image_path: local_portrait_path(&characters[1].image_url),
            });
            continue;
        }

        let (before_prompt, after_prompt) = scene_prompts(entry, characters);
        let references =
            load_reference_images(characters, base_prompt(&entry.description)).await;

        let start_image_path = config
            .images_dir
            .join(format!("scene_{}_start.png", entry.scene_number));
        let end_image_path = config
            .images_dir
            .join(format!("scene_{}_end.png", entry.scene_number));

        generate_to_file(client, config, &before_prompt, &references, &start_image_path).await?;
        generate_to_file(client, config, &after_prompt, &references, &end_image_path).await?;

        pairs.push(ImagePair {
            scene_number: entry.scene_number,
            start_image_path,
            end_image_path,
        });
    }

    Ok(pairs)
}

/// Portrait bytes for every character the prompt mentions.
async fn load_reference_images(characters: &[CharacterRecord], base: &str) -> Vec<Vec<u8>> {
    let mut references = Vec::new();
    for character in matching_characters(characters, base) {
        let path = local_portrait_path(&character.image_url);
        match tokio::fs::read(&path).await {
            Ok(bytes) => references.push(bytes),
            Err(e) => {
                tracing::warn!("Failed to read reference portrait {}: {}", path.display(), e)
            }
        }
    }
    references
}

/// Generate one image and persist it, degrading to a placeholder on failure.
async fn generate_to_file(
    client: &GeminiClient,
    config: &AppConfig,
    prompt: &str,
    references: &[Vec<u8>],
    output_path: &Path,
) -> Result<(), ImageSynthError> {
    match client
        .generate_image(&config.image_model, prompt, references)
        .await
    {
        Ok(bytes) => tokio::fs::write(output_path, bytes).await?,
        Err(e) => {
            tracing::warn!("Failed to generate image for prompt '{}': {}", prompt, e);
            tokio::fs::write(output_path, PLACEHOLDER_BODY).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn doe_family() -> Vec<CharacterRecord> {
        vec![
            CharacterRecord {
                name: "John".to_string(),
                birth_place: "Springfield".to_string(),
                image_url: "file:///portraits/john.jpg".to_string(),
            },
            CharacterRecord {
                name: "Jane".to_string(),
                birth_place: "Rivertown".to_string(),
                image_url: "file:///portraits/jane.jpg".to_string(),
            },
        ]
    }

    fn entry(scene_number: u32, description: &str) -> ScriptEntry {
        ScriptEntry {
            scene_number,
            description: description.to_string(),
            dialogue: "This is a placeholder dialogue.".to_string(),
        }
    }

    fn test_config(images_dir: PathBuf) -> AppConfig {
        AppConfig {
            gemini_api_key: String::new(),
            gemini_base_url: "http://127.0.0.1:1".to_string(),
            vision_model: "vision".to_string(),
            image_model: "image".to_string(),
            video_model: "video".to_string(),
            images_dir,
            videos_dir: PathBuf::from("videos"),
            registry_path: PathBuf::from("family_registry.json"),
            lookup_host: "127.0.0.1".to_string(),
            lookup_port: 0,
            family_name: "Doe".to_string(),
            video_poll_interval: Duration::from_millis(1),
            video_poll_max_attempts: 1,
            readiness_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_base_prompt_strips_narrator_prefix() {
        assert_eq!(base_prompt("Narrator: John at the forge."), "John at the forge.");
        assert_eq!(base_prompt("John at the forge."), "John at the forge.");
    }

    #[test]
    fn test_scene_prompts_wrap_base_with_style() {
        let (before, after) = scene_prompts(&entry(2, "Narrator: John at the forge."), &doe_family());
        assert!(before.starts_with("Before the action: John at the forge."));
        assert!(after.starts_with("After the action: John at the forge."));
        assert!(before.ends_with("detailed environment."));
        assert!(after.ends_with("detailed environment."));
    }

    #[test]
    fn test_scene_four_after_prompt_is_the_wedding_photo() {
        let (before, after) = scene_prompts(&entry(4, "Narrator: They met in a library."), &doe_family());
        assert!(before.starts_with("Before the action: They met in a library."));
        assert!(after.starts_with("A wedding picture of John and Jane"));
    }

    #[test]
    fn test_matching_characters_by_substring() {
        let characters = doe_family();
        let matched = matching_characters(&characters, "John was a blacksmith");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "John");

        assert!(matching_characters(&characters, "They met in a library").is_empty());
    }

    #[test]
    fn test_matching_characters_substring_collision() {
        // Short names collide with longer words containing them.
        let characters = vec![CharacterRecord {
            name: "Ann".to_string(),
            birth_place: "Hill".to_string(),
            image_url: "file:///portraits/ann.jpg".to_string(),
        }];
        let matched = matching_characters(&characters, "An Annotated history of the valley");
        assert_eq!(matched.len(), 1);
    }

    #[tokio::test]
    async fn test_scene_one_reuses_the_portraits() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path().join("images"));
        let client = GeminiClient::new(String::new(), config.gemini_base_url.clone());

        let script = vec![entry(1, "Narrator: Meet John and Jane.")];
        let pairs = create_images(&script, &doe_family(), &client, &config)
            .await
            .unwrap();

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].scene_number, 1);
        assert_eq!(pairs[0].start_image_path, PathBuf::from("/portraits/john.jpg"));
        assert_eq!(pairs[0].end_image_path, PathBuf::from("/portraits/jane.jpg"));
    }

    #[tokio::test]
    async fn test_scene_one_with_too_few_characters_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path().join("images"));
        let client = GeminiClient::new(String::new(), config.gemini_base_url.clone());

        let script = vec![entry(1, "Narrator: Meet John.")];
        let mut characters = doe_family();
        characters.truncate(1);

        let err = create_images(&script, &characters, &client, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, ImageSynthError::MissingPortraits { got: 1 }));
    }

    #[tokio::test]
    async fn test_one_pair_per_entry_positionally_aligned() {
        // Generation fails against the unroutable client, but every entry
        // still yields a pair in scene order.
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path().join("images"));
        let client = GeminiClient::new(String::new(), config.gemini_base_url.clone());

        let script = vec![
            entry(1, "Narrator: Meet John and Jane."),
            entry(2, "Narrator: John at the forge."),
            entry(3, "Narrator: Jane in the library."),
            entry(4, "Narrator: They met in a library."),
        ];
        let pairs = create_images(&script, &doe_family(), &client, &config)
            .await
            .unwrap();

        assert_eq!(pairs.len(), script.len());
        for (pair, entry) in pairs.iter().zip(&script) {
            assert_eq!(pair.scene_number, entry.scene_number);
        }
        assert!(pairs[1]
            .start_image_path
            .ends_with("scene_2_start.png"));
        assert!(pairs[3].end_image_path.ends_with("scene_4_end.png"));
    }

    #[tokio::test]
    async fn test_failed_generation_writes_placeholder_and_continues() {
        // The client points at an unroutable address, so generation fails
        // and every generated slot degrades to a placeholder file.
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path().join("images"));
        let client = GeminiClient::new(String::new(), config.gemini_base_url.clone());

        let script = vec![entry(2, "Narrator: John at the forge.")];
        let pairs = create_images(&script, &doe_family(), &client, &config)
            .await
            .unwrap();

        assert_eq!(pairs.len(), 1);
        let body = std::fs::read_to_string(&pairs[0].start_image_path).unwrap();
        assert_eq!(body, PLACEHOLDER_BODY);
        let body = std::fs::read_to_string(&pairs[0].end_image_path).unwrap();
        assert_eq!(body, PLACEHOLDER_BODY);
    }
}
