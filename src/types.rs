// types.rs - Data model shared by all pipeline stages
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One family member as returned by the lookup service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub name: String,
    pub birth_place: String,
    pub image_url: String,
}

/// One beat of the four-beat story template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub scene_number: u32,
    pub description: String,
}

/// A scene with its spoken line attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub scene_number: u32,
    pub description: String,
    pub dialogue: String,
}

/// Start/end image files bracketing one scene's action.
///
/// Scene 1 points at the original portraits; every other scene points at
/// generated files under the images directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePair {
    pub scene_number: u32,
    pub start_image_path: PathBuf,
    pub end_image_path: PathBuf,
}

/// One registered portrait in the family registry file.
///
/// The `name` is only a fallback for when the vision model cannot read one
/// off the portrait.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    #[serde(default)]
    pub name: Option<String>,
    pub image_url: String,
}

/// Local filesystem path for a registered portrait URL.
///
/// Portraits are registered as `file://` URLs or bare paths; only the path
/// component matters.
pub fn local_portrait_path(image_url: &str) -> PathBuf {
    if let Some(rest) = image_url.strip_prefix("file://") {
        return PathBuf::from(rest);
    }
    for scheme in ["http://", "https://"] {
        if let Some(rest) = image_url.strip_prefix(scheme) {
            return match rest.find('/') {
                Some(idx) => PathBuf::from(&rest[idx..]),
                None => PathBuf::from(""),
            };
        }
    }
    PathBuf::from(image_url)
}
