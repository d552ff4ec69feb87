// script.rs - Scene scripter
use crate::types::{Scene, ScriptEntry};

/// Spoken line attached to every scene until real dialogue generation lands.
pub const PLACEHOLDER_DIALOGUE: &str = "This is a placeholder dialogue.";

/// Map each scene 1:1 into a script entry.
pub fn build_script(scenes: &[Scene]) -> Vec<ScriptEntry> {
    scenes
        .iter()
        .map(|scene| ScriptEntry {
            scene_number: scene.scene_number,
            description: scene.description.clone(),
            dialogue: PLACEHOLDER_DIALOGUE.to_string(),
        })
        .collect()
}
