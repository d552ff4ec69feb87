// story.rs - Narrative builder
//
// Fills the fixed four-beat story template with the first two fetched
// characters. Deliberately a template, not a model call.

use crate::types::{CharacterRecord, Scene};

#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    #[error("the story needs at least two characters, got {got}")]
    NotEnoughCharacters { got: usize },
}

/// Build the four-scene narrative for a family.
pub fn build_story(records: &[CharacterRecord]) -> Result<Vec<Scene>, StoryError> {
    if records.len() < 2 {
        return Err(StoryError::NotEnoughCharacters { got: records.len() });
    }
    let first = &records[0];
    let second = &records[1];

    Ok(vec![
        Scene {
            scene_number: 1,
            description: format!(
                "Narrator: Meet {}, born in {}, a man of strength and skill. \
                 And this is {}, born in {}, a woman of knowledge and grace.",
                first.name, first.birth_place, second.name, second.birth_place
            ),
        },
        Scene {
            scene_number: 2,
            description: format!(
                "Narrator: {} was a blacksmith, his days filled with the clang of the hammer and the heat of the forge.",
                first.name
            ),
        },
        Scene {
            scene_number: 3,
            description: format!(
                "Narrator: {} was a teacher, her days spent in a library, surrounded by books and knowledge.",
                second.name
            ),
        },
        Scene {
            scene_number: 4,
            description: "Narrator: They met in a library, a place of quiet and books, where their love story began. \
                 Their journey together led them to a beautiful wedding, a celebration of their love."
                .to_string(),
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_four_scenes_numbered_in_order() {
        let scenes = build_story(&doe_family()).unwrap();
        assert_eq!(scenes.len(), 4);
        let numbers: Vec<u32> = scenes.iter().map(|s| s.scene_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_scene_one_introduces_both_characters() {
        let scenes = build_story(&doe_family()).unwrap();
        assert!(scenes[0].description.contains("Meet John, born in Springfield"));
        assert!(scenes[0].description.contains("Jane, born in Rivertown"));
    }

    #[test]
    fn test_middle_scenes_follow_each_character() {
        let scenes = build_story(&doe_family()).unwrap();
        assert!(scenes[1].description.contains("John was a blacksmith"));
        assert!(scenes[2].description.contains("Jane was a teacher"));
    }

    #[test]
    fn test_one_character_is_an_error() {
        let mut records = doe_family();
        records.truncate(1);
        let err = build_story(&records).unwrap_err();
        assert!(matches!(err, StoryError::NotEnoughCharacters { got: 1 }));
    }

    #[test]
    fn test_extra_characters_are_ignored() {
        let mut records = doe_family();
        records.push(CharacterRecord {
            name: "Jim".to_string(),
            birth_place: "Lakeside".to_string(),
            image_url: "file:///portraits/jim.jpg".to_string(),
        });
        let scenes = build_story(&records).unwrap();
        assert_eq!(scenes.len(), 4);
        assert!(!scenes.iter().any(|s| s.description.contains("Jim")));
    }
}
