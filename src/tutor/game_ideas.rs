//! Gameplay archetypes offered to the game developer agent.

const MEMORY_TILES: &str = r#"## Memory Tiles Arcade

A fast memory game built on short-term recall.

- Tiles are shown face-up for a moment. Each carries a term, definition, date, formula or short phrase from the material.
- The tiles flip face-down and the player uncovers matching pairs (term and definition, date and event, equation and solution).
- Rounds are timed. Speed and accuracy both add to the score."#;

const MATCH_ATTACK: &str = r#"## Match Attack

An arcade categorization game that trains fast recognition.

- Terms from the material fall from the top of the screen, faster as the game goes on.
- Labeled buckets at the bottom stand for categories from the material (periods, element groups, word classes, formula families).
- The player slides a catcher to grab each term and drops it into the right bucket.
- Missed items and wrong buckets cost points and break the combo."#;

/// The static pool of gameplay ideas.
pub fn gameplay_ideas() -> Vec<String> {
    vec![MEMORY_TILES.to_string(), MATCH_ATTACK.to_string()]
}
