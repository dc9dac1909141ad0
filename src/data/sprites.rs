use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::components::geometry::Rect;

/// Side of one square spritesheet cell, in pixels. The floor border and the
/// element edge tests are all offset by one cell so the anchor is the
/// sprite's top-left corner.
pub const SPRITE_SIZE: f64 = 128.0;

/// Named rectangles into the shared spritesheet image. Immutable, built
/// once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpriteSheet {
    pub schema_version: u32,
    pub sprites: Vec<SpriteDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpriteDef {
    pub name: String,
    pub rect: Rect,
}

#[derive(Debug)]
pub enum SpriteDataError {
    Validation(String),
}

impl std::fmt::Display for SpriteDataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpriteDataError::Validation(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for SpriteDataError {}

impl SpriteSheet {
    pub fn get(&self, name: &str) -> Option<&Rect> {
        self.sprites
            .iter()
            .find(|sprite| sprite.name == name)
            .map(|sprite| &sprite.rect)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn validate(&self) -> Result<(), SpriteDataError> {
        let mut names = HashSet::new();
        for sprite in &self.sprites {
            if sprite.name.trim().is_empty() {
                return Err(SpriteDataError::Validation(
                    "sprite name cannot be empty".to_string(),
                ));
            }
            if !names.insert(sprite.name.clone()) {
                return Err(SpriteDataError::Validation(format!(
                    "duplicate sprite name {}",
                    sprite.name
                )));
            }
            if sprite.rect.width <= 0.0 || sprite.rect.height <= 0.0 {
                return Err(SpriteDataError::Validation(format!(
                    "sprite {} has a degenerate rect",
                    sprite.name
                )));
            }
        }
        Ok(())
    }
}

fn cell(name: &str, col: u32, row: u32) -> SpriteDef {
    SpriteDef {
        name: name.to_string(),
        rect: Rect::new(
            col as f64 * SPRITE_SIZE,
            row as f64 * SPRITE_SIZE,
            SPRITE_SIZE,
            SPRITE_SIZE,
        ),
    }
}

/// The built-in sheet: one animation family per row, one pose per column.
pub fn builtin_sprite_sheet() -> SpriteSheet {
    SpriteSheet {
        schema_version: 1,
        sprites: vec![
            cell("stand", 0, 0),
            cell("walk1", 1, 0),
            cell("walk2", 2, 0),
            cell("run1", 3, 0),
            cell("run2", 0, 1),
            cell("creep1", 1, 1),
            cell("creep2", 2, 1),
            cell("sit", 3, 1),
            cell("sit_look_up", 0, 2),
            cell("sprawl", 1, 2),
            cell("fall", 2, 2),
            cell("bounce", 3, 2),
            cell("jump", 0, 3),
            cell("dragged", 1, 3),
            cell("pinned", 2, 3),
            cell("carry_walk1", 3, 3),
            cell("carry_walk2", 0, 4),
            cell("carry_fall", 1, 4),
            cell("throw", 2, 4),
            cell("land", 3, 4),
        ],
    }
}
