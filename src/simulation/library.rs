use bevy_ecs::prelude::*;

use crate::data::actions::{builtin_action_catalog, ActionCatalog, ActionDef};
use crate::data::behaviors::{
    builtin_behavior_catalog, load_behavior_catalog, BehaviorCatalog,
};
use crate::data::sprites::{builtin_sprite_sheet, SpriteSheet};

const DEFAULT_BEHAVIORS_PATH: &str = "./assets/data/behaviors.json";

/// The three static tables the stepper reads every tick.
#[derive(Resource, Debug, Clone, Default)]
pub struct MascotLibrary {
    pub sprites: SpriteSheet,
    pub actions: ActionCatalog,
    pub behaviors: BehaviorCatalog,
}

impl MascotLibrary {
    pub fn builtin() -> Self {
        Self {
            sprites: builtin_sprite_sheet(),
            actions: builtin_action_catalog(),
            behaviors: builtin_behavior_catalog(),
        }
    }

    /// Built-in tables with the behavior table optionally overridden from
    /// the default JSON path. A missing or invalid file falls back to the
    /// built-in table.
    pub fn load_default() -> Self {
        let mut library = Self::builtin();
        match load_behavior_catalog(DEFAULT_BEHAVIORS_PATH) {
            Ok(behaviors) => {
                if let Err(err) = behaviors.validate_actions(&library.actions) {
                    eprintln!(
                        "Behavior override from {} rejected: {}",
                        DEFAULT_BEHAVIORS_PATH, err
                    );
                } else {
                    library.behaviors = behaviors;
                }
            }
            Err(err) => {
                eprintln!(
                    "Failed to load behaviors from {}: {}",
                    DEFAULT_BEHAVIORS_PATH, err
                );
            }
        }
        library
    }

    pub fn action(&self, name: &str) -> Option<&ActionDef> {
        self.actions.get(name)
    }
}
