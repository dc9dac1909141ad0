use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::geometry::{Rect, Vec2};
use crate::rules::context::{ElementArea, MascotSnapshot, WorkArea};

/// Transient parameters evaluated when a leaf action is entered. Cleared on
/// every action transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionContext {
    pub evaluated_duration: Option<u32>,
    pub evaluated_target_x: Option<f64>,
    pub evaluated_target_y: Option<f64>,
}

/// A page element currently attached to and moved with the character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarriedElement {
    pub id: u32,
    pub rect: Rect,
    pub offset_x: f64,
    pub offset_y: f64,
}

/// Position within a `Select` branch of the governing sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectCursor {
    pub step_index: usize,
    pub branch: usize,
    pub position: usize,
}

/// The mutable entity driving everything. Created once at engine creation
/// with the default falling state; mutated once per step by the stepper and
/// never destroyed.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub look_right: bool,
    /// Current leaf action.
    pub action_name: String,
    /// Governing behavior (top-level action) name.
    pub behavior_name: String,
    /// Ticks elapsed in the current action.
    pub action_frame: u32,
    /// Index into the governing sequence's step list.
    pub sequence_frame: usize,
    pub select_cursor: Option<SelectCursor>,
    /// Currently resolved sprite id.
    pub sprite: String,
    pub action_context: ActionContext,
    pub carried_element: Option<CarriedElement>,
}

impl CharacterState {
    /// Default mount state: falling in from the top of the viewport.
    pub fn new(viewport_width: f64) -> Self {
        Self {
            position: Vec2::new(viewport_width / 2.0, 0.0),
            velocity: Vec2::ZERO,
            look_right: false,
            action_name: "Falling".to_string(),
            behavior_name: "Fall".to_string(),
            action_frame: 0,
            sequence_frame: 0,
            select_cursor: None,
            sprite: "fall".to_string(),
            action_context: ActionContext::default(),
            carried_element: None,
        }
    }

    /// Point-in-time projection consumed by conditions and value
    /// expressions.
    pub fn snapshot(
        &self,
        work_area: WorkArea,
        cursor: Vec2,
        element: ElementArea,
    ) -> MascotSnapshot {
        MascotSnapshot {
            anchor: self.position,
            velocity: self.velocity,
            look_right: self.look_right,
            cursor,
            work_area,
            element,
        }
    }

    /// Reset transition bookkeeping when a new leaf action begins.
    pub fn reset_action(&mut self, name: &str) {
        self.action_name = name.to_string();
        self.action_frame = 0;
        self.action_context = ActionContext::default();
    }
}

impl Default for CharacterState {
    fn default() -> Self {
        Self::new(1280.0)
    }
}
