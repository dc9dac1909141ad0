use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::geometry::{Rect, Vec2};
use crate::data::sprites::SPRITE_SIZE;
use crate::simulation::elements::ActiveElement;

/// Element-selection mode. Entered via the two zero-effect catalog actions;
/// they flip this state and nothing else.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub enum SelectionMode {
    #[default]
    Inactive,
    Throw,
    Jump,
}

/// Selection-mode state: the mode plus the element currently under the
/// cursor, tracked while the mode is active.
#[derive(Resource, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SelectionState {
    pub mode: SelectionMode,
    pub hovered: Option<ActiveElement>,
}

/// What completing the mode resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    /// No highlighted element; the mode cancels silently.
    Cancelled,
    Selected {
        element: ActiveElement,
        forced_action: String,
    },
}

impl SelectionState {
    pub fn enter(&mut self, mode: SelectionMode) {
        self.mode = mode;
        self.hovered = None;
    }

    /// Track the element under the cursor while the mode is active.
    pub fn hover(&mut self, element: Option<ActiveElement>) {
        if self.mode != SelectionMode::Inactive {
            self.hovered = element;
        }
    }

    /// Resolve the click that ends the mode. The mode resets regardless of
    /// outcome.
    pub fn complete(&mut self, character_x: f64, cursor: Vec2) -> SelectionOutcome {
        let mode = self.mode;
        let hovered = self.hovered.take();
        self.mode = SelectionMode::Inactive;

        let Some(element) = hovered else {
            return SelectionOutcome::Cancelled;
        };
        let forced_action = match mode {
            SelectionMode::Inactive => return SelectionOutcome::Cancelled,
            SelectionMode::Throw => throw_action(character_x, &element.rect),
            SelectionMode::Jump => jump_action(cursor, &element.rect),
        };
        SelectionOutcome::Selected {
            element,
            forced_action: forced_action.to_string(),
        }
    }
}

/// Throw approach side: whichever side of the element's center the
/// character currently stands on.
fn throw_action(character_x: f64, rect: &Rect) -> &'static str {
    if character_x + SPRITE_SIZE / 2.0 < rect.center_x() {
        "ThrowElementFromLeft"
    } else {
        "ThrowElementFromRight"
    }
}

/// Jump target edge: nearest of left/right/bottom to the cursor.
fn jump_action(cursor: Vec2, rect: &Rect) -> &'static str {
    let left = (cursor.x - rect.left()).abs();
    let right = (cursor.x - rect.right()).abs();
    let bottom = (cursor.y - rect.bottom()).abs();
    if left <= right && left <= bottom {
        "JumpFromLeftEdgeOfElement"
    } else if right <= bottom {
        "JumpFromRightEdgeOfElement"
    } else {
        "JumpFromBottomOfElement"
    }
}
