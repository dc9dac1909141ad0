use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::geometry::Vec2;
use crate::rules::context::WorkArea;

/// Current viewport dimensions, updated by the host on resize.
#[derive(Resource, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn work_area(&self) -> WorkArea {
        WorkArea::from_viewport(self.width, self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Last reported cursor position.
#[derive(Resource, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Cursor {
    pub position: Vec2,
}

/// Maximum per-axis fling speed handed to the falling state on drop.
const FLING_LIMIT: f64 = 40.0;

/// Drag/pin state. While either flag is set the stepper no-ops without
/// tearing down the tick loop.
#[derive(Resource, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DragState {
    pub dragging: bool,
    pub pinned: bool,
    prev_delta: Vec2,
    last_delta: Vec2,
}

impl DragState {
    pub fn begin(&mut self) {
        self.dragging = true;
        self.prev_delta = Vec2::ZERO;
        self.last_delta = Vec2::ZERO;
    }

    pub fn record_delta(&mut self, delta: Vec2) {
        self.prev_delta = self.last_delta;
        self.last_delta = delta;
    }

    /// Release velocity: the last two move deltas averaged and clamped.
    pub fn end(&mut self) -> Vec2 {
        self.dragging = false;
        let vx = (self.prev_delta.x + self.last_delta.x) / 2.0;
        let vy = (self.prev_delta.y + self.last_delta.y) / 2.0;
        Vec2::new(
            vx.clamp(-FLING_LIMIT, FLING_LIMIT),
            vy.clamp(-FLING_LIMIT, FLING_LIMIT),
        )
    }
}
