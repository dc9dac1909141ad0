use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::geometry::Rect;

/// A user-chosen page element currently treated as a physical platform or
/// prop. Consumed (cleared) when the character picks it up or throws it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveElement {
    pub id: u32,
    pub rect: Rect,
}

/// Slot holding the selected element, if any.
#[derive(Resource, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ActiveElementSlot(pub Option<ActiveElement>);

/// Presentation commands emitted by the core and consumed by the host
/// rendering layer. The core never touches host presentation state
/// directly; ownership of the element's on-page style is handed over and
/// back through these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderCommand {
    /// Element picked up: host reparents it to fixed positioning at max
    /// z-index.
    Attach { id: u32, rect: Rect },
    /// Per-tick reposition of a carried or thrown element.
    Move { id: u32, rect: Rect },
    /// Element released: host restores the original inline styles.
    Release { id: u32, rect: Rect },
    /// Thrown element left the viewport; host removes its marker.
    Remove { id: u32 },
}

/// Commands produced this tick, drained into every snapshot.
#[derive(Resource, Debug, Default)]
pub struct RenderLog(pub Vec<RenderCommand>);

/// Warnings and transition notes produced this tick, drained into every
/// snapshot.
#[derive(Resource, Debug, Default)]
pub struct EngineLog(pub Vec<String>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_starts_empty() {
        let slot = ActiveElementSlot::default();
        assert!(slot.0.is_none());
    }
}
