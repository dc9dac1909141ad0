use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::geometry::Rect;

/// Stable identifier for addressing page elements externally.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementId(pub u32);

/// A former carried element flying under its own projectile physics.
///
/// Spawned as an entity when the character throws, integrated every tick
/// independent of the character, despawned once it leaves the viewport.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThrownBody {
    pub rect: Rect,
    pub vx: f64,
    pub vy: f64,
    pub gravity: f64,
}

impl ThrownBody {
    /// Advance one tick of projectile motion.
    pub fn integrate(&mut self) {
        self.rect.x += self.vx;
        self.rect.y += self.vy;
        self.vy += self.gravity;
    }

    /// True once the rect has fallen past the bottom of the viewport.
    pub fn is_offscreen(&self, viewport_height: f64) -> bool {
        self.rect.y > viewport_height + self.rect.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrate_applies_gravity() {
        let mut body = ThrownBody {
            rect: Rect::new(0.0, 0.0, 40.0, 20.0),
            vx: 5.0,
            vy: -10.0,
            gravity: 0.5,
        };
        body.integrate();
        assert_eq!(body.rect.x, 5.0);
        assert_eq!(body.rect.y, -10.0);
        assert_eq!(body.vy, -9.5);
    }

    #[test]
    fn offscreen_threshold_includes_height() {
        let body = ThrownBody {
            rect: Rect::new(0.0, 741.0, 40.0, 20.0),
            vx: 0.0,
            vy: 0.0,
            gravity: 0.5,
        };
        assert!(body.is_offscreen(720.0));
        let above = ThrownBody {
            rect: Rect::new(0.0, 739.0, 40.0, 20.0),
            ..body
        };
        assert!(!above.is_offscreen(720.0));
    }
}
