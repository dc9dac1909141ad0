use crate::components::geometry::{Rect, Vec2};
use crate::data::sprites::SPRITE_SIZE;

/// Tolerance for border membership tests.
const BORDER_EPSILON: f64 = 0.5;

/// The screen region the character moves in, expressed as four borders.
/// The floor sits one sprite cell above the viewport bottom so the anchor
/// (sprite top-left) rests with the sprite touching the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkArea {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub floor: f64,
}

impl WorkArea {
    pub fn from_viewport(width: f64, height: f64) -> Self {
        Self {
            left: 0.0,
            right: (width - SPRITE_SIZE).max(0.0),
            top: 0.0,
            floor: height - SPRITE_SIZE,
        }
    }

    pub fn on_floor(&self, anchor: Vec2) -> bool {
        (anchor.y - self.floor).abs() <= BORDER_EPSILON
    }

    pub fn on_ceiling(&self, anchor: Vec2) -> bool {
        (anchor.y - self.top).abs() <= BORDER_EPSILON
    }

    pub fn on_left_wall(&self, anchor: Vec2) -> bool {
        (anchor.x - self.left).abs() <= BORDER_EPSILON
    }

    pub fn on_right_wall(&self, anchor: Vec2) -> bool {
        (anchor.x - self.right).abs() <= BORDER_EPSILON
    }
}

/// Border view of the currently selected page element. When no element is
/// selected every membership test is false (`visible == false` stub).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementArea {
    pub visible: bool,
    pub rect: Rect,
}

impl ElementArea {
    pub fn stub() -> Self {
        Self::default()
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self {
            visible: true,
            rect,
        }
    }

    /// Anchor standing on the element's top edge. The anchor must sit one
    /// sprite cell above the edge and within the horizontal span.
    pub fn on_top(&self, anchor: Vec2) -> bool {
        self.visible
            && self.rect.spans_x(anchor.x + SPRITE_SIZE / 2.0)
            && (anchor.y + SPRITE_SIZE - self.rect.top()).abs() <= BORDER_EPSILON
    }

    pub fn on_left_edge(&self, anchor: Vec2) -> bool {
        self.visible && (anchor.x + SPRITE_SIZE - self.rect.left()).abs() <= BORDER_EPSILON
    }

    pub fn on_right_edge(&self, anchor: Vec2) -> bool {
        self.visible && (anchor.x - self.rect.right()).abs() <= BORDER_EPSILON
    }
}

/// Point-in-time read-only projection handed to condition and value
/// expressions. Built fresh for every evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MascotSnapshot {
    pub anchor: Vec2,
    pub velocity: Vec2,
    pub look_right: bool,
    pub cursor: Vec2,
    pub work_area: WorkArea,
    pub element: ElementArea,
}

impl MascotSnapshot {
    pub fn airborne(&self) -> bool {
        !self.work_area.on_floor(self.anchor)
            && !self.work_area.on_ceiling(self.anchor)
            && !self.element.on_top(self.anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_at(x: f64, y: f64) -> MascotSnapshot {
        MascotSnapshot {
            anchor: Vec2::new(x, y),
            velocity: Vec2::ZERO,
            look_right: true,
            cursor: Vec2::ZERO,
            work_area: WorkArea::from_viewport(1280.0, 720.0),
            element: ElementArea::stub(),
        }
    }

    #[test]
    fn floor_membership_uses_sprite_offset() {
        let snap = snapshot_at(100.0, 720.0 - SPRITE_SIZE);
        assert!(snap.work_area.on_floor(snap.anchor));
        assert!(!snap.airborne());

        let mid_air = snapshot_at(100.0, 300.0);
        assert!(!mid_air.work_area.on_floor(mid_air.anchor));
        assert!(mid_air.airborne());
    }

    #[test]
    fn stub_element_rejects_everything() {
        let stub = ElementArea::stub();
        let anchor = Vec2::new(100.0, 100.0);
        assert!(!stub.on_top(anchor));
        assert!(!stub.on_left_edge(anchor));
        assert!(!stub.on_right_edge(anchor));
    }

    #[test]
    fn element_top_requires_span_and_height() {
        let element = ElementArea::from_rect(Rect::new(200.0, 400.0, 300.0, 40.0));
        let standing = Vec2::new(300.0, 400.0 - SPRITE_SIZE);
        assert!(element.on_top(standing));
        let beside = Vec2::new(600.0, 400.0 - SPRITE_SIZE);
        assert!(!element.on_top(beside));
        let below = Vec2::new(300.0, 420.0);
        assert!(!element.on_top(below));
    }
}
