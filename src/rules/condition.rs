use serde::{Deserialize, Serialize};

use crate::core::rng::next_unit;
use crate::rules::context::MascotSnapshot;
use crate::rules::value::EvalError;

/// Predicate over the mascot snapshot. Conditions are plain data: the
/// catalogs carry them and the evaluator interprets them, so no executable
/// code ever lives inside the tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Always,
    Never,
    OnFloor,
    OnCeiling,
    OnLeftWall,
    OnRightWall,
    Airborne,
    ElementVisible,
    OnElementTop,
    OnElementLeftEdge,
    OnElementRightEdge,
    LookingRight,
    /// Cursor within the given distance of the anchor.
    CursorNear(f64),
    /// Cursor strictly above the anchor.
    CursorAbove,
    /// Random draw below the given probability.
    Chance(f64),
    Not(Box<Condition>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

impl Condition {
    fn check(&self, snap: &MascotSnapshot, rng: &mut u64) -> Result<bool, EvalError> {
        match self {
            Condition::Always => Ok(true),
            Condition::Never => Ok(false),
            Condition::OnFloor => Ok(snap.work_area.on_floor(snap.anchor)),
            Condition::OnCeiling => Ok(snap.work_area.on_ceiling(snap.anchor)),
            Condition::OnLeftWall => Ok(snap.work_area.on_left_wall(snap.anchor)),
            Condition::OnRightWall => Ok(snap.work_area.on_right_wall(snap.anchor)),
            Condition::Airborne => Ok(snap.airborne()),
            Condition::ElementVisible => Ok(snap.element.visible),
            Condition::OnElementTop => Ok(snap.element.on_top(snap.anchor)),
            Condition::OnElementLeftEdge => Ok(snap.element.on_left_edge(snap.anchor)),
            Condition::OnElementRightEdge => Ok(snap.element.on_right_edge(snap.anchor)),
            Condition::LookingRight => Ok(snap.look_right),
            Condition::CursorNear(radius) => {
                if !radius.is_finite() {
                    return Err(EvalError::NonFinite("CursorNear radius"));
                }
                let dx = snap.cursor.x - snap.anchor.x;
                let dy = snap.cursor.y - snap.anchor.y;
                Ok(dx * dx + dy * dy <= radius * radius)
            }
            Condition::CursorAbove => Ok(snap.cursor.y < snap.anchor.y),
            Condition::Chance(probability) => {
                if !probability.is_finite() {
                    return Err(EvalError::NonFinite("Chance probability"));
                }
                Ok(next_unit(rng) < *probability)
            }
            Condition::Not(inner) => Ok(!inner.check(snap, rng)?),
            Condition::All(items) => {
                for item in items {
                    if !item.check(snap, rng)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Any(items) => {
                for item in items {
                    if item.check(snap, rng)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

/// Fail-closed evaluation: a faulting condition counts as false so the
/// stepper never crashes mid-tick over a bad data entry.
pub fn eval_condition(condition: &Condition, snap: &MascotSnapshot, rng: &mut u64) -> bool {
    match condition.check(snap, rng) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("condition evaluation failed ({}), treating as false", err);
            false
        }
    }
}

/// All conditions must hold; an empty list always passes.
pub fn eval_all(conditions: &[Condition], snap: &MascotSnapshot, rng: &mut u64) -> bool {
    conditions
        .iter()
        .all(|condition| eval_condition(condition, snap, rng))
}
