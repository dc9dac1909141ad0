use serde::{Deserialize, Serialize};

use crate::core::rng::next_unit;
use crate::rules::context::MascotSnapshot;

/// Numeric expression evaluated against the mascot snapshot. Action and
/// sequence parameters (duration, targets, launch velocities) are stored as
/// these so a step can be re-evaluated against the state at the moment the
/// step begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueExpr {
    Const(f64),
    /// Uniform draw in `[min, max)`.
    Random { min: f64, max: f64 },
    CursorX,
    CursorY,
    AnchorX,
    AnchorY,
    VelocityX,
    VelocityY,
    WorkAreaLeft,
    WorkAreaRight,
    FloorY,
    ElementLeft,
    ElementRight,
    ElementTop,
    ElementBottom,
    ElementCenterX,
    Add(Box<ValueExpr>, Box<ValueExpr>),
    Sub(Box<ValueExpr>, Box<ValueExpr>),
    Mul(Box<ValueExpr>, Box<ValueExpr>),
    Neg(Box<ValueExpr>),
}

#[derive(Debug)]
pub enum EvalError {
    /// An element accessor was evaluated with no element selected.
    MissingElement(&'static str),
    /// A literal or an intermediate result was NaN or infinite.
    NonFinite(&'static str),
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::MissingElement(what) => {
                write!(f, "{} requires a selected element", what)
            }
            EvalError::NonFinite(what) => write!(f, "{} is not finite", what),
        }
    }
}

impl std::error::Error for EvalError {}

impl ValueExpr {
    fn compute(&self, snap: &MascotSnapshot, rng: &mut u64) -> Result<f64, EvalError> {
        let value = match self {
            ValueExpr::Const(value) => *value,
            ValueExpr::Random { min, max } => min + next_unit(rng) * (max - min),
            ValueExpr::CursorX => snap.cursor.x,
            ValueExpr::CursorY => snap.cursor.y,
            ValueExpr::AnchorX => snap.anchor.x,
            ValueExpr::AnchorY => snap.anchor.y,
            ValueExpr::VelocityX => snap.velocity.x,
            ValueExpr::VelocityY => snap.velocity.y,
            ValueExpr::WorkAreaLeft => snap.work_area.left,
            ValueExpr::WorkAreaRight => snap.work_area.right,
            ValueExpr::FloorY => snap.work_area.floor,
            ValueExpr::ElementLeft => self.element_field(snap, |r| r.left())?,
            ValueExpr::ElementRight => self.element_field(snap, |r| r.right())?,
            ValueExpr::ElementTop => self.element_field(snap, |r| r.top())?,
            ValueExpr::ElementBottom => self.element_field(snap, |r| r.bottom())?,
            ValueExpr::ElementCenterX => self.element_field(snap, |r| r.center_x())?,
            ValueExpr::Add(a, b) => a.compute(snap, rng)? + b.compute(snap, rng)?,
            ValueExpr::Sub(a, b) => a.compute(snap, rng)? - b.compute(snap, rng)?,
            ValueExpr::Mul(a, b) => a.compute(snap, rng)? * b.compute(snap, rng)?,
            ValueExpr::Neg(inner) => -inner.compute(snap, rng)?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvalError::NonFinite("expression result"))
        }
    }

    fn element_field(
        &self,
        snap: &MascotSnapshot,
        field: impl Fn(&crate::components::geometry::Rect) -> f64,
    ) -> Result<f64, EvalError> {
        if snap.element.visible {
            Ok(field(&snap.element.rect))
        } else {
            Err(EvalError::MissingElement("element accessor"))
        }
    }
}

/// Evaluate to a number, or `None` when the expression faults. The caller
/// treats an absent value the same as an unset parameter, keeping the tick
/// loop alive through bad data.
pub fn eval_value(expr: &ValueExpr, snap: &MascotSnapshot, rng: &mut u64) -> Option<f64> {
    match expr.compute(snap, rng) {
        Ok(value) => Some(value),
        Err(err) => {
            eprintln!("value evaluation failed ({}), treating as unset", err);
            None
        }
    }
}

/// Evaluate an optional parameter slot.
pub fn eval_opt(expr: &Option<ValueExpr>, snap: &MascotSnapshot, rng: &mut u64) -> Option<f64> {
    expr.as_ref().and_then(|expr| eval_value(expr, snap, rng))
}
