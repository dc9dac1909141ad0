use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::components::geometry::Vec2;
use crate::data::sprites::{SpriteSheet, SPRITE_SIZE};
use crate::rules::condition::Condition;
use crate::rules::value::ValueExpr;

/// One animation frame: sprite, per-tick displacement while the pose is
/// active, and how many ticks the pose holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pose {
    pub sprite: String,
    #[serde(default)]
    pub velocity: Vec2,
    pub duration: u32,
}

/// Ordered poses plus an optional gate selecting among alternative
/// animations for the same action (first passing gate wins, default first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationDef {
    #[serde(default)]
    pub condition: Option<Condition>,
    pub poses: Vec<Pose>,
}

impl AnimationDef {
    pub fn total_duration(&self) -> u32 {
        self.poses.iter().map(|pose| pose.duration).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    Stay,
    Move,
    Animate,
    Embedded,
    Sequence,
}

/// Physics/behavior archetype selecting which integration branch applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbedType {
    Fall,
    Jump,
    Dragged,
    WalkWithElement,
    FallWithElement,
    ThrowElement,
    SelectElement,
    SelectEdge,
    Regist,
}

/// Declarative surface tag. Informative only; no separate validator
/// enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BorderType {
    Floor,
    Wall,
    Ceiling,
}

/// Embed parameters, each a literal or a dynamic expression evaluated
/// against the snapshot at the moment the owning action (or step) begins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionParams {
    #[serde(default)]
    pub gravity: Option<ValueExpr>,
    #[serde(default)]
    pub resistance_x: Option<ValueExpr>,
    #[serde(default)]
    pub resistance_y: Option<ValueExpr>,
    #[serde(default)]
    pub velocity: Option<ValueExpr>,
    #[serde(default)]
    pub initial_vx: Option<ValueExpr>,
    #[serde(default)]
    pub initial_vy: Option<ValueExpr>,
    #[serde(default)]
    pub offset_x: Option<ValueExpr>,
    #[serde(default)]
    pub offset_y: Option<ValueExpr>,
    #[serde(default)]
    pub duration: Option<ValueExpr>,
    #[serde(default)]
    pub target_x: Option<ValueExpr>,
    #[serde(default)]
    pub target_y: Option<ValueExpr>,
}

impl ActionParams {
    /// Step-level overrides win over the referenced action's own params.
    pub fn merged_over(&self, base: &ActionParams) -> ActionParams {
        ActionParams {
            gravity: self.gravity.clone().or_else(|| base.gravity.clone()),
            resistance_x: self
                .resistance_x
                .clone()
                .or_else(|| base.resistance_x.clone()),
            resistance_y: self
                .resistance_y
                .clone()
                .or_else(|| base.resistance_y.clone()),
            velocity: self.velocity.clone().or_else(|| base.velocity.clone()),
            initial_vx: self.initial_vx.clone().or_else(|| base.initial_vx.clone()),
            initial_vy: self.initial_vy.clone().or_else(|| base.initial_vy.clone()),
            offset_x: self.offset_x.clone().or_else(|| base.offset_x.clone()),
            offset_y: self.offset_y.clone().or_else(|| base.offset_y.clone()),
            duration: self.duration.clone().or_else(|| base.duration.clone()),
            target_x: self.target_x.clone().or_else(|| base.target_x.clone()),
            target_y: self.target_y.clone().or_else(|| base.target_y.clone()),
        }
    }
}

/// First-matching-condition branch inside a sequence. Branch steps are
/// plain action references; selects do not nest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectBranch {
    #[serde(default)]
    pub condition: Option<Condition>,
    pub steps: Vec<SequenceStep>,
}

/// One step of a sequence: either an action reference with optional
/// parameter overrides, or a `Select` over branches (exactly one of
/// `action` / `select` is set; `validate` enforces this).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SequenceStep {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub overrides: ActionParams,
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub select: Vec<SelectBranch>,
}

impl SequenceStep {
    pub fn of(action: &str) -> Self {
        SequenceStep {
            action: Some(action.to_string()),
            ..SequenceStep::default()
        }
    }

    pub fn with_overrides(action: &str, overrides: ActionParams) -> Self {
        SequenceStep {
            action: Some(action.to_string()),
            overrides,
            ..SequenceStep::default()
        }
    }

    pub fn select(branches: Vec<SelectBranch>) -> Self {
        SequenceStep {
            select: branches,
            ..SequenceStep::default()
        }
    }

    pub fn is_select(&self) -> bool {
        !self.select.is_empty()
    }
}

/// Named unit of character behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDef {
    pub name: String,
    pub action_type: ActionType,
    #[serde(default)]
    pub embed: Option<EmbedType>,
    #[serde(default)]
    pub border: Option<BorderType>,
    #[serde(default)]
    pub animations: Vec<AnimationDef>,
    #[serde(default)]
    pub params: ActionParams,
    #[serde(default)]
    pub steps: Vec<SequenceStep>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionCatalog {
    pub schema_version: u32,
    pub actions: Vec<ActionDef>,
}

#[derive(Debug)]
pub enum ActionDataError {
    Validation(String),
}

impl std::fmt::Display for ActionDataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionDataError::Validation(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ActionDataError {}

impl ActionCatalog {
    pub fn get(&self, name: &str) -> Option<&ActionDef> {
        self.actions.iter().find(|action| action.name == name)
    }

    pub fn validate(&self) -> Result<(), ActionDataError> {
        let mut names = HashSet::new();
        for action in &self.actions {
            if action.name.trim().is_empty() {
                return Err(ActionDataError::Validation(
                    "action name cannot be empty".to_string(),
                ));
            }
            if !names.insert(action.name.clone()) {
                return Err(ActionDataError::Validation(format!(
                    "duplicate action name {}",
                    action.name
                )));
            }
        }
        for action in &self.actions {
            self.validate_action(action)?;
        }
        Ok(())
    }

    fn validate_action(&self, action: &ActionDef) -> Result<(), ActionDataError> {
        let selection_trigger = matches!(
            action.embed,
            Some(EmbedType::SelectElement) | Some(EmbedType::SelectEdge)
        );
        if action.action_type == ActionType::Sequence {
            if action.steps.is_empty() {
                return Err(ActionDataError::Validation(format!(
                    "sequence action {} has no steps",
                    action.name
                )));
            }
            for step in &action.steps {
                self.validate_step(&action.name, step, true)?;
            }
        } else if action.animations.is_empty() && !selection_trigger {
            return Err(ActionDataError::Validation(format!(
                "action {} has no animations",
                action.name
            )));
        }
        for animation in &action.animations {
            if animation.poses.is_empty() {
                return Err(ActionDataError::Validation(format!(
                    "action {} has an animation with no poses",
                    action.name
                )));
            }
            if animation.total_duration() == 0 {
                return Err(ActionDataError::Validation(format!(
                    "action {} has a zero-duration animation",
                    action.name
                )));
            }
        }
        Ok(())
    }

    fn validate_step(
        &self,
        owner: &str,
        step: &SequenceStep,
        allow_select: bool,
    ) -> Result<(), ActionDataError> {
        match (&step.action, step.is_select()) {
            (Some(_), true) | (None, false) => {
                return Err(ActionDataError::Validation(format!(
                    "sequence {} has a step that must set exactly one of action/select",
                    owner
                )));
            }
            (Some(name), false) => {
                let Some(target) = self.get(name) else {
                    return Err(ActionDataError::Validation(format!(
                        "sequence {} references unknown action {}",
                        owner, name
                    )));
                };
                if target.action_type == ActionType::Sequence {
                    return Err(ActionDataError::Validation(format!(
                        "sequence {} step {} references another sequence",
                        owner, name
                    )));
                }
            }
            (None, true) => {
                if !allow_select {
                    return Err(ActionDataError::Validation(format!(
                        "sequence {} nests a select inside a select branch",
                        owner
                    )));
                }
                for branch in &step.select {
                    if branch.steps.is_empty() {
                        return Err(ActionDataError::Validation(format!(
                            "sequence {} has a select branch with no steps",
                            owner
                        )));
                    }
                    for inner in &branch.steps {
                        self.validate_step(owner, inner, false)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Cross-check pose sprite references against the sheet.
    pub fn validate_sprites(&self, sheet: &SpriteSheet) -> Result<(), ActionDataError> {
        for action in &self.actions {
            for animation in &action.animations {
                for pose in &animation.poses {
                    if !sheet.contains(&pose.sprite) {
                        return Err(ActionDataError::Validation(format!(
                            "action {} references unknown sprite {}",
                            action.name, pose.sprite
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn pose(sprite: &str, vx: f64, duration: u32) -> Pose {
    Pose {
        sprite: sprite.to_string(),
        velocity: Vec2::new(vx, 0.0),
        duration,
    }
}

fn animation(poses: Vec<Pose>) -> AnimationDef {
    AnimationDef {
        condition: None,
        poses,
    }
}

fn gated(condition: Condition, poses: Vec<Pose>) -> AnimationDef {
    AnimationDef {
        condition: Some(condition),
        poses,
    }
}

fn stay(name: &str, sprite: &str, duration: u32) -> ActionDef {
    ActionDef {
        name: name.to_string(),
        action_type: ActionType::Stay,
        embed: None,
        border: Some(BorderType::Floor),
        animations: vec![animation(vec![pose(sprite, 0.0, duration)])],
        params: ActionParams::default(),
        steps: Vec::new(),
    }
}

fn sequence(name: &str, steps: Vec<SequenceStep>) -> ActionDef {
    ActionDef {
        name: name.to_string(),
        action_type: ActionType::Sequence,
        embed: None,
        border: None,
        animations: Vec::new(),
        params: ActionParams::default(),
        steps,
    }
}

fn c(value: f64) -> ValueExpr {
    ValueExpr::Const(value)
}

/// The built-in action catalog.
pub fn builtin_action_catalog() -> ActionCatalog {
    let half = SPRITE_SIZE / 2.0;
    ActionCatalog {
        schema_version: 1,
        actions: vec![
            stay("Stand", "stand", 50),
            stay("Sit", "sit", 80),
            stay("Sprawl", "sprawl", 80),
            stay("SitAndLookUp", "sit_look_up", 60),
            ActionDef {
                name: "SitAndLookAtMouse".to_string(),
                action_type: ActionType::Stay,
                embed: None,
                border: Some(BorderType::Floor),
                animations: vec![
                    gated(
                        Condition::CursorAbove,
                        vec![pose("sit_look_up", 0.0, 60)],
                    ),
                    animation(vec![pose("sit", 0.0, 60)]),
                ],
                params: ActionParams::default(),
                steps: Vec::new(),
            },
            ActionDef {
                name: "Walk".to_string(),
                action_type: ActionType::Move,
                embed: None,
                border: Some(BorderType::Floor),
                animations: vec![animation(vec![
                    pose("walk1", 2.0, 4),
                    pose("walk2", 2.0, 4),
                ])],
                params: ActionParams::default(),
                steps: Vec::new(),
            },
            ActionDef {
                name: "Run".to_string(),
                action_type: ActionType::Move,
                embed: None,
                border: Some(BorderType::Floor),
                animations: vec![animation(vec![
                    pose("run1", 6.0, 2),
                    pose("run2", 6.0, 2),
                ])],
                params: ActionParams::default(),
                steps: Vec::new(),
            },
            ActionDef {
                name: "Creep".to_string(),
                action_type: ActionType::Move,
                embed: None,
                border: Some(BorderType::Floor),
                animations: vec![animation(vec![
                    pose("creep1", 1.0, 6),
                    pose("creep2", 1.0, 6),
                ])],
                params: ActionParams::default(),
                steps: Vec::new(),
            },
            ActionDef {
                name: "Falling".to_string(),
                action_type: ActionType::Embedded,
                embed: Some(EmbedType::Fall),
                border: None,
                animations: vec![animation(vec![pose("fall", 0.0, 250)])],
                params: ActionParams {
                    gravity: Some(c(2.0)),
                    resistance_x: Some(c(0.1)),
                    resistance_y: Some(c(0.0)),
                    ..ActionParams::default()
                },
                steps: Vec::new(),
            },
            ActionDef {
                name: "Jumping".to_string(),
                action_type: ActionType::Embedded,
                embed: Some(EmbedType::Jump),
                border: None,
                animations: vec![animation(vec![pose("jump", 0.0, 100)])],
                params: ActionParams {
                    velocity: Some(c(20.0)),
                    ..ActionParams::default()
                },
                steps: Vec::new(),
            },
            ActionDef {
                name: "Dragged".to_string(),
                action_type: ActionType::Embedded,
                embed: Some(EmbedType::Dragged),
                border: None,
                animations: vec![animation(vec![pose("dragged", 0.0, 250)])],
                params: ActionParams::default(),
                steps: Vec::new(),
            },
            ActionDef {
                name: "Pinned".to_string(),
                action_type: ActionType::Embedded,
                embed: Some(EmbedType::Regist),
                border: None,
                animations: vec![animation(vec![pose("pinned", 0.0, 250)])],
                params: ActionParams::default(),
                steps: Vec::new(),
            },
            ActionDef {
                name: "WalkWithElement".to_string(),
                action_type: ActionType::Embedded,
                embed: Some(EmbedType::WalkWithElement),
                border: Some(BorderType::Floor),
                animations: vec![animation(vec![
                    pose("carry_walk1", 2.0, 4),
                    pose("carry_walk2", 2.0, 4),
                ])],
                params: ActionParams {
                    offset_x: Some(c(half)),
                    offset_y: Some(c(-40.0)),
                    ..ActionParams::default()
                },
                steps: Vec::new(),
            },
            ActionDef {
                name: "FallWithElement".to_string(),
                action_type: ActionType::Embedded,
                embed: Some(EmbedType::FallWithElement),
                border: None,
                animations: vec![animation(vec![pose("carry_fall", 0.0, 250)])],
                params: ActionParams {
                    gravity: Some(c(2.0)),
                    resistance_x: Some(c(0.1)),
                    resistance_y: Some(c(0.0)),
                    offset_x: Some(c(half)),
                    offset_y: Some(c(-40.0)),
                    ..ActionParams::default()
                },
                steps: Vec::new(),
            },
            ActionDef {
                name: "ThrowElement".to_string(),
                action_type: ActionType::Embedded,
                embed: Some(EmbedType::ThrowElement),
                border: None,
                animations: vec![animation(vec![pose("throw", 0.0, 10)])],
                params: ActionParams {
                    initial_vx: Some(c(25.0)),
                    initial_vy: Some(c(-15.0)),
                    gravity: Some(c(0.5)),
                    ..ActionParams::default()
                },
                steps: Vec::new(),
            },
            ActionDef {
                name: "SelectElement".to_string(),
                action_type: ActionType::Embedded,
                embed: Some(EmbedType::SelectElement),
                border: None,
                animations: Vec::new(),
                params: ActionParams::default(),
                steps: Vec::new(),
            },
            ActionDef {
                name: "SelectEdge".to_string(),
                action_type: ActionType::Embedded,
                embed: Some(EmbedType::SelectEdge),
                border: None,
                animations: Vec::new(),
                params: ActionParams::default(),
                steps: Vec::new(),
            },
            sequence("Fall", vec![SequenceStep::of("Falling")]),
            sequence(
                "WalkAndSit",
                vec![
                    SequenceStep::with_overrides(
                        "Walk",
                        ActionParams {
                            target_x: Some(ValueExpr::Mul(
                                Box::new(ValueExpr::Random { min: 0.1, max: 0.9 }),
                                Box::new(ValueExpr::WorkAreaRight),
                            )),
                            ..ActionParams::default()
                        },
                    ),
                    SequenceStep::with_overrides(
                        "Sit",
                        ActionParams {
                            duration: Some(c(120.0)),
                            ..ActionParams::default()
                        },
                    ),
                ],
            ),
            sequence(
                "WalkAndSettle",
                vec![
                    SequenceStep::with_overrides(
                        "Walk",
                        ActionParams {
                            target_x: Some(ValueExpr::Mul(
                                Box::new(ValueExpr::Random { min: 0.1, max: 0.9 }),
                                Box::new(ValueExpr::WorkAreaRight),
                            )),
                            ..ActionParams::default()
                        },
                    ),
                    SequenceStep::select(vec![
                        SelectBranch {
                            condition: Some(Condition::CursorNear(300.0)),
                            steps: vec![SequenceStep::of("SitAndLookAtMouse")],
                        },
                        SelectBranch {
                            condition: None,
                            steps: vec![
                                SequenceStep::of("Sit"),
                                SequenceStep::of("SitAndLookUp"),
                            ],
                        },
                    ]),
                ],
            ),
            sequence(
                "ChaseMouse",
                vec![
                    SequenceStep::with_overrides(
                        "Walk",
                        ActionParams {
                            target_x: Some(ValueExpr::CursorX),
                            ..ActionParams::default()
                        },
                    ),
                    SequenceStep::of("SitAndLookAtMouse"),
                ],
            ),
            sequence(
                "ThrowElementFromLeft",
                vec![
                    SequenceStep::with_overrides(
                        "Walk",
                        ActionParams {
                            target_x: Some(ValueExpr::Sub(
                                Box::new(ValueExpr::ElementLeft),
                                Box::new(c(SPRITE_SIZE)),
                            )),
                            ..ActionParams::default()
                        },
                    ),
                    SequenceStep::with_overrides(
                        "WalkWithElement",
                        ActionParams {
                            duration: Some(c(40.0)),
                            ..ActionParams::default()
                        },
                    ),
                    SequenceStep::of("ThrowElement"),
                ],
            ),
            sequence(
                "ThrowElementFromRight",
                vec![
                    SequenceStep::with_overrides(
                        "Walk",
                        ActionParams {
                            target_x: Some(ValueExpr::ElementRight),
                            ..ActionParams::default()
                        },
                    ),
                    SequenceStep::with_overrides(
                        "WalkWithElement",
                        ActionParams {
                            duration: Some(c(40.0)),
                            ..ActionParams::default()
                        },
                    ),
                    SequenceStep::of("ThrowElement"),
                ],
            ),
            sequence(
                "JumpFromLeftEdgeOfElement",
                vec![
                    SequenceStep::with_overrides(
                        "Jumping",
                        ActionParams {
                            target_x: Some(ValueExpr::Sub(
                                Box::new(ValueExpr::ElementLeft),
                                Box::new(c(half)),
                            )),
                            target_y: Some(ValueExpr::Sub(
                                Box::new(ValueExpr::ElementTop),
                                Box::new(c(SPRITE_SIZE)),
                            )),
                            ..ActionParams::default()
                        },
                    ),
                    SequenceStep::of("Stand"),
                ],
            ),
            sequence(
                "JumpFromRightEdgeOfElement",
                vec![
                    SequenceStep::with_overrides(
                        "Jumping",
                        ActionParams {
                            target_x: Some(ValueExpr::Sub(
                                Box::new(ValueExpr::ElementRight),
                                Box::new(c(half)),
                            )),
                            target_y: Some(ValueExpr::Sub(
                                Box::new(ValueExpr::ElementTop),
                                Box::new(c(SPRITE_SIZE)),
                            )),
                            ..ActionParams::default()
                        },
                    ),
                    SequenceStep::of("Stand"),
                ],
            ),
            sequence(
                "JumpFromBottomOfElement",
                vec![
                    SequenceStep::with_overrides(
                        "Jumping",
                        ActionParams {
                            target_x: Some(ValueExpr::Sub(
                                Box::new(ValueExpr::ElementCenterX),
                                Box::new(c(half)),
                            )),
                            target_y: Some(ValueExpr::ElementBottom),
                            ..ActionParams::default()
                        },
                    ),
                    SequenceStep::of("Falling"),
                ],
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sprites::builtin_sprite_sheet;

    #[test]
    fn builtin_catalog_validates() {
        let catalog = builtin_action_catalog();
        catalog.validate().expect("builtin catalog must validate");
        catalog
            .validate_sprites(&builtin_sprite_sheet())
            .expect("builtin sprite refs must resolve");
    }

    #[test]
    fn step_overrides_win_on_merge() {
        let base = ActionParams {
            gravity: Some(ValueExpr::Const(2.0)),
            duration: Some(ValueExpr::Const(10.0)),
            ..ActionParams::default()
        };
        let step = ActionParams {
            duration: Some(ValueExpr::Const(40.0)),
            ..ActionParams::default()
        };
        let merged = step.merged_over(&base);
        assert_eq!(merged.duration, Some(ValueExpr::Const(40.0)));
        assert_eq!(merged.gravity, Some(ValueExpr::Const(2.0)));
    }

    #[test]
    fn unknown_step_reference_rejected() {
        let mut catalog = builtin_action_catalog();
        catalog
            .actions
            .push(sequence("Broken", vec![SequenceStep::of("NoSuchAction")]));
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn step_must_pick_action_or_select() {
        let mut catalog = builtin_action_catalog();
        catalog
            .actions
            .push(sequence("Empty", vec![SequenceStep::default()]));
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn selection_triggers_need_no_animations() {
        let catalog = builtin_action_catalog();
        let select = catalog.get("SelectElement").unwrap();
        assert!(select.animations.is_empty());
        assert_eq!(select.embed, Some(EmbedType::SelectElement));
    }

    #[test]
    fn sequences_resolve_to_leaves_only() {
        let catalog = builtin_action_catalog();
        for action in &catalog.actions {
            for step in &action.steps {
                if let Some(name) = &step.action {
                    let target = catalog.get(name).unwrap();
                    assert_ne!(target.action_type, ActionType::Sequence);
                }
            }
        }
    }
}
