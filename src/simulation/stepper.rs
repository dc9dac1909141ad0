use crate::components::element::ThrownBody;
use crate::components::geometry::{Rect, Vec2};
use crate::data::actions::{
    ActionDef, ActionParams, ActionType, AnimationDef, EmbedType, Pose, SequenceStep,
};
use crate::data::sprites::SPRITE_SIZE;
use crate::rules::condition::eval_condition;
use crate::rules::context::{ElementArea, MascotSnapshot};
use crate::rules::value::eval_opt;
use crate::simulation::character::{CarriedElement, CharacterState, SelectCursor};
use crate::simulation::elements::{ActiveElementSlot, RenderCommand};
use crate::simulation::environment::Viewport;
use crate::simulation::library::MascotLibrary;
use crate::simulation::physics::{
    fall_step, is_static_action, jump_crossed_target, jump_entry_velocity, resolve_collisions,
    DEFAULT_FRICTION, DEFAULT_LAUNCH, GRAVITY_STEP,
};
use crate::simulation::selector::select_next_behavior;

/// Known-safe substitute for unknown or animation-less actions.
pub const FALLBACK_ACTION: &str = "Falling";

/// Default throw parameters when the action supplies none.
const DEFAULT_THROW_VX: f64 = 25.0;
const DEFAULT_THROW_VY: f64 = -15.0;

/// Default carry offsets when the action supplies none.
const DEFAULT_CARRY_OFFSET_X: f64 = SPRITE_SIZE / 2.0;
const DEFAULT_CARRY_OFFSET_Y: f64 = -40.0;

/// Tolerance below which a walk target counts as reached.
const TARGET_EPSILON: f64 = 0.5;

/// Side effects of one step, handed to the ECS layer: projectile spawns
/// and presentation commands for the host.
#[derive(Debug, Default)]
pub struct StepEffects {
    pub thrown: Vec<(u32, ThrownBody)>,
    pub commands: Vec<RenderCommand>,
}

fn element_area(active: &ActiveElementSlot) -> ElementArea {
    match active.0 {
        Some(element) => ElementArea::from_rect(element.rect),
        None => ElementArea::stub(),
    }
}

/// First animation whose gate is absent or passes; default first.
fn choose_animation<'a>(
    action: &'a ActionDef,
    snap: &MascotSnapshot,
    rng: &mut u64,
) -> Option<&'a AnimationDef> {
    for animation in &action.animations {
        match &animation.condition {
            None => return Some(animation),
            Some(condition) if eval_condition(condition, snap, rng) => return Some(animation),
            Some(_) => {}
        }
    }
    action.animations.first()
}

/// Pose whose cumulative duration window contains `frame`.
fn pose_at(animation: &AnimationDef, frame: u32) -> Option<&Pose> {
    let mut acc = 0u32;
    for pose in &animation.poses {
        acc += pose.duration;
        if frame < acc {
            return Some(pose);
        }
    }
    animation.poses.last()
}

fn total_duration(
    state: &CharacterState,
    action: &ActionDef,
    snap: &MascotSnapshot,
    rng: &mut u64,
) -> u32 {
    if let Some(duration) = state.action_context.evaluated_duration {
        return duration.max(1);
    }
    choose_animation(action, snap, rng)
        .map(|animation| animation.total_duration())
        .unwrap_or(1)
        .max(1)
}

/// Horizontal friction comes from the falling action's config.
fn falling_resistance_x(library: &MascotLibrary, snap: &MascotSnapshot, rng: &mut u64) -> f64 {
    library
        .action(FALLBACK_ACTION)
        .and_then(|action| eval_opt(&action.params.resistance_x, snap, rng))
        .unwrap_or(DEFAULT_FRICTION)
}

fn step_leaf(step: &SequenceStep) -> Option<(String, ActionParams)> {
    step.action
        .as_ref()
        .map(|name| (name.clone(), step.overrides.clone()))
}

/// Resolve the step at `index` (skipping gated-out steps) into a leaf, or
/// `None` when the sequence is exhausted or a select has no passing branch.
fn resolve_step_at(
    state: &mut CharacterState,
    sequence: &ActionDef,
    mut index: usize,
    snap: &MascotSnapshot,
    rng: &mut u64,
) -> Option<(String, ActionParams)> {
    loop {
        let step = sequence.steps.get(index)?;
        state.sequence_frame = index;
        if let Some(condition) = &step.condition {
            if !eval_condition(condition, snap, rng) {
                index += 1;
                continue;
            }
        }
        if step.is_select() {
            for (branch_index, branch) in step.select.iter().enumerate() {
                let passes = branch
                    .condition
                    .as_ref()
                    .map(|condition| eval_condition(condition, snap, rng))
                    .unwrap_or(true);
                if passes {
                    state.select_cursor = Some(SelectCursor {
                        step_index: index,
                        branch: branch_index,
                        position: 0,
                    });
                    return branch.steps.first().and_then(step_leaf);
                }
            }
            // No branch passes: skip to governing behavior selection.
            return None;
        }
        return step_leaf(step);
    }
}

/// Advance the governing sequence past the just-completed leaf.
fn next_sequence_step(
    state: &mut CharacterState,
    sequence: &ActionDef,
    snap: &MascotSnapshot,
    rng: &mut u64,
) -> Option<(String, ActionParams)> {
    if let Some(cursor) = state.select_cursor {
        let branch_steps = sequence
            .steps
            .get(cursor.step_index)
            .and_then(|step| step.select.get(cursor.branch))
            .map(|branch| branch.steps.as_slice())
            .unwrap_or(&[]);
        let next_position = cursor.position + 1;
        if next_position < branch_steps.len() {
            state.select_cursor = Some(SelectCursor {
                position: next_position,
                ..cursor
            });
            return step_leaf(&branch_steps[next_position]);
        }
        state.select_cursor = None;
        return resolve_step_at(state, sequence, cursor.step_index + 1, snap, rng);
    }
    resolve_step_at(state, sequence, state.sequence_frame + 1, snap, rng)
}

/// Overrides of the step the current leaf came from, for per-tick physics
/// parameter evaluation.
fn current_overrides(state: &CharacterState, library: &MascotLibrary) -> ActionParams {
    let Some(behavior) = library.action(&state.behavior_name) else {
        return ActionParams::default();
    };
    if behavior.action_type != ActionType::Sequence {
        return ActionParams::default();
    }
    let step = match state.select_cursor {
        Some(cursor) => behavior
            .steps
            .get(cursor.step_index)
            .and_then(|step| step.select.get(cursor.branch))
            .and_then(|branch| branch.steps.get(cursor.position)),
        None => behavior.steps.get(state.sequence_frame),
    };
    step.map(|step| step.overrides.clone()).unwrap_or_default()
}

/// Enter a leaf action: reset bookkeeping, evaluate dynamic parameters
/// against the context at this moment, and apply first-frame side effects
/// (pickup, throw, jump launch, stand stop).
fn enter_leaf(
    state: &mut CharacterState,
    library: &MascotLibrary,
    name: &str,
    overrides: &ActionParams,
    snap: &MascotSnapshot,
    active: &mut ActiveElementSlot,
    rng: &mut u64,
    effects: &mut StepEffects,
) {
    state.reset_action(name);
    let Some(action) = library.action(name) else {
        // Unknown leaf: the next step substitutes the fallback.
        return;
    };
    let params = overrides.merged_over(&action.params);

    state.action_context.evaluated_duration =
        eval_opt(&params.duration, snap, rng).map(|duration| duration.max(1.0) as u32);
    // X targets are clamped into the work area; an unreachable target
    // (cursor past the edge) would otherwise never terminate the action.
    state.action_context.evaluated_target_x = eval_opt(&params.target_x, snap, rng)
        .map(|tx| tx.clamp(snap.work_area.left, snap.work_area.right));
    state.action_context.evaluated_target_y = eval_opt(&params.target_y, snap, rng);

    // Prevents residual-velocity sliding.
    if name == "Stand" {
        state.velocity.x = 0.0;
    }

    match action.embed {
        Some(EmbedType::Jump) => {
            let target = match (
                state.action_context.evaluated_target_x,
                state.action_context.evaluated_target_y,
            ) {
                (Some(tx), Some(ty)) => Some((tx, ty)),
                _ => None,
            };
            let launch = eval_opt(&params.velocity, snap, rng).unwrap_or(DEFAULT_LAUNCH);
            state.velocity = jump_entry_velocity(state.position, target, launch);
        }
        Some(EmbedType::WalkWithElement) | Some(EmbedType::FallWithElement) => {
            if state.carried_element.is_none() {
                if let Some(element) = active.0.take() {
                    let offset_x =
                        eval_opt(&params.offset_x, snap, rng).unwrap_or(DEFAULT_CARRY_OFFSET_X);
                    let offset_y =
                        eval_opt(&params.offset_y, snap, rng).unwrap_or(DEFAULT_CARRY_OFFSET_Y);
                    let rect = Rect {
                        x: state.position.x + offset_x,
                        y: state.position.y + offset_y,
                        ..element.rect
                    };
                    state.carried_element = Some(CarriedElement {
                        id: element.id,
                        rect,
                        offset_x,
                        offset_y,
                    });
                    effects.commands.push(RenderCommand::Attach {
                        id: element.id,
                        rect,
                    });
                }
            }
        }
        Some(EmbedType::ThrowElement) => {
            if let Some(carried) = state.carried_element.take() {
                let facing = if state.look_right { 1.0 } else { -1.0 };
                let vx = eval_opt(&params.initial_vx, snap, rng)
                    .unwrap_or(DEFAULT_THROW_VX)
                    .abs()
                    * facing;
                let vy = eval_opt(&params.initial_vy, snap, rng).unwrap_or(DEFAULT_THROW_VY);
                let gravity = eval_opt(&params.gravity, snap, rng).unwrap_or(GRAVITY_STEP);
                effects.commands.push(RenderCommand::Release {
                    id: carried.id,
                    rect: carried.rect,
                });
                effects.thrown.push((
                    carried.id,
                    ThrownBody {
                        rect: carried.rect,
                        vx,
                        vy,
                        gravity,
                    },
                ));
            }
        }
        _ => {}
    }

    if let Some(animation) = choose_animation(action, snap, rng) {
        if let Some(first) = animation.poses.first() {
            state.sprite = first.sprite.clone();
        }
    }
}

/// Enter a behavior: sequences start at their first step, anything else is
/// taken as the leaf action directly.
fn enter_behavior(
    state: &mut CharacterState,
    library: &MascotLibrary,
    name: &str,
    snap: &MascotSnapshot,
    active: &mut ActiveElementSlot,
    rng: &mut u64,
    log: &mut Vec<String>,
    effects: &mut StepEffects,
) {
    state.behavior_name = name.to_string();
    state.sequence_frame = 0;
    state.select_cursor = None;
    match library.action(name) {
        Some(action) if action.action_type == ActionType::Sequence => {
            match resolve_step_at(state, action, 0, snap, rng) {
                Some((leaf, overrides)) => {
                    enter_leaf(state, library, &leaf, &overrides, snap, active, rng, effects);
                }
                None => {
                    log.push(format!(
                        "sequence {} resolved no step, substituting {}",
                        name, FALLBACK_ACTION
                    ));
                    enter_leaf(
                        state,
                        library,
                        FALLBACK_ACTION,
                        &ActionParams::default(),
                        snap,
                        active,
                        rng,
                        effects,
                    );
                }
            }
        }
        _ => {
            enter_leaf(
                state,
                library,
                name,
                &ActionParams::default(),
                snap,
                active,
                rng,
                effects,
            );
        }
    }
}

/// External action trigger (context menu, selection completion, drag/drop).
/// Runs the same entry path as the stepper so first-frame side effects
/// apply.
pub fn force_behavior(
    state: &mut CharacterState,
    library: &MascotLibrary,
    name: &str,
    viewport: Viewport,
    cursor: Vec2,
    active: &mut ActiveElementSlot,
    rng: &mut u64,
    log: &mut Vec<String>,
) -> StepEffects {
    let mut effects = StepEffects::default();
    let snap = state.snapshot(viewport.work_area(), cursor, element_area(active));
    enter_behavior(
        state,
        library,
        name,
        &snap,
        active,
        rng,
        log,
        &mut effects,
    );
    effects
}

/// Advance past a completed action: continue the governing sequence if it
/// has steps left, otherwise consult the behavior selector.
fn advance(
    state: &mut CharacterState,
    library: &MascotLibrary,
    snap: &MascotSnapshot,
    active: &mut ActiveElementSlot,
    rng: &mut u64,
    log: &mut Vec<String>,
    effects: &mut StepEffects,
) {
    if let Some(behavior) = library.action(&state.behavior_name) {
        if behavior.action_type == ActionType::Sequence {
            if let Some((leaf, overrides)) = next_sequence_step(state, behavior, snap, rng) {
                enter_leaf(state, library, &leaf, &overrides, snap, active, rng, effects);
                return;
            }
        }
    }
    let next = select_next_behavior(&library.behaviors, snap, rng, log);
    enter_behavior(state, library, &next, snap, active, rng, log, effects);
}

/// One tick of the animation/physics state machine. Never panics over
/// data-shape problems; every missing reference degrades to a fallback
/// state.
pub fn step_character(
    state: &mut CharacterState,
    library: &MascotLibrary,
    viewport: Viewport,
    cursor: Vec2,
    active: &mut ActiveElementSlot,
    rng: &mut u64,
    log: &mut Vec<String>,
) -> StepEffects {
    let mut effects = StepEffects::default();
    let work_area = viewport.work_area();
    let snap = state.snapshot(work_area, cursor, element_area(active));

    // 1. Resolve the current action, substituting the fallback for unknown
    // names.
    if library.action(&state.action_name).is_none() {
        log.push(format!(
            "unknown action {}, substituting {}",
            state.action_name, FALLBACK_ACTION
        ));
        if library.action(FALLBACK_ACTION).is_some() {
            state.reset_action(FALLBACK_ACTION);
        } else {
            log.push(format!("fallback action {} missing", FALLBACK_ACTION));
            state.action_frame = state.action_frame.saturating_add(1);
            return effects;
        }
    }

    // 2. Completion check: advance the sequence or consult the selector,
    // unless an evaluated walk target is still pending.
    {
        let action = library
            .action(&state.action_name)
            .expect("resolved above");
        let total = total_duration(state, action, &snap, rng);
        if state.action_frame >= total {
            state.action_frame = 0;
            let target_pending = state
                .action_context
                .evaluated_target_x
                .map(|tx| (state.position.x - tx).abs() > TARGET_EPSILON)
                .unwrap_or(false);
            if !target_pending {
                advance(state, library, &snap, active, rng, log, &mut effects);
            }
        }
    }

    // 4. Fallback safety: an animation-less leaf cannot be stepped.
    let needs_substitute = library
        .action(&state.action_name)
        .map(|action| action.animations.is_empty())
        .unwrap_or(true);
    if needs_substitute {
        log.push(format!(
            "action {} has no animations, substituting {}",
            state.action_name, FALLBACK_ACTION
        ));
        match library.action(FALLBACK_ACTION) {
            Some(action) if !action.animations.is_empty() => {
                state.reset_action(FALLBACK_ACTION);
            }
            _ => {
                log.push(format!("fallback action {} missing", FALLBACK_ACTION));
                state.action_frame = state.action_frame.saturating_add(1);
                return effects;
            }
        }
    }

    let action = library
        .action(&state.action_name)
        .expect("resolved above");

    // 5. Animation and pose selection, recomputed every tick.
    let animation_total = choose_animation(action, &snap, rng)
        .map(|animation| animation.total_duration())
        .unwrap_or(1)
        .max(1);
    let pose_velocity = match choose_animation(action, &snap, rng)
        .and_then(|animation| pose_at(animation, state.action_frame % animation_total))
    {
        Some(pose) => {
            state.sprite = pose.sprite.clone();
            pose.velocity
        }
        None => Vec2::ZERO,
    };

    // 6. Physics integration, branching on the embed type.
    let overrides = current_overrides(state, library);
    let params = overrides.merged_over(&action.params);
    let grounded =
        snap.work_area.on_floor(state.position) || snap.element.on_top(state.position);
    match action.embed {
        Some(EmbedType::Fall) | Some(EmbedType::FallWithElement) => {
            let gravity = eval_opt(&params.gravity, &snap, rng).unwrap_or(2.0);
            let resistance_x = eval_opt(&params.resistance_x, &snap, rng).unwrap_or(0.0);
            let resistance_y = eval_opt(&params.resistance_y, &snap, rng).unwrap_or(0.0);
            fall_step(&mut state.velocity, gravity, resistance_x, resistance_y);
        }
        Some(EmbedType::Jump) => {
            if state.action_frame > 0 {
                state.velocity.y += GRAVITY_STEP;
            }
        }
        _ => {
            if let Some(tx) = state.action_context.evaluated_target_x {
                let direction = if tx >= state.position.x { 1.0 } else { -1.0 };
                state.look_right = direction > 0.0;
                state.velocity.x = pose_velocity.x.abs() * direction;
            } else if pose_velocity.x != 0.0 {
                let facing = if state.look_right { 1.0 } else { -1.0 };
                state.velocity.x = pose_velocity.x * facing;
            } else if grounded {
                if is_static_action(&state.action_name) {
                    state.velocity.x = 0.0;
                } else {
                    let friction = falling_resistance_x(library, &snap, rng);
                    state.velocity.x *= 1.0 - friction;
                }
            }
            if pose_velocity.y != 0.0 {
                state.velocity.y = pose_velocity.y;
            } else if !grounded {
                state.velocity.y += GRAVITY_STEP;
            }
        }
    }

    state.position.x += state.velocity.x;
    state.position.y += state.velocity.y;

    let mut terminated = false;

    // Walk-target snap: within two pose-widths counts as arrived.
    if !matches!(
        action.embed,
        Some(EmbedType::Fall) | Some(EmbedType::FallWithElement) | Some(EmbedType::Jump)
    ) {
        if let Some(tx) = state.action_context.evaluated_target_x {
            let threshold = (pose_velocity.x.abs() * 2.0).max(TARGET_EPSILON);
            if (state.position.x - tx).abs() < threshold {
                state.position.x = tx;
                terminated = true;
            }
        }
    }

    // Jump-target crossing, direction-aware.
    if action.embed == Some(EmbedType::Jump) {
        if let (Some(tx), Some(ty)) = (
            state.action_context.evaluated_target_x,
            state.action_context.evaluated_target_y,
        ) {
            if jump_crossed_target(state.position.x, state.velocity.x, tx) {
                state.position = Vec2::new(tx, ty);
                terminated = true;
            }
        }
    }

    // 7. Collision resolution.
    let platform = active.0.map(|element| element.rect);
    let outcome = resolve_collisions(
        &mut state.position,
        &mut state.velocity,
        &mut state.look_right,
        work_area,
        platform,
    );
    if outcome.landed && matches!(state.action_name.as_str(), "Falling" | "Jumping") {
        terminated = true;
    }

    // 8. Carried-element sync.
    if let Some(carried) = &mut state.carried_element {
        carried.rect.x = state.position.x + carried.offset_x;
        carried.rect.y = state.position.y + carried.offset_y;
        effects.commands.push(RenderCommand::Move {
            id: carried.id,
            rect: carried.rect,
        });
    }

    // Frame advance; force-terminated actions complete on the next check.
    let final_total = total_duration(state, action, &snap, rng);
    if terminated {
        state.action_frame = final_total;
    } else {
        state.action_frame = (state.action_frame + 1).min(final_total);
    }

    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::actions::{builtin_action_catalog, ActionParams, SelectBranch};
    use crate::rules::condition::Condition;
    use crate::rules::value::ValueExpr;
    use crate::simulation::elements::ActiveElement;

    fn library() -> MascotLibrary {
        MascotLibrary::builtin()
    }

    /// Builtin library extended with fixed-target test sequences.
    fn library_with_test_sequences() -> MascotLibrary {
        let mut library = MascotLibrary::builtin();
        let mut catalog = builtin_action_catalog();
        catalog.actions.push(crate::data::actions::ActionDef {
            name: "WalkTo300".to_string(),
            action_type: crate::data::actions::ActionType::Sequence,
            embed: None,
            border: None,
            animations: Vec::new(),
            params: ActionParams::default(),
            steps: vec![SequenceStep {
                action: Some("Walk".to_string()),
                overrides: ActionParams {
                    target_x: Some(ValueExpr::Const(300.0)),
                    ..ActionParams::default()
                },
                condition: None,
                select: Vec::new(),
            }],
        });
        catalog.actions.push(crate::data::actions::ActionDef {
            name: "JumpTo".to_string(),
            action_type: crate::data::actions::ActionType::Sequence,
            embed: None,
            border: None,
            animations: Vec::new(),
            params: ActionParams::default(),
            steps: vec![SequenceStep {
                action: Some("Jumping".to_string()),
                overrides: ActionParams {
                    target_x: Some(ValueExpr::Const(300.0)),
                    target_y: Some(ValueExpr::Const(100.0)),
                    ..ActionParams::default()
                },
                condition: None,
                select: Vec::new(),
            }],
        });
        catalog.actions.push(crate::data::actions::ActionDef {
            name: "StandThenSettle".to_string(),
            action_type: crate::data::actions::ActionType::Sequence,
            embed: None,
            border: None,
            animations: Vec::new(),
            params: ActionParams::default(),
            steps: vec![
                SequenceStep {
                    action: Some("Stand".to_string()),
                    overrides: ActionParams {
                        duration: Some(ValueExpr::Const(2.0)),
                        ..ActionParams::default()
                    },
                    condition: None,
                    select: Vec::new(),
                },
                SequenceStep::select(vec![
                    SelectBranch {
                        condition: Some(Condition::CursorNear(50.0)),
                        steps: vec![SequenceStep::of("SitAndLookAtMouse")],
                    },
                    SelectBranch {
                        condition: None,
                        steps: vec![
                            SequenceStep {
                                action: Some("Sit".to_string()),
                                overrides: ActionParams {
                                    duration: Some(ValueExpr::Const(2.0)),
                                    ..ActionParams::default()
                                },
                                condition: None,
                                select: Vec::new(),
                            },
                            SequenceStep::of("SitAndLookUp"),
                        ],
                    },
                ]),
            ],
        });
        catalog.validate().unwrap();
        library.actions = catalog;
        library
    }

    fn grounded_state(viewport: Viewport, x: f64) -> CharacterState {
        let mut state = CharacterState::new(viewport.width);
        state.position = Vec2::new(x, viewport.work_area().floor);
        state.velocity = Vec2::ZERO;
        state.action_name = "Stand".to_string();
        state.behavior_name = "Stand".to_string();
        state
    }

    #[test]
    fn mount_state_falls_to_floor() {
        let library = library();
        let viewport = Viewport::default();
        let mut state = CharacterState::new(viewport.width);
        let mut active = ActiveElementSlot::default();
        let mut rng = 42u64;
        let mut log = Vec::new();

        let floor = viewport.work_area().floor;
        for _ in 0..600 {
            step_character(
                &mut state,
                &library,
                viewport,
                Vec2::ZERO,
                &mut active,
                &mut rng,
                &mut log,
            );
            if state.position.y >= floor {
                break;
            }
        }
        assert_eq!(state.position.y, floor);
        assert_eq!(state.velocity.y, 0.0);
    }

    #[test]
    fn floor_clamp_is_a_fixed_point_of_stepping() {
        let library = library();
        let viewport = Viewport::default();
        let floor = viewport.work_area().floor;
        let mut state = CharacterState::new(viewport.width);
        state.position = Vec2::new(200.0, floor + 30.0);
        state.velocity = Vec2::new(0.0, 12.0);
        let mut active = ActiveElementSlot::default();
        let mut rng = 9u64;
        let mut log = Vec::new();

        step_character(
            &mut state,
            &library,
            viewport,
            Vec2::ZERO,
            &mut active,
            &mut rng,
            &mut log,
        );
        assert_eq!(state.position.y, floor);
        assert_eq!(state.velocity.y, 0.0);

        step_character(
            &mut state,
            &library,
            viewport,
            Vec2::ZERO,
            &mut active,
            &mut rng,
            &mut log,
        );
        assert_eq!(state.position.y, floor);
        assert_eq!(state.velocity.y, 0.0);
    }

    #[test]
    fn falling_character_lands_on_element_not_floor() {
        let library = library();
        let viewport = Viewport::default();
        let platform = Rect::new(300.0, 400.0, 300.0, 40.0);
        let mut state = CharacterState::new(viewport.width);
        state.position = Vec2::new(380.0, 100.0);
        let mut active = ActiveElementSlot(Some(ActiveElement {
            id: 3,
            rect: platform,
        }));
        let mut rng = 5u64;
        let mut log = Vec::new();

        for _ in 0..600 {
            step_character(
                &mut state,
                &library,
                viewport,
                Vec2::ZERO,
                &mut active,
                &mut rng,
                &mut log,
            );
            if state.velocity.y == 0.0 && state.position.y > 100.0 {
                break;
            }
        }
        assert_eq!(state.position.y, platform.top() - SPRITE_SIZE);
        assert!(state.position.y < viewport.work_area().floor);
    }

    #[test]
    fn walk_to_target_snaps_and_terminates() {
        let library = library_with_test_sequences();
        let viewport = Viewport::default();
        let mut state = grounded_state(viewport, 100.0);
        state.look_right = false;
        let mut active = ActiveElementSlot::default();
        let mut rng = 1u64;
        let mut log = Vec::new();

        force_behavior(
            &mut state,
            &library,
            "WalkTo300",
            viewport,
            Vec2::ZERO,
            &mut active,
            &mut rng,
            &mut log,
        );
        assert_eq!(state.action_name, "Walk");
        assert_eq!(state.action_context.evaluated_target_x, Some(300.0));

        let mut terminated_tick_vx = None;
        for _ in 0..300 {
            step_character(
                &mut state,
                &library,
                viewport,
                Vec2::ZERO,
                &mut active,
                &mut rng,
                &mut log,
            );
            if state.position.x == 300.0 && state.action_name == "Walk" {
                terminated_tick_vx = Some(state.velocity.x);
                break;
            }
        }
        assert_eq!(state.position.x, 300.0);
        // The walk faces and moves toward the target.
        assert!(state.look_right);
        // Force-terminated on the snapping tick with vx left as the pose
        // velocity.
        assert_eq!(terminated_tick_vx, Some(2.0));
        assert_eq!(state.action_frame, 8);
    }

    #[test]
    fn jump_entry_solves_fixed_time_parabola() {
        let library = library_with_test_sequences();
        let viewport = Viewport::default();
        let mut state = CharacterState::new(viewport.width);
        state.position = Vec2::ZERO;
        state.velocity = Vec2::ZERO;
        let mut active = ActiveElementSlot::default();
        let mut rng = 1u64;
        let mut log = Vec::new();

        force_behavior(
            &mut state,
            &library,
            "JumpTo",
            viewport,
            Vec2::ZERO,
            &mut active,
            &mut rng,
            &mut log,
        );
        assert_eq!(state.action_name, "Jumping");
        assert!((state.velocity.x - 10.0).abs() < 1e-9);
        assert!((state.velocity.y - (100.0 - 225.0) / 30.0).abs() < 1e-9);
    }

    #[test]
    fn carry_then_throw_round_trip() {
        let library = library();
        let viewport = Viewport::default();
        let mut state = grounded_state(viewport, 100.0);
        state.look_right = false;
        let mut active = ActiveElementSlot(Some(ActiveElement {
            id: 11,
            rect: Rect::new(300.0, 400.0, 120.0, 60.0),
        }));
        let mut rng = 1u64;
        let mut log = Vec::new();

        let effects = force_behavior(
            &mut state,
            &library,
            "WalkWithElement",
            viewport,
            Vec2::ZERO,
            &mut active,
            &mut rng,
            &mut log,
        );
        assert!(state.carried_element.is_some());
        assert!(active.0.is_none());
        assert!(effects
            .commands
            .iter()
            .any(|command| matches!(command, RenderCommand::Attach { id: 11, .. })));

        let effects = force_behavior(
            &mut state,
            &library,
            "ThrowElement",
            viewport,
            Vec2::ZERO,
            &mut active,
            &mut rng,
            &mut log,
        );
        assert!(state.carried_element.is_none());
        assert_eq!(effects.thrown.len(), 1);
        let (id, body) = &effects.thrown[0];
        assert_eq!(*id, 11);
        // Facing left throws left.
        assert!(body.vx < 0.0);
        assert!(effects
            .commands
            .iter()
            .any(|command| matches!(command, RenderCommand::Release { id: 11, .. })));
    }

    #[test]
    fn carried_element_tracks_character() {
        let library = library();
        let viewport = Viewport::default();
        let mut state = grounded_state(viewport, 100.0);
        let mut active = ActiveElementSlot(Some(ActiveElement {
            id: 4,
            rect: Rect::new(300.0, 400.0, 120.0, 60.0),
        }));
        let mut rng = 1u64;
        let mut log = Vec::new();

        force_behavior(
            &mut state,
            &library,
            "WalkWithElement",
            viewport,
            Vec2::ZERO,
            &mut active,
            &mut rng,
            &mut log,
        );
        let effects = step_character(
            &mut state,
            &library,
            viewport,
            Vec2::ZERO,
            &mut active,
            &mut rng,
            &mut log,
        );
        let carried = state.carried_element.unwrap();
        assert_eq!(carried.rect.x, state.position.x + carried.offset_x);
        assert_eq!(carried.rect.y, state.position.y + carried.offset_y);
        assert!(effects
            .commands
            .iter()
            .any(|command| matches!(command, RenderCommand::Move { id: 4, .. })));
    }

    #[test]
    fn select_branch_takes_first_passing_in_order() {
        let library = library_with_test_sequences();
        let viewport = Viewport::default();
        let mut state = grounded_state(viewport, 100.0);
        let mut active = ActiveElementSlot::default();
        let mut rng = 1u64;
        let mut log = Vec::new();
        // Cursor far away: the gated branch fails, the default branch runs.
        let cursor = Vec2::new(1200.0, 0.0);

        force_behavior(
            &mut state,
            &library,
            "StandThenSettle",
            viewport,
            cursor,
            &mut active,
            &mut rng,
            &mut log,
        );
        assert_eq!(state.action_name, "Stand");

        for _ in 0..3 {
            step_character(
                &mut state,
                &library,
                viewport,
                cursor,
                &mut active,
                &mut rng,
                &mut log,
            );
        }
        assert_eq!(state.action_name, "Sit");
        let cursor_state = state.select_cursor.expect("inside select branch");
        assert_eq!(cursor_state.branch, 1);
        assert_eq!(cursor_state.position, 0);

        for _ in 0..3 {
            step_character(
                &mut state,
                &library,
                viewport,
                cursor,
                &mut active,
                &mut rng,
                &mut log,
            );
        }
        assert_eq!(state.action_name, "SitAndLookUp");
        assert_eq!(state.select_cursor.unwrap().position, 1);
    }

    #[test]
    fn select_branch_near_cursor_takes_gated_branch() {
        let library = library_with_test_sequences();
        let viewport = Viewport::default();
        let mut state = grounded_state(viewport, 100.0);
        let mut active = ActiveElementSlot::default();
        let mut rng = 1u64;
        let mut log = Vec::new();
        let cursor = Vec2::new(110.0, viewport.work_area().floor);

        force_behavior(
            &mut state,
            &library,
            "StandThenSettle",
            viewport,
            cursor,
            &mut active,
            &mut rng,
            &mut log,
        );
        for _ in 0..3 {
            step_character(
                &mut state,
                &library,
                viewport,
                cursor,
                &mut active,
                &mut rng,
                &mut log,
            );
        }
        assert_eq!(state.action_name, "SitAndLookAtMouse");
        assert_eq!(state.select_cursor.unwrap().branch, 0);
    }

    #[test]
    fn unknown_action_substitutes_fallback() {
        let library = library();
        let viewport = Viewport::default();
        let mut state = CharacterState::new(viewport.width);
        state.action_name = "Bogus".to_string();
        let mut active = ActiveElementSlot::default();
        let mut rng = 1u64;
        let mut log = Vec::new();

        step_character(
            &mut state,
            &library,
            viewport,
            Vec2::ZERO,
            &mut active,
            &mut rng,
            &mut log,
        );
        assert_eq!(state.action_name, FALLBACK_ACTION);
        assert!(log.iter().any(|line| line.contains("Bogus")));
    }

    #[test]
    fn step_is_deterministic_for_equal_inputs() {
        let library = library_with_test_sequences();
        let viewport = Viewport::default();
        let mut first = grounded_state(viewport, 100.0);
        let mut active_first = ActiveElementSlot::default();
        let mut rng_first = 1234u64;
        let mut log_first = Vec::new();
        force_behavior(
            &mut first,
            &library,
            "WalkTo300",
            viewport,
            Vec2::ZERO,
            &mut active_first,
            &mut rng_first,
            &mut log_first,
        );
        let mut second = first.clone();
        let mut active_second = ActiveElementSlot::default();
        let mut rng_second = rng_first;
        let mut log_second = Vec::new();

        for _ in 0..32 {
            step_character(
                &mut first,
                &library,
                viewport,
                Vec2::ZERO,
                &mut active_first,
                &mut rng_first,
                &mut log_first,
            );
            step_character(
                &mut second,
                &library,
                viewport,
                Vec2::ZERO,
                &mut active_second,
                &mut rng_second,
                &mut log_second,
            );
            assert_eq!(first, second);
        }
    }

    #[test]
    fn action_frame_stays_within_bounds() {
        let library = library();
        let viewport = Viewport::default();
        let mut state = CharacterState::new(viewport.width);
        let mut active = ActiveElementSlot::default();
        let mut rng = 0xfeedu64;
        let mut log = Vec::new();

        for _ in 0..2000 {
            step_character(
                &mut state,
                &library,
                viewport,
                Vec2::ZERO,
                &mut active,
                &mut rng,
                &mut log,
            );
            let action = library.action(&state.action_name).unwrap();
            let mut probe_rng = rng;
            let snap = state.snapshot(
                viewport.work_area(),
                Vec2::ZERO,
                element_area(&active),
            );
            let total = total_duration(&state, action, &snap, &mut probe_rng);
            assert!(state.action_frame <= total);
        }
    }
}
