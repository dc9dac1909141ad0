use bevy_ecs::prelude::*;

use crate::components::geometry::Vec2;
use crate::core::rng::RngState;
use crate::core::world::{CommandQueue, IdAllocator, MascotCommand};
use crate::data::actions::EmbedType;
use crate::data::sprites::SPRITE_SIZE;
use crate::simulation::character::CharacterState;
use crate::simulation::clock::TickClock;
use crate::simulation::elements::{ActiveElement, ActiveElementSlot, EngineLog, RenderLog};
use crate::simulation::environment::{Cursor, DragState, Viewport};
use crate::simulation::library::MascotLibrary;
use crate::simulation::selection::{SelectionMode, SelectionOutcome, SelectionState};
use crate::simulation::stepper::{force_behavior, step_character};
use crate::systems::apply_effects;

/// System: drains queued host commands into state changes and forced
/// actions before the stepper runs.
pub fn intake_system(
    mut commands: Commands,
    mut queue: ResMut<CommandQueue>,
    mut character: ResMut<CharacterState>,
    mut viewport: ResMut<Viewport>,
    mut cursor: ResMut<Cursor>,
    mut drag: ResMut<DragState>,
    mut selection: ResMut<SelectionState>,
    mut active: ResMut<ActiveElementSlot>,
    mut rng: ResMut<RngState>,
    mut alloc: ResMut<IdAllocator>,
    mut render: ResMut<RenderLog>,
    mut log: ResMut<EngineLog>,
    library: Res<MascotLibrary>,
) {
    let drained: Vec<MascotCommand> = queue.0.drain(..).collect();
    for command in drained {
        match command {
            MascotCommand::SetViewport { width, height } => {
                viewport.width = width;
                viewport.height = height;
            }
            MascotCommand::MoveCursor { x, y } => {
                cursor.position = Vec2::new(x, y);
            }
            MascotCommand::DragStart => {
                drag.begin();
                let effects = force_behavior(
                    &mut character,
                    &library,
                    "Dragged",
                    *viewport,
                    cursor.position,
                    &mut active,
                    &mut rng.0,
                    &mut log.0,
                );
                apply_effects(&mut commands, &mut render, effects);
            }
            MascotCommand::DragMove { x, y } => {
                if drag.dragging {
                    let next = Vec2::new(x - SPRITE_SIZE / 2.0, y - SPRITE_SIZE / 2.0);
                    drag.record_delta(Vec2::new(
                        next.x - character.position.x,
                        next.y - character.position.y,
                    ));
                    character.position = next;
                    cursor.position = Vec2::new(x, y);
                }
            }
            MascotCommand::DragEnd => {
                if drag.dragging {
                    let fling = drag.end();
                    let effects = force_behavior(
                        &mut character,
                        &library,
                        "Fall",
                        *viewport,
                        cursor.position,
                        &mut active,
                        &mut rng.0,
                        &mut log.0,
                    );
                    character.velocity = fling;
                    apply_effects(&mut commands, &mut render, effects);
                }
            }
            MascotCommand::SetPinned(pinned) => {
                if drag.pinned == pinned {
                    continue;
                }
                drag.pinned = pinned;
                let target = if pinned { "Pinned" } else { "Fall" };
                let effects = force_behavior(
                    &mut character,
                    &library,
                    target,
                    *viewport,
                    cursor.position,
                    &mut active,
                    &mut rng.0,
                    &mut log.0,
                );
                apply_effects(&mut commands, &mut render, effects);
            }
            MascotCommand::ForceAction { name } => {
                let embed = library.action(&name).and_then(|action| action.embed);
                match embed {
                    Some(EmbedType::SelectElement) => {
                        selection.enter(SelectionMode::Throw);
                    }
                    Some(EmbedType::SelectEdge) => {
                        selection.enter(SelectionMode::Jump);
                    }
                    _ => {
                        let effects = force_behavior(
                            &mut character,
                            &library,
                            &name,
                            *viewport,
                            cursor.position,
                            &mut active,
                            &mut rng.0,
                            &mut log.0,
                        );
                        apply_effects(&mut commands, &mut render, effects);
                    }
                }
            }
            MascotCommand::HoverElement { rect } => {
                let id = alloc.alloc();
                selection.hover(Some(ActiveElement { id, rect }));
            }
            MascotCommand::ClearHover => {
                selection.hover(None);
            }
            MascotCommand::Click => {
                match selection.complete(character.position.x, cursor.position) {
                    SelectionOutcome::Cancelled => {}
                    SelectionOutcome::Selected {
                        element,
                        forced_action,
                    } => {
                        active.0 = Some(element);
                        let effects = force_behavior(
                            &mut character,
                            &library,
                            &forced_action,
                            *viewport,
                            cursor.position,
                            &mut active,
                            &mut rng.0,
                            &mut log.0,
                        );
                        apply_effects(&mut commands, &mut render, effects);
                    }
                }
            }
        }
    }
}

/// System: the throttled stepper. No-ops while dragged or pinned.
pub fn mascot_step_system(
    mut commands: Commands,
    clock: Res<TickClock>,
    drag: Res<DragState>,
    viewport: Res<Viewport>,
    cursor: Res<Cursor>,
    library: Res<MascotLibrary>,
    mut character: ResMut<CharacterState>,
    mut active: ResMut<ActiveElementSlot>,
    mut rng: ResMut<RngState>,
    mut render: ResMut<RenderLog>,
    mut log: ResMut<EngineLog>,
) {
    if !clock.should_step() || drag.dragging || drag.pinned {
        return;
    }
    let effects = step_character(
        &mut character,
        &library,
        *viewport,
        cursor.position,
        &mut active,
        &mut rng.0,
        &mut log.0,
    );
    apply_effects(&mut commands, &mut render, effects);
}
