use bevy_ecs::prelude::*;
use bevy_ecs::schedule::SystemSet;

use crate::core::rng::{hash_seed, RngState};
use crate::core::world::{CommandQueue, IdAllocator};
use crate::simulation::character::CharacterState;
use crate::simulation::clock::{advance_clock_system, TickClock};
use crate::simulation::elements::{ActiveElementSlot, EngineLog, RenderLog};
use crate::simulation::environment::{Cursor, DragState, Viewport};
use crate::simulation::library::MascotLibrary;
use crate::simulation::selection::SelectionState;
use crate::systems::elements::{thrown_cleanup_system, thrown_integration_system};
use crate::systems::mascot::{intake_system, mascot_step_system};

/// Canonical tick ordering for the simulation.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum TickSet {
    Intake,
    Simulation,
    Time,
    Cleanup,
}

/// Build the ECS world with baseline resources.
pub fn create_world(seed: u64) -> World {
    let viewport = Viewport::default();
    let mut world = World::new();
    world.insert_resource(TickClock::default());
    world.insert_resource(CommandQueue::default());
    world.insert_resource(IdAllocator::default());
    world.insert_resource(viewport);
    world.insert_resource(Cursor::default());
    world.insert_resource(DragState::default());
    world.insert_resource(SelectionState::default());
    world.insert_resource(ActiveElementSlot::default());
    world.insert_resource(RenderLog::default());
    world.insert_resource(EngineLog::default());
    world.insert_resource(RngState(seed ^ hash_seed("mascot")));
    world.insert_resource(CharacterState::new(viewport.width));
    world.insert_resource(MascotLibrary::load_default());
    world
}

/// Build the system schedule in the canonical order.
pub fn create_schedule() -> Schedule {
    let mut schedule = Schedule::default();

    schedule.configure_sets(
        (
            TickSet::Intake,
            TickSet::Simulation,
            TickSet::Time,
            TickSet::Cleanup,
        )
            .chain(),
    );

    schedule.add_systems((
        intake_system.in_set(TickSet::Intake),
        mascot_step_system.in_set(TickSet::Simulation),
        thrown_integration_system
            .in_set(TickSet::Simulation)
            .after(mascot_step_system),
        advance_clock_system.in_set(TickSet::Time),
        thrown_cleanup_system.in_set(TickSet::Cleanup),
    ));

    schedule
}
