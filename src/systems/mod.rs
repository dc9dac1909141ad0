pub mod elements;
pub mod mascot;

use bevy_ecs::prelude::*;

use crate::components::element::ElementId;
use crate::simulation::elements::RenderLog;
use crate::simulation::stepper::StepEffects;

/// Apply a step's side effects to the ECS world: spawn projectile entities
/// and append presentation commands for the host to drain.
pub fn apply_effects(commands: &mut Commands, render: &mut RenderLog, effects: StepEffects) {
    for (id, body) in effects.thrown {
        commands.spawn((ElementId(id), body));
    }
    render.0.extend(effects.commands);
}
