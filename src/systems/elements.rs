use bevy_ecs::prelude::*;

use crate::components::element::{ElementId, ThrownBody};
use crate::simulation::clock::TickClock;
use crate::simulation::elements::{RenderCommand, RenderLog};
use crate::simulation::environment::Viewport;

/// System: advances every thrown element's projectile motion on stepper
/// ticks, independent of the character.
pub fn thrown_integration_system(
    clock: Res<TickClock>,
    mut render: ResMut<RenderLog>,
    mut query: Query<(&ElementId, &mut ThrownBody)>,
) {
    if !clock.should_step() {
        return;
    }
    for (id, mut body) in query.iter_mut() {
        body.integrate();
        render.0.push(RenderCommand::Move {
            id: id.0,
            rect: body.rect,
        });
    }
}

/// System: drops thrown elements once they fall below the viewport.
pub fn thrown_cleanup_system(
    mut commands: Commands,
    viewport: Res<Viewport>,
    mut render: ResMut<RenderLog>,
    query: Query<(Entity, &ElementId, &ThrownBody)>,
) {
    for (entity, id, body) in query.iter() {
        if body.is_offscreen(viewport.height) {
            render.0.push(RenderCommand::Remove { id: id.0 });
            commands.entity(entity).despawn();
        }
    }
}
