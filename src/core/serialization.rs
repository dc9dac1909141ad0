use std::fs;
use std::path::Path;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::element::{ElementId, ThrownBody};
use crate::core::rng::RngState;
use crate::core::world::IdAllocator;
use crate::simulation::character::CharacterState;
use crate::simulation::clock::TickClock;
use crate::simulation::elements::ActiveElementSlot;
use crate::simulation::environment::{Cursor, DragState, Viewport};
use crate::simulation::selection::SelectionState;

/// Save state capturing the engine's mutable data (clock, character,
/// selection, elements in flight). The catalogs are rebuilt, not saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveState {
    #[serde(default = "default_save_version")]
    pub version: u32,
    pub seed: u64,
    pub rng: u64,
    pub clock: TickClock,
    pub viewport: Viewport,
    pub cursor: Cursor,
    pub drag: DragState,
    pub character: CharacterState,
    pub selection: SelectionState,
    pub active_element: ActiveElementSlot,
    #[serde(default)]
    pub thrown: Vec<(u32, ThrownBody)>,
}

fn default_save_version() -> u32 {
    1
}

/// Extract a serializable snapshot of the world.
pub fn extract_state_from_world(world: &World, seed: u64) -> SaveState {
    let mut thrown: Vec<(u32, ThrownBody)> = world
        .iter_entities()
        .filter_map(|entity| {
            let id = entity.get::<ElementId>()?.0;
            let body = *entity.get::<ThrownBody>()?;
            Some((id, body))
        })
        .collect();
    thrown.sort_by_key(|(id, _)| *id);

    SaveState {
        version: default_save_version(),
        seed,
        rng: world.resource::<RngState>().0,
        clock: *world.resource::<TickClock>(),
        viewport: *world.resource::<Viewport>(),
        cursor: *world.resource::<Cursor>(),
        drag: *world.resource::<DragState>(),
        character: world.resource::<CharacterState>().clone(),
        selection: *world.resource::<SelectionState>(),
        active_element: *world.resource::<ActiveElementSlot>(),
        thrown,
    }
}

/// Apply a saved state back into the live world. Existing thrown entities
/// are replaced by the saved set.
pub fn apply_state_to_world(state: SaveState, world: &mut World) {
    let existing: Vec<Entity> = world
        .iter_entities()
        .filter(|entity| entity.contains::<ThrownBody>())
        .map(|entity| entity.id())
        .collect();
    for entity in existing {
        world.despawn(entity);
    }

    let mut max_id = 0u32;
    for (id, body) in &state.thrown {
        max_id = max_id.max(*id);
        world.spawn((ElementId(*id), *body));
    }
    if let Some(element) = state.active_element.0 {
        max_id = max_id.max(element.id);
    }
    world.resource_mut::<IdAllocator>().bump_to_at_least(max_id + 1);

    world.insert_resource(state.clock);
    world.insert_resource(state.viewport);
    world.insert_resource(state.cursor);
    world.insert_resource(state.drag);
    world.insert_resource(state.character);
    world.insert_resource(state.selection);
    world.insert_resource(state.active_element);
    world.insert_resource(RngState(state.rng));
}

/// Save state directly to a file path as JSON.
pub fn save_state_to_path<P: AsRef<Path>>(state: &SaveState, path: P) -> std::io::Result<()> {
    let raw = serde_json::to_string_pretty(state)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    fs::write(path, raw)
}

/// Load state directly from a file path.
pub fn load_state_from_path<P: AsRef<Path>>(path: P) -> std::io::Result<SaveState> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ecs::create_world;

    #[test]
    fn save_state_round_trips_through_json() {
        let world = create_world(7);
        let state = extract_state_from_world(&world, 7);
        let raw = serde_json::to_string(&state).unwrap();
        let parsed: SaveState = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.seed, 7);
        assert_eq!(parsed.character.action_name, state.character.action_name);
        assert_eq!(parsed.clock.raw_tick, state.clock.raw_tick);
    }

    #[test]
    fn apply_restores_character_and_thrown() {
        let mut world = create_world(3);
        let mut state = extract_state_from_world(&world, 3);
        state.character.position.x = 555.0;
        state.thrown.push((
            9,
            ThrownBody {
                rect: crate::components::geometry::Rect::new(10.0, 10.0, 50.0, 20.0),
                vx: 4.0,
                vy: -2.0,
                gravity: 0.5,
            },
        ));
        apply_state_to_world(state, &mut world);

        assert_eq!(world.resource::<CharacterState>().position.x, 555.0);
        let thrown: Vec<_> = world
            .iter_entities()
            .filter(|entity| entity.contains::<ThrownBody>())
            .collect();
        assert_eq!(thrown.len(), 1);
    }
}
