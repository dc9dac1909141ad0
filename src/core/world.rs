use std::path::Path;

use bevy_ecs::prelude::*;

use crate::components::element::{ElementId, ThrownBody};
use crate::components::geometry::Rect;
use crate::core::ecs::{create_schedule, create_world};
use crate::core::serialization::{
    apply_state_to_world, extract_state_from_world, load_state_from_path, save_state_to_path,
    SaveState,
};
use crate::simulation::character::{CarriedElement, CharacterState};
use crate::simulation::clock::TickClock;
use crate::simulation::elements::{
    ActiveElement, ActiveElementSlot, EngineLog, RenderCommand, RenderLog,
};
use crate::simulation::selection::{SelectionMode, SelectionState};

/// Intent-driven commands fed into the ECS each tick.
#[derive(Debug, Clone)]
pub enum MascotCommand {
    SetViewport { width: f64, height: f64 },
    MoveCursor { x: f64, y: f64 },
    DragStart,
    DragMove { x: f64, y: f64 },
    DragEnd,
    SetPinned(bool),
    /// Context-menu action by catalog name. Selection triggers flip the
    /// selection mode instead of animating.
    ForceAction { name: String },
    /// Element under the cursor while selection mode is active.
    HoverElement { rect: Rect },
    ClearHover,
    /// The click that completes (or cancels) selection mode.
    Click,
}

/// Resource storing the commands for the next tick.
#[derive(Resource, Default, Debug)]
pub struct CommandQueue(pub Vec<MascotCommand>);

/// Data snapshot returned to the host layer after each tick.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub raw_tick: u64,
    pub sprite: String,
    pub position: (f64, f64),
    pub velocity: (f64, f64),
    pub look_right: bool,
    pub action: String,
    pub behavior: String,
    pub selection_mode: SelectionMode,
    pub active_element: Option<ActiveElement>,
    pub carried: Option<CarriedElement>,
    pub thrown: Vec<(u32, ThrownBody)>,
    pub render_commands: Vec<RenderCommand>,
    pub log: Vec<String>,
}

/// Wrapper around the ECS world and schedule.
pub struct Engine {
    world: World,
    schedule: Schedule,
    seed: u64,
}

impl Engine {
    /// Create a new engine using the provided seed.
    pub fn new(seed: u64) -> Self {
        let world = create_world(seed);
        let schedule = create_schedule();
        Self {
            world,
            schedule,
            seed,
        }
    }

    /// Run one raw tick with the provided commands and return a snapshot
    /// for rendering.
    pub fn tick(&mut self, commands: Vec<MascotCommand>) -> Snapshot {
        {
            let mut queue = self.world.resource_mut::<CommandQueue>();
            queue.0 = commands;
        }
        self.schedule.run(&mut self.world);
        Snapshot::capture(&mut self.world)
    }

    /// Extract a serializable save state from the current world.
    pub fn save_state(&self) -> SaveState {
        extract_state_from_world(&self.world, self.seed)
    }

    /// Apply a saved state back into the live world.
    pub fn load_state(&mut self, state: SaveState) {
        self.seed = state.seed;
        apply_state_to_world(state, &mut self.world);
    }

    /// Save state directly to a file path.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        save_state_to_path(&self.save_state(), path)
    }

    /// Load state directly from a file path.
    pub fn load_from_path<P: AsRef<Path>>(&mut self, path: P) -> std::io::Result<()> {
        let state = load_state_from_path(path)?;
        self.load_state(state);
        Ok(())
    }
}

/// Stable identifier source for page elements entering the simulation.
#[derive(Resource, Debug)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn alloc(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn bump_to_at_least(&mut self, min_next: u32) {
        if self.next < min_next {
            self.next = min_next;
        }
    }
}

impl Snapshot {
    fn capture(world: &mut World) -> Self {
        let raw_tick = world.resource::<TickClock>().raw_tick;
        let character = world.resource::<CharacterState>().clone();
        let selection = *world.resource::<SelectionState>();
        let active_element = world.resource::<ActiveElementSlot>().0;

        let mut query = world.query::<(&ElementId, &ThrownBody)>();
        let mut thrown: Vec<(u32, ThrownBody)> = query
            .iter(world)
            .map(|(id, body)| (id.0, *body))
            .collect();
        thrown.sort_by_key(|(id, _)| *id);

        let render_commands = std::mem::take(&mut world.resource_mut::<RenderLog>().0);
        let log = std::mem::take(&mut world.resource_mut::<EngineLog>().0);

        Snapshot {
            raw_tick,
            sprite: character.sprite.clone(),
            position: (character.position.x, character.position.y),
            velocity: (character.velocity.x, character.velocity.y),
            look_right: character.look_right,
            action: character.action_name.clone(),
            behavior: character.behavior_name.clone(),
            selection_mode: selection.mode,
            active_element,
            carried: character.carried_element,
            thrown,
            render_commands,
            log,
        }
    }
}
