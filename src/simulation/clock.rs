use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Raw ticks per stepper step; the fixed slow-motion divisor.
pub const STEP_DIVISOR: u64 = 3;

/// Global resource tracking the raw tick counter. One raw tick per engine
/// `tick()` call; the stepper only runs on every `STEP_DIVISOR`-th tick.
#[derive(Resource, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TickClock {
    pub raw_tick: u64,
}

impl TickClock {
    pub fn should_step(&self) -> bool {
        self.raw_tick % STEP_DIVISOR == 0
    }

    pub fn advance(&mut self) {
        self.raw_tick += 1;
    }
}

/// System: advances the raw tick counter.
pub fn advance_clock_system(mut clock: ResMut<TickClock>) {
    clock.advance();
}
