use bevy_ecs::prelude::*;

/// Deterministic random stream shared by the selector, the evaluator and
/// the stepper. Seeded once at engine creation.
#[derive(Resource, Debug, Clone, Copy)]
pub struct RngState(pub u64);

pub fn next_u64(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1);
    *state
}

/// Uniform draw in `[0, 1)`.
pub fn next_unit(state: &mut u64) -> f64 {
    (next_u64(state) >> 11) as f64 / (1u64 << 53) as f64
}

pub fn hash_seed(value: &str) -> u64 {
    let mut hash = 1469598103934665603u64;
    for byte in value.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}
