pub mod ecs;
pub mod rng;
pub mod serialization;
pub mod world;
