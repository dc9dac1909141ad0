pub mod character;
pub mod clock;
pub mod elements;
pub mod environment;
pub mod library;
pub mod physics;
pub mod selection;
pub mod selector;
pub mod stepper;
