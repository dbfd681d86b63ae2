//! Player module - body components and the reference actuator

mod components;
mod physics;

pub use components::*;
pub use physics::*;
