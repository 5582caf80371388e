pub mod elevator;
pub mod errors;
pub mod floor;
pub mod geometry;
pub mod manager;
mod mover;

#[cfg(test)]
mod manager_tests;

pub use elevator::Elevator;
pub use errors::ElevatorError;
pub use floor::Floor;
pub use geometry::CarGeometry;
pub use manager::{BlockChange, ElevatorManager};
