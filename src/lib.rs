//! Elevators for a voxel world: a car is a set of blocks inside a vertical
//! region that the host moves one block per tick between registered floors.

pub mod config;
pub mod elevator;
pub mod host;
pub mod shared;
pub mod store;
pub mod world;

pub use config::Config;
pub use elevator::{Elevator, ElevatorError, ElevatorManager, Floor};
pub use host::{Host, HostEvent};
pub use store::{JsonStore, MemoryStore, Store, StoreError};
pub use world::{MemoryWorld, WorldGrid};
