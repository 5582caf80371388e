//! Durable storage of elevator configuration.
//!
//! Every implementation must honour one rule: a failed `save` leaves whatever
//! a later `load` would return exactly as it was.

use std::fmt;

pub mod json;
pub mod memory;
pub mod snapshot;

#[cfg(test)]
mod store_tests;

pub use json::JsonStore;
pub use memory::MemoryStore;
pub use snapshot::{Document, ElevatorSnapshot, FloorSnapshot, FILE_VERSION};

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    Io(String),
    Parse(String),
    Version { expected: u32, found: u32 },
    /// The backing file could not be understood at load time, so writes are
    /// refused rather than clobbering it.
    ReadOnly(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(message) => write!(f, "elevator store io error: {message}"),
            Self::Parse(message) => write!(f, "failed to parse elevators file: {message}"),
            Self::Version { expected, found } => write!(
                f,
                "elevators file version is incorrect. Expected: {expected} Found: {found}"
            ),
            Self::ReadOnly(reason) => {
                write!(f, "elevator store is read-only after a failed load: {reason}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Load/save of named elevator snapshots.
pub trait Store: Send {
    fn load(&mut self) -> Result<Vec<ElevatorSnapshot>, StoreError>;

    /// Persists `snapshot` under `name`; `None` deletes the elevator.
    fn save(&mut self, name: &str, snapshot: Option<&ElevatorSnapshot>) -> Result<(), StoreError>;
}
