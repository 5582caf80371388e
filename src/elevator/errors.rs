use std::fmt;

use crate::shared::{BlockPos, Region, MAX_REGION_VOLUME};
use crate::store::StoreError;

/// Why an elevator operation was refused. Every variant except `Persistence`
/// is raised before anything is mutated; `Persistence` is raised after the
/// staged change has been rolled back. Either way the elevator is unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum ElevatorError {
    DuplicateName(String),
    UnknownElevator(String),
    UnknownFloor(i32),
    DuplicateDoor(BlockPos),
    DoorNotFound(BlockPos),
    /// Region larger than `MAX_REGION_VOLUME` blocks.
    InvalidRegion(Region),
    Unloaded(String),
    Persistence(StoreError),
}

impl ElevatorError {
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Persistence(_))
    }
}

impl fmt::Display for ElevatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName(name) => write!(f, "elevator {name} already exists"),
            Self::UnknownElevator(name) => write!(f, "elevator {name} does not exist"),
            Self::UnknownFloor(floor) => write!(f, "floor {floor} does not exist"),
            Self::DuplicateDoor(pos) => write!(f, "door at {pos} already exists"),
            Self::DoorNotFound(pos) => write!(f, "no door at {pos}"),
            Self::InvalidRegion(region) => write!(
                f,
                "region {} .. {} spans more than {MAX_REGION_VOLUME} blocks",
                region.loc1, region.loc2
            ),
            Self::Unloaded(name) => write!(f, "elevator {name} is unloaded"),
            Self::Persistence(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for ElevatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Persistence(error) => Some(error),
            _ => None,
        }
    }
}

impl From<StoreError> for ElevatorError {
    fn from(value: StoreError) -> Self {
        Self::Persistence(value)
    }
}
