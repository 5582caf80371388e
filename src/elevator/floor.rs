use super::elevator::Elevator;
use super::errors::ElevatorError;
use crate::shared::BlockPos;
use crate::store::{FloorSnapshot, Store};
use crate::world::WorldGrid;

/**
 * A stop point of one elevator.
 *
 * Floors are owned by their elevator's floor map and only change through the
 * elevator, which persists every change. `elevator` is the owner's name and
 * is kept for log messages and call-button routing, not for ownership.
 *
 * # Fields
 * - `elevator`:     Name of the owning elevator.
 * - `number`:       Floor number, unique within the elevator.
 * - `location`:     Where the master block sits when the car is at this floor.
 * - `doors`:        Absolute positions of the landing doors.
 * - `call_button`:  Optional position of the button that calls the car here.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Floor {
    elevator: String,
    number: i32,
    location: BlockPos,
    pub(crate) doors: Vec<BlockPos>,
    pub(crate) call_button: Option<BlockPos>,
}

impl Floor {
    pub(crate) fn new(elevator: &str, number: i32, location: BlockPos) -> Floor {
        Floor {
            elevator: elevator.to_string(),
            number,
            location,
            doors: Vec::new(),
            call_button: None,
        }
    }

    /// Registers a new floor on `elevator` and persists it.
    pub fn create(
        elevator: &mut Elevator,
        number: i32,
        location: BlockPos,
        store: &mut dyn Store,
        world: &dyn WorldGrid,
    ) -> Result<(), ElevatorError> {
        elevator.add_floor(number, location, store, world)
    }

    pub(crate) fn from_snapshot(elevator: &str, snapshot: &FloorSnapshot) -> Floor {
        Floor {
            elevator: elevator.to_string(),
            number: snapshot.floor,
            location: snapshot.loc,
            doors: snapshot.doors.clone(),
            call_button: snapshot.call_button,
        }
    }

    pub(crate) fn snapshot(&self) -> FloorSnapshot {
        FloorSnapshot {
            floor: self.number,
            loc: self.location,
            doors: self.doors.clone(),
            call_button: self.call_button,
        }
    }

    pub fn elevator(&self) -> &str {
        &self.elevator
    }

    pub fn number(&self) -> i32 {
        self.number
    }

    pub fn location(&self) -> BlockPos {
        self.location
    }

    pub fn doors(&self) -> &[BlockPos] {
        &self.doors
    }

    pub fn contains_door(&self, pos: BlockPos) -> bool {
        self.doors.contains(&pos)
    }

    pub fn call_button(&self) -> Option<BlockPos> {
        self.call_button
    }

    pub fn is_call_button(&self, pos: BlockPos) -> bool {
        self.call_button == Some(pos)
    }

    /// True when the master block sits exactly on this floor's location.
    pub fn is_reached_by(&self, master: BlockPos) -> bool {
        self.location == master
    }
}
