pub mod macros;
pub mod structs;

pub use structs::Behaviour;
pub use structs::BlockPos;
pub use structs::Direction;
pub use structs::ElevatorState;
pub use structs::Region;
pub use structs::MAX_REGION_VOLUME;
