/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/***************************************/
/*       Public data structures        */
/***************************************/

/// Integer block coordinate. Ordering is lexicographic on (x, y, z), which
/// is the scan order used to pick an elevator's master block.
///
/// Serialized as a plain `[x, y, z]` array.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(from = "[i32; 3]", into = "[i32; 3]")]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> BlockPos {
        BlockPos { x, y, z }
    }

    /// Callers check that the result stays in range, see
    /// `CarGeometry::fits_after_shift`.
    pub fn offset_y(self, dy: i32) -> BlockPos {
        BlockPos::new(self.x, self.y + dy, self.z)
    }

    /// `None` if any axis leaves the `i32` range.
    pub fn checked_add(self, other: BlockPos) -> Option<BlockPos> {
        Some(BlockPos::new(
            self.x.checked_add(other.x)?,
            self.y.checked_add(other.y)?,
            self.z.checked_add(other.z)?,
        ))
    }
}

impl From<[i32; 3]> for BlockPos {
    fn from(item: [i32; 3]) -> Self {
        BlockPos::new(item[0], item[1], item[2])
    }
}

impl From<BlockPos> for [i32; 3] {
    fn from(item: BlockPos) -> Self {
        [item.x, item.y, item.z]
    }
}


impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

/// Most blocks an elevator region may span.
pub const MAX_REGION_VOLUME: i64 = 1 << 20;

/// Cuboid spanned by two corners. The corners are kept exactly as given so
/// they round-trip through storage; `min`/`max` normalise them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub loc1: BlockPos,
    pub loc2: BlockPos,
}

impl Region {
    pub fn new(loc1: BlockPos, loc2: BlockPos) -> Region {
        Region { loc1, loc2 }
    }

    pub fn min(&self) -> BlockPos {
        BlockPos::new(
            self.loc1.x.min(self.loc2.x),
            self.loc1.y.min(self.loc2.y),
            self.loc1.z.min(self.loc2.z),
        )
    }

    pub fn max(&self) -> BlockPos {
        BlockPos::new(
            self.loc1.x.max(self.loc2.x),
            self.loc1.y.max(self.loc2.y),
            self.loc1.z.max(self.loc2.z),
        )
    }

    pub fn height(&self) -> i32 {
        self.max().y.saturating_sub(self.min().y).saturating_add(1)
    }

    /// Number of blocks inside, `None` if it does not fit an `i64`.
    pub fn volume(&self) -> Option<i64> {
        let (min, max) = (self.min(), self.max());
        let extent = |low: i32, high: i32| i64::from(high) - i64::from(low) + 1;
        extent(min.x, max.x)
            .checked_mul(extent(min.y, max.y))?
            .checked_mul(extent(min.z, max.z))
    }

    /// Whether an elevator may use this region.
    pub fn is_valid(&self) -> bool {
        self.volume().map_or(false, |volume| volume <= MAX_REGION_VOLUME)
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        let (min, max) = (self.min(), self.max());
        pos.x >= min.x
            && pos.x <= max.x
            && pos.y >= min.y
            && pos.y <= max.y
            && pos.z >= min.z
            && pos.z <= max.z
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    /// No direction chosen yet; a fresh mover starts here.
    Unset,
}

impl Direction {
    pub fn delta(&self) -> i32 {
        match *self {
            Direction::Up => 1,
            Direction::Down => -1,
            Direction::Unset => 0,
        }
    }

    pub fn reversed(&self) -> Direction {
        match *self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Unset => Direction::Unset,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    #[serde(rename = "idle")]
    Idle,
    #[serde(rename = "moving")]
    Moving,
    #[serde(rename = "doorOpen")]
    DoorOpen,
    /// Mover halted on an invariant violation.
    #[serde(rename = "error")]
    Error,
}

/// Point-in-time view of one elevator, handed out to callers that only want
/// to observe it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ElevatorState {
    pub behaviour: Behaviour,
    pub floor: Option<i32>,
    pub direction: Direction,
    pub stops: BTreeSet<i32>,
    #[serde(rename = "doorsOpen")]
    pub doors_open: bool,
    #[serde(rename = "masterBlock")]
    pub master_block: Option<BlockPos>,
}
