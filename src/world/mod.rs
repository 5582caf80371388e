/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use serde::Serialize;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::BlockPos;

pub mod memory;

pub use memory::MemoryWorld;

/***************************************/
/*       Public data structures        */
/***************************************/

/// Block materials the elevator core distinguishes. Everything that is
/// neither air nor an actuator is an opaque `Solid` id.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Air,
    Solid(u16),
    IronDoor,
    Lever,
    Button,
}

impl Material {
    pub fn is_air(&self) -> bool {
        *self == Material::Air
    }

    /// Door-type blocks toggled with the elevator doors. Naively copying these
    /// one block at a time breaks them, so relocation moves them separately.
    pub fn is_actuator(&self) -> bool {
        matches!(self, Material::IronDoor | Material::Lever)
    }

    /// Blocks a player can press to register a call.
    pub fn is_switch(&self) -> bool {
        matches!(self, Material::Lever | Material::Button)
    }
}

/// Material plus the per-block state bits the elevator reads or writes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockState {
    pub material: Material,
    /// Door leaf open.
    #[serde(default)]
    pub open: bool,
    /// Lever thrown.
    #[serde(default)]
    pub powered: bool,
}

impl BlockState {
    pub const AIR: BlockState = BlockState {
        material: Material::Air,
        open: false,
        powered: false,
    };

    pub const fn new(material: Material) -> BlockState {
        BlockState {
            material,
            open: false,
            powered: false,
        }
    }

    pub fn is_air(&self) -> bool {
        self.material.is_air()
    }

    /// Whether the actuator is in its "open" position. False for anything
    /// that is not an actuator.
    pub fn is_actuated(&self) -> bool {
        match self.material {
            Material::IronDoor => self.open,
            Material::Lever => self.powered,
            _ => false,
        }
    }

    /// Returns the state with the actuator moved to `on`. Non-actuators come
    /// back unchanged.
    pub fn actuated(mut self, on: bool) -> BlockState {
        match self.material {
            Material::IronDoor => self.open = on,
            Material::Lever => self.powered = on,
            _ => {}
        }
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub position: [f64; 3],
    /// Flying entities are not carried by a moving car.
    pub flying: bool,
}

/// Half-open axis-aligned box: `min <= p < max` on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb {
    pub fn contains(&self, p: [f64; 3]) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] < self.max[i])
    }
}

/***************************************/
/*             Public API              */
/***************************************/

/// Block and entity storage of one world. The elevator core talks to the
/// world exclusively through this trait.
pub trait WorldGrid {
    /// Identifier persisted alongside each elevator.
    fn id(&self) -> &str;

    fn block(&self, pos: BlockPos) -> BlockState;

    fn set_block(&mut self, pos: BlockPos, state: BlockState);

    fn entities_in(&self, aabb: &Aabb) -> Vec<Entity>;

    fn teleport(&mut self, id: EntityId, position: [f64; 3]);
}
