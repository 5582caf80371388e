/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::{debug, error, info, warn};
use std::collections::{BTreeMap, BTreeSet};

/***************************************/
/*           Local modules             */
/***************************************/
use super::elevator::Elevator;
use super::errors::ElevatorError;
use crate::config::MoverConfig;
use crate::shared::{BlockPos, Region};
use crate::store::Store;
use crate::world::WorldGrid;

/// A block edit reported by the world, used to keep car geometry current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockChange {
    Placed(BlockPos),
    /// Reported before the block is gone, so the rescan skips it.
    Broken(BlockPos),
}

impl BlockChange {
    pub fn pos(&self) -> BlockPos {
        match *self {
            BlockChange::Placed(pos) | BlockChange::Broken(pos) => pos,
        }
    }
}

/**
 * Registry of the elevators of one world.
 *
 * Owns the store and every loaded elevator. Elevators stored for other worlds
 * stay untouched in the store, but their names stay reserved so a new
 * elevator cannot overwrite them.
 *
 * Dropping the manager unloads every elevator.
 *
 * # Fields
 * - `store`:         Persistence shared by all elevators.
 * - `world`:         Identifier of the world this registry serves.
 * - `elevators`:     Loaded elevators by name.
 * - `foreign`:       Names stored for other worlds.
 * - `mover_config`:  Mover settings handed to every elevator.
 */
pub struct ElevatorManager {
    store: Box<dyn Store>,
    world: String,
    elevators: BTreeMap<String, Elevator>,
    foreign: BTreeSet<String>,
    mover_config: MoverConfig,
}

impl ElevatorManager {
    /// Reconstructs every stored elevator of `world`. A store that cannot be
    /// loaded yields an empty registry.
    pub fn load(
        mut store: Box<dyn Store>,
        world: &dyn WorldGrid,
        config: &MoverConfig,
    ) -> ElevatorManager {
        let snapshots = match store.load() {
            Ok(snapshots) => snapshots,
            Err(e) => {
                error!("Unable to load elevators: {}", e);
                Vec::new()
            }
        };

        let mut elevators = BTreeMap::new();
        let mut foreign = BTreeSet::new();
        for snapshot in &snapshots {
            if snapshot.world != world.id() {
                debug!(
                    "Skipping elevator {} of world {}",
                    snapshot.name, snapshot.world
                );
                foreign.insert(snapshot.name.clone());
                continue;
            }
            elevators.insert(
                snapshot.name.clone(),
                Elevator::from_snapshot(snapshot, world, config),
            );
        }
        info!("Loaded {} elevators for world {}", elevators.len(), world.id());

        ElevatorManager {
            store,
            world: world.id().to_string(),
            elevators,
            foreign,
            mover_config: config.clone(),
        }
    }

    pub fn world(&self) -> &str {
        &self.world
    }

    pub fn contains(&self, name: &str) -> bool {
        self.elevators.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Elevator> {
        self.elevators.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.elevators.keys().map(String::as_str)
    }

    pub fn elevators(&self) -> impl Iterator<Item = &Elevator> + '_ {
        self.elevators.values()
    }

    /// Registers and persists a new elevator spanning `loc1`..`loc2`.
    pub fn create(
        &mut self,
        name: &str,
        loc1: BlockPos,
        loc2: BlockPos,
        world: &dyn WorldGrid,
    ) -> Result<(), ElevatorError> {
        if self.elevators.contains_key(name) || self.foreign.contains(name) {
            return Err(ElevatorError::DuplicateName(name.to_string()));
        }
        let region = Region::new(loc1, loc2);
        if !region.is_valid() {
            return Err(ElevatorError::InvalidRegion(region));
        }
        let elevator = Elevator::new(name, world, loc1, loc2, &self.mover_config);
        self.store
            .save(name, Some(&elevator.snapshot()))
            .map_err(|e| {
                error!("Failed to save elevator {}: {}", name, e);
                ElevatorError::Persistence(e)
            })?;
        info!("Elevator {} created", name);
        self.elevators.insert(name.to_string(), elevator);
        Ok(())
    }

    /// Deletes an elevator from the store, then unloads and drops it.
    pub fn delete(&mut self, name: &str) -> Result<(), ElevatorError> {
        if !self.elevators.contains_key(name) {
            return Err(ElevatorError::UnknownElevator(name.to_string()));
        }
        self.store.save(name, None).map_err(|e| {
            error!("Failed to delete elevator {}: {}", name, e);
            ElevatorError::Persistence(e)
        })?;
        if let Some(mut elevator) = self.elevators.remove(name) {
            elevator.unload();
        }
        info!("Elevator {} deleted", name);
        Ok(())
    }

    /// Runs `f` with the named elevator and the store it persists through.
    pub fn with_elevator<R>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut Elevator, &mut dyn Store) -> R,
    ) -> Result<R, ElevatorError> {
        let elevator = self
            .elevators
            .get_mut(name)
            .ok_or_else(|| ElevatorError::UnknownElevator(name.to_string()))?;
        Ok(f(elevator, self.store.as_mut()))
    }

    pub fn add_stop(&mut self, name: &str, floor: i32) -> bool {
        self.elevators
            .get_mut(name)
            .map_or(false, |elevator| elevator.add_stop(floor))
    }

    /// The elevator whose region contains `pos`, e.g. the car a rider is in.
    pub fn elevator_at(&self, pos: BlockPos) -> Option<&Elevator> {
        self.elevators
            .values()
            .find(|elevator| elevator.region().contains(pos))
    }

    /// Routes a press at `pos` to the floor whose call button sits there.
    /// Returns `None` if no call button is at `pos`, otherwise whether the
    /// stop was queued.
    pub fn call_button_pressed(&mut self, pos: BlockPos, world: &dyn WorldGrid) -> Option<bool> {
        if !world.block(pos).material.is_switch() {
            return None;
        }
        let (name, floor) = self.elevators.values().find_map(|elevator| {
            elevator
                .floors()
                .values()
                .find(|floor| floor.is_call_button(pos))
                .map(|floor| (elevator.name().to_string(), floor.number()))
        })?;
        let queued = self.add_stop(&name, floor);
        if queued {
            info!("Elevator {} called to floor {}", name, floor);
        } else {
            warn!("Failed to queue elevator {} to floor {}", name, floor);
        }
        Some(queued)
    }

    /// Reloads every elevator whose region contains the changed block.
    pub fn region_changed(&mut self, change: BlockChange, world: &mut dyn WorldGrid) {
        let ignore = match change {
            BlockChange::Broken(pos) => Some(pos),
            BlockChange::Placed(_) => None,
        };
        for elevator in self.elevators.values_mut() {
            if elevator.is_loaded() && elevator.region().contains(change.pos()) {
                debug!("Block changed inside elevator {}, reloading", elevator.name());
                elevator.reload(world, ignore);
            }
        }
    }

    pub fn tick(&mut self, world: &mut dyn WorldGrid) {
        for elevator in self.elevators.values_mut() {
            elevator.tick(world);
        }
    }

    pub fn unload_all(&mut self) {
        for elevator in self.elevators.values_mut() {
            elevator.unload();
        }
    }
}

impl Drop for ElevatorManager {
    fn drop(&mut self) {
        self.unload_all();
    }
}
