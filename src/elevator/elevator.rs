/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::{debug, error, info, warn};
use std::collections::{BTreeMap, BTreeSet};

/***************************************/
/*           Local modules             */
/***************************************/
use super::errors::ElevatorError;
use super::floor::Floor;
use super::geometry::CarGeometry;
use super::mover::{Mover, MoverStatus};
use crate::config::MoverConfig;
use crate::shared::{Behaviour, BlockPos, Direction, ElevatorState, Region};
use crate::store::{ElevatorSnapshot, Store};
use crate::world::WorldGrid;

/**
 * One elevator car and everything configured around it.
 *
 * All configuration changes go through the methods below. Each one stages
 * the change in memory, saves the full snapshot through the `Store`, and
 * either keeps the change (and rescans the car) or rolls it back and
 * returns the error. A failed call leaves the elevator exactly as it was.
 *
 * # Fields
 * - `name`:            Unique key in the registry.
 * - `world`:           Identifier of the world the car lives in.
 * - `region`:          Cuboid the car may occupy.
 * - `doors`:           Car doors, relative to the master block.
 * - `floors`:          Stop points by floor number.
 * - `stops`:           Floor numbers waiting for service.
 * - `geometry`:        Car blocks, master block and envelope.
 * - `doors_open`:      Whether the doors are currently open.
 * - `current_floor`:   Floor of the last arrival.
 * - `mover`:           Present while the car is serving stops.
 * - `halted`:          Set when the mover stopped on an invariant violation.
 * - `loaded`:          Cleared by `unload`; nothing mutates afterwards.
 */
#[derive(Debug)]
pub struct Elevator {
    name: String,
    world: String,
    pub(crate) region: Region,
    doors: Vec<BlockPos>,
    pub(crate) floors: BTreeMap<i32, Floor>,
    pub(crate) stops: BTreeSet<i32>,
    pub(crate) geometry: CarGeometry,
    pub(crate) doors_open: bool,
    pub(crate) current_floor: Option<i32>,
    mover: Option<Mover>,
    mover_config: MoverConfig,
    halted: bool,
    loaded: bool,
}

impl Elevator {
    /// Builds an elevator without persisting it. Use
    /// `ElevatorManager::create` to register a new one; it also rejects
    /// oversized regions, which scan as empty here.
    pub fn new(
        name: &str,
        world: &dyn WorldGrid,
        loc1: BlockPos,
        loc2: BlockPos,
        config: &MoverConfig,
    ) -> Elevator {
        let region = Region::new(loc1, loc2);
        Elevator {
            name: name.to_string(),
            world: world.id().to_string(),
            region,
            doors: Vec::new(),
            floors: BTreeMap::new(),
            stops: BTreeSet::new(),
            geometry: CarGeometry::scan(&region, world, None),
            doors_open: false,
            current_floor: None,
            mover: None,
            mover_config: config.clone(),
            halted: false,
            loaded: true,
        }
    }

    pub fn from_snapshot(
        snapshot: &ElevatorSnapshot,
        world: &dyn WorldGrid,
        config: &MoverConfig,
    ) -> Elevator {
        let mut elevator = Elevator::new(&snapshot.name, world, snapshot.loc1, snapshot.loc2, config);
        elevator.world = snapshot.world.clone();
        elevator.doors = snapshot.doors.clone();
        for floor in &snapshot.floors {
            elevator
                .floors
                .insert(floor.floor, Floor::from_snapshot(&snapshot.name, floor));
        }
        elevator
    }

    pub fn snapshot(&self) -> ElevatorSnapshot {
        ElevatorSnapshot {
            name: self.name.clone(),
            world: self.world.clone(),
            loc1: self.region.loc1,
            loc2: self.region.loc2,
            doors: self.doors.clone(),
            floors: self.floors.values().map(Floor::snapshot).collect(),
        }
    }

    /***************************************/
    /*              Queries                */
    /***************************************/
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn world(&self) -> &str {
        &self.world
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn doors(&self) -> &[BlockPos] {
        &self.doors
    }

    pub fn contains_door(&self, door: BlockPos) -> bool {
        self.doors.contains(&door)
    }

    pub fn floors(&self) -> &BTreeMap<i32, Floor> {
        &self.floors
    }

    pub fn floor(&self, number: i32) -> Option<&Floor> {
        self.floors.get(&number)
    }

    pub fn contains_floor(&self, number: i32) -> bool {
        self.floors.contains_key(&number)
    }

    pub fn stops(&self) -> &BTreeSet<i32> {
        &self.stops
    }

    pub fn geometry(&self) -> &CarGeometry {
        &self.geometry
    }

    pub fn master_block(&self) -> Option<BlockPos> {
        self.geometry.master
    }

    pub fn doors_open(&self) -> bool {
        self.doors_open
    }

    pub fn current_floor(&self) -> Option<i32> {
        self.current_floor
    }

    pub fn direction(&self) -> Direction {
        self.mover
            .as_ref()
            .map(Mover::direction)
            .unwrap_or(Direction::Unset)
    }

    pub fn is_active(&self) -> bool {
        self.mover.is_some()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn state(&self) -> ElevatorState {
        let behaviour = if self.halted {
            Behaviour::Error
        } else if self.mover.is_none() {
            Behaviour::Idle
        } else if self.doors_open {
            Behaviour::DoorOpen
        } else {
            Behaviour::Moving
        };
        ElevatorState {
            behaviour,
            floor: self.current_floor,
            direction: self.direction(),
            stops: self.stops.clone(),
            doors_open: self.doors_open,
            master_block: self.geometry.master,
        }
    }

    /// Queued floors that still exist, in floor-number order.
    pub(crate) fn queued_floors(&self) -> impl Iterator<Item = &Floor> + '_ {
        self.stops.iter().filter_map(move |n| self.floors.get(n))
    }

    /***************************************/
    /*           Configuration             */
    /***************************************/

    /// Moves the region. On success the doors are closed, the car is
    /// rescanned and pending stops are dropped, since they were routed for
    /// the old region.
    pub fn set_location(
        &mut self,
        loc1: BlockPos,
        loc2: BlockPos,
        store: &mut dyn Store,
        world: &mut dyn WorldGrid,
    ) -> Result<(), ElevatorError> {
        self.ensure_loaded()?;
        let region = Region::new(loc1, loc2);
        if !region.is_valid() {
            return Err(ElevatorError::InvalidRegion(region));
        }
        let old = std::mem::replace(&mut self.region, region);
        if let Err(e) = self.persist(store) {
            self.region = old;
            return Err(e);
        }
        self.reload(world, None);
        Ok(())
    }

    /// Adds a car door, given relative to the master block.
    pub fn add_door(
        &mut self,
        door: BlockPos,
        store: &mut dyn Store,
        world: &dyn WorldGrid,
    ) -> Result<(), ElevatorError> {
        self.ensure_loaded()?;
        if self.contains_door(door) {
            return Err(ElevatorError::DuplicateDoor(door));
        }
        self.doors.push(door);
        if let Err(e) = self.persist(store) {
            self.doors.pop();
            return Err(e);
        }
        self.recompute(world);
        Ok(())
    }

    pub fn remove_door(
        &mut self,
        door: BlockPos,
        store: &mut dyn Store,
        world: &dyn WorldGrid,
    ) -> Result<(), ElevatorError> {
        self.ensure_loaded()?;
        let index = self
            .doors
            .iter()
            .position(|d| *d == door)
            .ok_or(ElevatorError::DoorNotFound(door))?;
        let removed = self.doors.remove(index);
        if let Err(e) = self.persist(store) {
            self.doors.insert(index, removed);
            return Err(e);
        }
        self.recompute(world);
        Ok(())
    }

    /// Registers a floor, replacing any floor with the same number.
    pub fn add_floor(
        &mut self,
        number: i32,
        location: BlockPos,
        store: &mut dyn Store,
        world: &dyn WorldGrid,
    ) -> Result<(), ElevatorError> {
        self.ensure_loaded()?;
        let previous = self
            .floors
            .insert(number, Floor::new(&self.name, number, location));
        if let Err(e) = self.persist(store) {
            match previous {
                Some(floor) => self.floors.insert(number, floor),
                None => self.floors.remove(&number),
            };
            return Err(e);
        }
        self.recompute(world);
        if let Some(master) = self.geometry.master {
            if master.x != location.x || master.z != location.z {
                warn!(
                    "Floor {} of elevator {} at {} is not in line with the master block at {}",
                    number, self.name, location, master
                );
            }
        }
        Ok(())
    }

    /// Removes a floor. A pending stop for it is dropped; if the car is
    /// standing at it with doors open, its landing doors are closed first.
    pub fn remove_floor(
        &mut self,
        number: i32,
        store: &mut dyn Store,
        world: &mut dyn WorldGrid,
    ) -> Result<(), ElevatorError> {
        self.ensure_loaded()?;
        let floor = self
            .floors
            .remove(&number)
            .ok_or(ElevatorError::UnknownFloor(number))?;
        if let Err(e) = self.persist(store) {
            self.floors.insert(number, floor);
            return Err(e);
        }

        self.stops.remove(&number);
        if self.current_floor == Some(number) {
            if self.doors_open {
                for pos in floor.doors() {
                    let state = world.block(*pos);
                    if state.material.is_actuator() {
                        world.set_block(*pos, state.actuated(false));
                    }
                }
            }
            self.current_floor = None;
        }
        self.recompute(&*world);
        Ok(())
    }

    /// Adds a landing door, given in absolute coordinates.
    pub fn add_floor_door(
        &mut self,
        number: i32,
        door: BlockPos,
        store: &mut dyn Store,
        world: &dyn WorldGrid,
    ) -> Result<(), ElevatorError> {
        self.ensure_loaded()?;
        let floor = self.floor_mut(number)?;
        if floor.contains_door(door) {
            return Err(ElevatorError::DuplicateDoor(door));
        }
        floor.doors.push(door);
        if let Err(e) = self.persist(store) {
            if let Some(floor) = self.floors.get_mut(&number) {
                floor.doors.pop();
            }
            return Err(e);
        }
        self.recompute(world);
        Ok(())
    }

    pub fn remove_floor_door(
        &mut self,
        number: i32,
        door: BlockPos,
        store: &mut dyn Store,
        world: &dyn WorldGrid,
    ) -> Result<(), ElevatorError> {
        self.ensure_loaded()?;
        let floor = self.floor_mut(number)?;
        let index = floor
            .doors
            .iter()
            .position(|d| *d == door)
            .ok_or(ElevatorError::DoorNotFound(door))?;
        floor.doors.remove(index);
        if let Err(e) = self.persist(store) {
            if let Some(floor) = self.floors.get_mut(&number) {
                floor.doors.insert(index, door);
            }
            return Err(e);
        }
        self.recompute(world);
        Ok(())
    }

    /// Sets or clears (`None`) the call button of a floor.
    pub fn set_floor_call_button(
        &mut self,
        number: i32,
        button: Option<BlockPos>,
        store: &mut dyn Store,
    ) -> Result<(), ElevatorError> {
        self.ensure_loaded()?;
        let floor = self.floor_mut(number)?;
        let previous = std::mem::replace(&mut floor.call_button, button);
        if let Err(e) = self.persist(store) {
            if let Some(floor) = self.floors.get_mut(&number) {
                floor.call_button = previous;
            }
            return Err(e);
        }
        Ok(())
    }

    /***************************************/
    /*             Dispatch                */
    /***************************************/

    /// Queues a stop and starts the mover if the car is idle. Returns false
    /// if the elevator is unloaded or the floor is not registered.
    pub fn add_stop(&mut self, floor: i32) -> bool {
        if !self.loaded || !self.contains_floor(floor) {
            return false;
        }
        self.stops.insert(floor);
        if self.halted {
            warn!(
                "Elevator {} is halted, stop {} stays queued until it is reconfigured",
                self.name, floor
            );
        } else if self.mover.is_none() && self.geometry.master.is_some() {
            debug!("Starting mover of elevator {}", self.name);
            self.mover = Some(Mover::new(&self.mover_config));
        }
        true
    }

    /// Runs one mover step. Does nothing while idle, halted or unloaded.
    pub fn tick(&mut self, world: &mut dyn WorldGrid) {
        if !self.loaded {
            return;
        }
        let Some(mut mover) = self.mover.take() else {
            return;
        };
        match mover.tick(self, world) {
            MoverStatus::Running => self.mover = Some(mover),
            MoverStatus::Finished => debug!("Elevator {} is idle", self.name),
            MoverStatus::Halted => {
                error!("Elevator {} halted until it is reconfigured", self.name);
                self.halted = true;
            }
        }
    }

    /***************************************/
    /*             Lifecycle               */
    /***************************************/

    /// Stops the mover and refuses every further mutation. Idempotent.
    pub fn unload(&mut self) {
        if self.loaded {
            self.mover = None;
            self.loaded = false;
            info!("Elevator {} unloaded", self.name);
        }
    }

    /// Full reset after the region or its contents changed: close the doors,
    /// rescan the car, drop pending stops, stop the mover and clear a halt.
    pub(crate) fn reload(&mut self, world: &mut dyn WorldGrid, ignore: Option<BlockPos>) {
        // Doors resolve against the old master block, so close them first
        self.set_doors_state(false, world);
        self.geometry = CarGeometry::scan(&self.region, &*world, ignore);
        self.stops.clear();
        self.mover = None;
        self.halted = false;
    }

    /// Rescans the car after a configuration change, keeping the queue.
    fn recompute(&mut self, world: &dyn WorldGrid) {
        self.geometry = CarGeometry::scan(&self.region, world, None);
        self.halted = false;
    }

    fn ensure_loaded(&self) -> Result<(), ElevatorError> {
        if self.loaded {
            Ok(())
        } else {
            Err(ElevatorError::Unloaded(self.name.clone()))
        }
    }

    fn floor_mut(&mut self, number: i32) -> Result<&mut Floor, ElevatorError> {
        self.floors
            .get_mut(&number)
            .ok_or(ElevatorError::UnknownFloor(number))
    }

    fn persist(&self, store: &mut dyn Store) -> Result<(), ElevatorError> {
        store
            .save(&self.name, Some(&self.snapshot()))
            .map_err(|e| {
                error!("Failed to save elevator {}: {}", self.name, e);
                ElevatorError::Persistence(e)
            })
    }
}
