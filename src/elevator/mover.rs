use log::{error, warn};

use super::elevator::Elevator;
use crate::config::MoverConfig;
use crate::shared::{BlockPos, Direction};
use crate::world::{BlockState, WorldGrid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MoverStatus {
    Running,
    /// Queue drained, the car is idle again.
    Finished,
    /// Invariant violation; the mover must not run again until the elevator
    /// is reconfigured.
    Halted,
}

/**
 * Tick-driven state machine that serves an elevator's stop queue.
 *
 * The elevator owns at most one mover and calls `tick` once per host period.
 * Each tick does exactly one of: count down the dwell delay, finish, open the
 * doors at an arrived stop, or move the car one block.
 *
 * # Fields
 * - `direction`:    Current travel direction, `Unset` until the first move.
 * - `delay`:        Remaining dwell ticks at the current stop.
 * - `dwell_ticks`:  Dwell length set on every arrival.
 */
#[derive(Debug, Clone)]
pub(crate) struct Mover {
    direction: Direction,
    delay: u32,
    dwell_ticks: u32,
}

impl Mover {
    pub(crate) fn new(config: &MoverConfig) -> Mover {
        Mover {
            direction: Direction::Unset,
            delay: 0,
            dwell_ticks: config.dwell_ticks,
        }
    }

    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn tick(&mut self, car: &mut Elevator, world: &mut dyn WorldGrid) -> MoverStatus {
        if self.delay > 0 {
            self.delay -= 1;
            return MoverStatus::Running;
        }

        let Some(master) = car.geometry.master else {
            warn!("Elevator {} has no blocks left, stopping", car.name());
            return MoverStatus::Finished;
        };

        // Leaving a stop: turn around if nothing is left ahead
        if car.doors_open && self.direction != Direction::Unset {
            let direction = self.direction;
            let nothing_ahead = car.queued_floors().all(|floor| match direction {
                Direction::Up => floor.location().y <= master.y,
                _ => floor.location().y >= master.y,
            });
            if nothing_ahead {
                self.direction = direction.reversed();
            }
        }

        car.set_doors_state(false, world);

        if car.stops.is_empty() {
            return MoverStatus::Finished;
        }

        if self.direction == Direction::Unset {
            self.direction = choose_direction(car, master);
        }

        let arrived = car
            .queued_floors()
            .find(|floor| floor.is_reached_by(master))
            .map(|floor| floor.number());
        if let Some(arrived) = arrived {
            // Matched on the full location, so this is the floor at the
            // master block's height
            self.delay = self.dwell_ticks;
            car.current_floor = Some(arrived);
            car.set_doors_state(true, world);
            car.stops.remove(&arrived);
            return MoverStatus::Running;
        }

        let dy = self.direction.delta();
        if !car.geometry.fits_after_shift(&car.region, dy) {
            let (way, limit) = match self.direction {
                Direction::Up => ("up", "max"),
                _ => ("down", "min"),
            };
            error!(
                "Elevator {} was going {} and reached {} height, but still didn't arrive at a stop! \
                 Please check if floor coordinates are correct.",
                car.name(),
                way,
                limit
            );
            return MoverStatus::Halted;
        }
        car.move_blocks(dy, world);
        MoverStatus::Running
    }
}

/// Heads for the queued floor closest in height: up only if it is strictly
/// above the master block, down otherwise. Equally close floors resolve to
/// the lower one.
fn choose_direction(car: &Elevator, master: BlockPos) -> Direction {
    let closest = car
        .queued_floors()
        .map(|floor| floor.location().y)
        .min_by_key(|y| ((i64::from(*y) - i64::from(master.y)).abs(), *y));
    match closest {
        Some(y) if y > master.y => Direction::Up,
        _ => Direction::Down,
    }
}

impl Elevator {
    /// Shifts the car, and every non-flying entity riding in it, by `dy`
    /// blocks along Y.
    pub(crate) fn move_blocks(&mut self, dy: i32, world: &mut dyn WorldGrid) {
        let Some(master) = self.geometry.master else {
            return;
        };
        if dy == 0 {
            return;
        }

        if let Some(envelope) = self.geometry.envelope() {
            for entity in world.entities_in(&envelope) {
                if !entity.flying {
                    let [x, y, z] = entity.position;
                    world.teleport(entity.id, [x, y + dy as f64, z]);
                }
            }
        }

        // Actuators break when copied cell by cell. Lift them out first and
        // put them back once the rest of the car has moved.
        let blocks = &mut self.geometry.blocks;
        let mut lifted: Vec<(usize, BlockState)> = Vec::new();
        for (i, pos) in blocks.iter().enumerate() {
            let state = world.block(*pos);
            if state.material.is_actuator() {
                lifted.push((i, state));
            }
        }
        let mut skip = vec![false; blocks.len()];
        for (i, _) in &lifted {
            world.set_block(blocks[*i], BlockState::AIR);
            blocks[*i] = blocks[*i].offset_y(dy);
            skip[*i] = true;
        }

        // Going up, move the far end first so no block lands on one that
        // has not moved yet; going down, the near end.
        let order: Vec<usize> = if dy > 0 {
            (0..blocks.len()).rev().collect()
        } else {
            (0..blocks.len()).collect()
        };
        for i in order {
            if skip[i] {
                continue;
            }
            let from = blocks[i];
            let to = from.offset_y(dy);
            let state = world.block(from);
            world.set_block(to, state);
            world.set_block(from, BlockState::AIR);
            blocks[i] = to;
        }

        for (i, state) in lifted {
            world.set_block(blocks[i], state);
        }

        self.geometry.master = Some(master.offset_y(dy));
    }

    /// Opens or closes the car doors and the landing doors of the current
    /// floor. Positions that do not hold an actuator are reported and left
    /// alone.
    pub(crate) fn set_doors_state(&mut self, open: bool, world: &mut dyn WorldGrid) {
        if open == self.doors_open {
            return;
        }

        let landing: Vec<BlockPos> = self
            .current_floor
            .and_then(|n| self.floor(n))
            .map(|floor| floor.doors().to_vec())
            .unwrap_or_default();
        let car: Vec<BlockPos> = match self.geometry.master {
            Some(master) => self
                .doors()
                .iter()
                .filter_map(|door| master.checked_add(*door))
                .collect(),
            None => Vec::new(),
        };

        if landing
            .iter()
            .any(|pos| !world.block(*pos).material.is_actuator())
        {
            warn!(
                "One of floor {:?} of elevator {}'s doors is not a door block!",
                self.current_floor,
                self.name()
            );
        }
        if car.iter().any(|pos| !world.block(*pos).material.is_actuator()) {
            warn!("One of elevator {}'s doors is not a door block!", self.name());
        }

        for pos in landing.iter().chain(car.iter()) {
            let state = world.block(*pos);
            if state.material.is_actuator() {
                world.set_block(*pos, state.actuated(open));
            }
        }
        self.doors_open = open;
    }
}
