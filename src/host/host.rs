/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, info, warn};
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::elevator::{BlockChange, ElevatorManager};
use crate::shared::{BlockPos, ElevatorState};
use crate::world::WorldGrid;

/***************************************/
/*               Enums                 */
/***************************************/

/// Requests the host thread accepts from the outside. Requests that expect
/// an answer carry the sender to reply on.
#[derive(Debug)]
pub enum HostEvent {
    StopRequested {
        elevator: String,
        floor: i32,
        reply: cbc::Sender<bool>,
    },
    CallButtonPressed {
        pos: BlockPos,
        reply: cbc::Sender<Option<bool>>,
    },
    BlockChanged(BlockChange),
    QueryState {
        elevator: String,
        reply: cbc::Sender<Option<ElevatorState>>,
    },
    Shutdown,
}

enum Event {
    Tick,
    Request(HostEvent),
    Terminate,
}

/***************************************/
/*             Public API              */
/***************************************/

/**
 * Single thread that owns the registry and the world.
 *
 * Every elevator step and every request runs on this thread, so movers and
 * configuration changes never interleave. Ticks come from a fixed-period
 * ticker; requests come through `events_rx`.
 *
 * # Fields
 * - `manager`:        Registry of the world's elevators.
 * - `world`:          The world the cars live in.
 * - `events_rx`:      Incoming requests.
 * - `tick_interval`:  Period between mover steps.
 */
pub struct Host<W: WorldGrid> {
    manager: ElevatorManager,
    world: W,
    events_rx: cbc::Receiver<HostEvent>,
    tick_interval: Duration,
}

impl<W: WorldGrid> Host<W> {
    pub fn new(
        manager: ElevatorManager,
        world: W,
        events_rx: cbc::Receiver<HostEvent>,
        tick_interval: Duration,
    ) -> Host<W> {
        Host {
            manager,
            world,
            events_rx,
            tick_interval,
        }
    }

    pub fn manager(&self) -> &ElevatorManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut ElevatorManager {
        &mut self.manager
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    /// Serves ticks and requests until `Shutdown` arrives or every sender is
    /// gone, then unloads all elevators and hands the world back.
    pub fn run(mut self) -> W {
        let ticker = cbc::tick(self.tick_interval);
        info!(
            "Host running for world {} every {:?}",
            self.manager.world(),
            self.tick_interval
        );

        loop {
            match self.wait_for_event(&ticker) {
                Event::Tick => self.manager.tick(&mut self.world),
                Event::Request(event) => {
                    if !self.handle(event) {
                        break;
                    }
                }
                Event::Terminate => {
                    debug!("All request senders dropped");
                    break;
                }
            }
        }

        self.manager.unload_all();
        info!("Host stopped");
        self.world
    }

    /// Applies one request. Returns false for `Shutdown`.
    pub fn handle(&mut self, event: HostEvent) -> bool {
        match event {
            HostEvent::StopRequested {
                elevator,
                floor,
                reply,
            } => {
                let queued = self.manager.add_stop(&elevator, floor);
                if !queued {
                    warn!("Refused stop {} for elevator {}", floor, elevator);
                }
                send_reply(&reply, queued);
            }

            HostEvent::CallButtonPressed { pos, reply } => {
                let result = self.manager.call_button_pressed(pos, &self.world);
                send_reply(&reply, result);
            }

            HostEvent::BlockChanged(change) => {
                self.manager.region_changed(change, &mut self.world);
            }

            HostEvent::QueryState { elevator, reply } => {
                let state = self.manager.get(&elevator).map(|e| e.state());
                send_reply(&reply, state);
            }

            HostEvent::Shutdown => {
                info!("Shutdown requested");
                return false;
            }
        }
        true
    }

    fn wait_for_event(&self, ticker: &cbc::Receiver<std::time::Instant>) -> Event {
        cbc::select! {
            recv(ticker) -> _ => Event::Tick,

            recv(self.events_rx) -> event => {
                match event {
                    Ok(event) => Event::Request(event),
                    Err(_) => Event::Terminate,
                }
            },
        }
    }
}

// Requesters may stop waiting before the reply arrives.
fn send_reply<T>(reply: &cbc::Sender<T>, value: T) {
    if reply.send(value).is_err() {
        debug!("Requester went away before the reply");
    }
}
