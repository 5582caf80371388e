/* 3rd party libraries */
use clap::{Arg, Command};
use crossbeam_channel as cbc;
use log::{info, warn};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::thread::Builder;

/* Custom libraries */
use voxel_elevator::config::{self, Config};
use voxel_elevator::elevator::{BlockChange, ElevatorManager};
use voxel_elevator::host::{Host, HostEvent};
use voxel_elevator::shared::{BlockPos, Region};
use voxel_elevator::store::JsonStore;
use voxel_elevator::unwrap_or_exit;
use voxel_elevator::world::{BlockState, Material, MemoryWorld, WorldGrid};

const DEFAULT_CONFIG: &str = "config.toml";
const DEMO_ELEVATOR: &str = "demo";

/* Main */
fn main() {
    let matches = Command::new("voxel-elevator")
        .about("Runs block elevators in an in-memory voxel world")
        .arg(
            Arg::new("config")
                .long("config")
                .takes_value(true)
                .help("Path to the configuration file"),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .takes_value(true)
                .help("Path to the elevators file, overrides the configuration"),
        )
        .arg(
            Arg::new("demo")
                .long("demo")
                .help("Build a three floor demo shaft on start"),
        )
        .get_matches();

    // Load the configuration
    let mut config = match matches.value_of("config") {
        Some(path) => config::load_config(Path::new(path)),
        None if Path::new(DEFAULT_CONFIG).exists() => config::load_config(Path::new(DEFAULT_CONFIG)),
        None => Ok(Config::default()),
    }
    .unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });
    if let Some(path) = matches.value_of("store") {
        config.store.path = PathBuf::from(path);
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    // Load the elevators of this world
    let mut world = MemoryWorld::new(&config.world.id);
    let store = JsonStore::open(&config.store.path);
    let mut manager = ElevatorManager::load(Box::new(store), &world, &config.mover);
    if matches.is_present("demo") {
        build_demo(&mut manager, &mut world);
    }

    // Start the host and the console reader
    let (events_tx, events_rx) = cbc::unbounded::<HostEvent>();
    let host = Host::new(manager, world, events_rx, config.mover.tick_interval());

    let console_thread = Builder::new().name("console".into());
    unwrap_or_exit!(console_thread.spawn(move || read_console(events_tx)));

    host.run();
}

/// Three floors stacked nine blocks apart, a 3x3 platform with one car door,
/// and a landing door plus call button on every floor.
fn build_demo(manager: &mut ElevatorManager, world: &mut MemoryWorld) {
    let platform = Region::new(BlockPos::new(0, 0, 0), BlockPos::new(2, 0, 2));
    world.fill(platform, BlockState::new(Material::Solid(1)));
    // Car door, relative to the master block at the origin
    let car_door = BlockPos::new(1, 1, 0);
    world.set_block(car_door, BlockState::new(Material::IronDoor));

    if !manager.contains(DEMO_ELEVATOR) {
        unwrap_or_exit!(manager.create(
            DEMO_ELEVATOR,
            BlockPos::new(0, 0, 0),
            BlockPos::new(2, 20, 2),
            world
        ));
    } else {
        // Stored from an earlier run, before the platform existed
        manager.region_changed(BlockChange::Placed(BlockPos::new(0, 0, 0)), world);
    }

    for (number, y) in [(0, 0), (1, 9), (2, 18)] {
        let landing_door = BlockPos::new(1, y + 1, -1);
        let button = BlockPos::new(3, y + 1, 1);
        world.set_block(landing_door, BlockState::new(Material::IronDoor));
        world.set_block(button, BlockState::new(Material::Button));

        let world = &*world;
        let result = manager.with_elevator(DEMO_ELEVATOR, |elevator, store| {
            elevator.add_floor(number, BlockPos::new(0, y, 0), store, world)?;
            if !elevator.contains_door(car_door) {
                elevator.add_door(car_door, store, world)?;
            }
            elevator.add_floor_door(number, landing_door, store, world)?;
            elevator.set_floor_call_button(number, Some(button), store)
        });
        unwrap_or_exit!(unwrap_or_exit!(result));
    }
    info!("Demo elevator ready, call buttons at x=3 z=1 on heights 1, 10 and 19");
}

/// Turns console lines into host requests until `quit` or end of input.
///
/// ```text
/// stop <elevator> <floor>
/// press <x> <y> <z>
/// state <elevator>
/// quit
/// ```
fn read_console(events_tx: cbc::Sender<HostEvent>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to read console: {}", e);
                break;
            }
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        let served = match words.as_slice() {
            [] => continue,
            ["stop", elevator, floor] => match floor.parse::<i32>() {
                Ok(floor) => request(&events_tx, |reply| HostEvent::StopRequested {
                    elevator: elevator.to_string(),
                    floor,
                    reply,
                })
                .map(|queued| println!("{}", if queued { "queued" } else { "refused" })),
                Err(_) => {
                    println!("floor must be a number");
                    Some(())
                }
            },
            ["press", x, y, z] => {
                match (x.parse::<i32>(), y.parse::<i32>(), z.parse::<i32>()) {
                    (Ok(x), Ok(y), Ok(z)) => request(&events_tx, |reply| {
                        HostEvent::CallButtonPressed {
                            pos: BlockPos::new(x, y, z),
                            reply,
                        }
                    })
                    .map(|result| match result {
                        Some(true) => println!("queued"),
                        Some(false) => println!("refused"),
                        None => println!("no call button there"),
                    }),
                    _ => {
                        println!("coordinates must be numbers");
                        Some(())
                    }
                }
            }
            ["state", elevator] => request(&events_tx, |reply| HostEvent::QueryState {
                elevator: elevator.to_string(),
                reply,
            })
            .map(|state| match state {
                Some(state) => match serde_json::to_string(&state) {
                    Ok(json) => println!("{}", json),
                    Err(e) => warn!("Failed to format state: {}", e),
                },
                None => println!("no elevator named {}", elevator),
            }),
            ["quit"] => break,
            _ => {
                println!("commands: stop <elevator> <floor> | press <x> <y> <z> | state <elevator> | quit");
                Some(())
            }
        };
        // Host is gone
        if served.is_none() {
            return;
        }
    }
    if events_tx.send(HostEvent::Shutdown).is_err() {
        warn!("Host stopped before shutdown was requested");
    }
}

/// Sends one request and waits for its reply. `None` once the host is gone.
fn request<T>(
    events_tx: &cbc::Sender<HostEvent>,
    event: impl FnOnce(cbc::Sender<T>) -> HostEvent,
) -> Option<T> {
    let (reply, answer) = cbc::bounded(1);
    events_tx.send(event(reply)).ok()?;
    answer.recv().ok()
}
