/*
 * Unit tests for the elevator registry
 *
 * The unit tests follows the Arrange, Act, Assert pattern.
 *
 * Tests:
 * - test_create_and_duplicate_name
 * - test_create_failure_leaves_registry_unchanged
 * - test_create_rejects_oversized_region
 * - test_delete
 * - test_load_skips_other_worlds
 * - test_unreadable_file_gives_empty_registry
 * - test_call_button_pressed
 * - test_region_changed_reloads
 * - test_region_changed_closes_doors
 * - test_with_elevator
 * - test_elevator_at
 * - test_tick_and_unload_all
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod manager_tests {
    use crate::config::MoverConfig;
    use crate::elevator::{BlockChange, ElevatorError, ElevatorManager};
    use crate::shared::{Behaviour, BlockPos, Region};
    use crate::store::{Document, ElevatorSnapshot, JsonStore, MemoryStore, StoreError, FILE_VERSION};
    use crate::world::{BlockState, Material, MemoryWorld, WorldGrid};
    use std::fs;
    use tempfile::TempDir;

    const STONE: BlockState = BlockState::new(Material::Solid(1));

    fn pos(x: i32, y: i32, z: i32) -> BlockPos {
        BlockPos::new(x, y, z)
    }

    fn config() -> MoverConfig {
        MoverConfig {
            tick_interval_ms: 10,
            dwell_ticks: 2,
        }
    }

    fn stored(name: &str, world: &str) -> ElevatorSnapshot {
        ElevatorSnapshot {
            name: name.to_string(),
            world: world.to_string(),
            loc1: pos(0, 0, 0),
            loc2: pos(0, 10, 0),
            doors: Vec::new(),
            floors: Vec::new(),
        }
    }

    /// Manager over an empty memory store, with a one block car at the
    /// bottom of a 1x11x1 shaft.
    fn setup() -> (ElevatorManager, MemoryWorld, MemoryStore) {
        let mut world = MemoryWorld::new("overworld");
        world.set_block(pos(0, 0, 0), STONE);
        let store = MemoryStore::new();
        let manager = ElevatorManager::load(Box::new(store.clone()), &world, &config());
        (manager, world, store)
    }

    #[test]
    fn test_create_and_duplicate_name() {
        // Purpose: Verify that a created elevator is registered and persisted, and its name is then taken

        // Arrange
        let (mut manager, world, store) = setup();

        // Act
        let created = manager.create("E1", pos(0, 0, 0), pos(0, 10, 0), &world);
        let duplicate = manager.create("E1", pos(5, 0, 5), pos(5, 10, 5), &world);

        // Assert
        assert_eq!(created, Ok(()));
        assert_eq!(duplicate, Err(ElevatorError::DuplicateName("E1".to_string())));
        assert!(manager.contains("E1"));
        assert_eq!(manager.get("E1").unwrap().master_block(), Some(pos(0, 0, 0)));
        assert_eq!(store.snapshot("E1").unwrap().loc2, pos(0, 10, 0));
        assert_eq!(store.saves(), 1);
    }

    #[test]
    fn test_create_failure_leaves_registry_unchanged() {
        // Purpose: Verify that a failed save keeps the new elevator out of the registry

        // Arrange
        let (mut manager, world, store) = setup();
        store.set_failing(true);

        // Act
        let result = manager.create("E1", pos(0, 0, 0), pos(0, 10, 0), &world);

        // Assert
        assert!(matches!(result, Err(ElevatorError::Persistence(_))));
        assert!(!manager.contains("E1"));
        assert_eq!(store.snapshot("E1"), None);
    }

    #[test]
    fn test_create_rejects_oversized_region() {
        // Purpose: Verify that a region too large to scan is refused and never registered or saved

        // Arrange
        let (mut manager, world, store) = setup();
        let loc1 = pos(i32::MIN, 0, i32::MIN);
        let loc2 = pos(i32::MAX, 0, i32::MAX);

        // Act
        let result = manager.create("E1", loc1, loc2, &world);

        // Assert
        assert_eq!(result, Err(ElevatorError::InvalidRegion(Region::new(loc1, loc2))));
        assert!(!manager.contains("E1"));
        assert_eq!(store.snapshot("E1"), None);
        assert_eq!(store.saves(), 0);
    }

    #[test]
    fn test_delete() {
        // Purpose: Verify deletion, its failure rollback and the unknown-name case

        // Arrange
        let (mut manager, world, store) = setup();
        manager.create("E1", pos(0, 0, 0), pos(0, 10, 0), &world).unwrap();

        // Act
        store.set_failing(true);
        let failed = manager.delete("E1");
        store.set_failing(false);

        // Assert
        assert!(matches!(failed, Err(ElevatorError::Persistence(_))));
        assert!(manager.contains("E1"));
        assert!(manager.get("E1").unwrap().is_loaded());
        assert!(store.snapshot("E1").is_some());

        // Act
        let deleted = manager.delete("E1");
        let unknown = manager.delete("E1");

        // Assert
        assert_eq!(deleted, Ok(()));
        assert_eq!(unknown, Err(ElevatorError::UnknownElevator("E1".to_string())));
        assert!(!manager.contains("E1"));
        assert_eq!(store.snapshot("E1"), None);
    }

    #[test]
    fn test_load_skips_other_worlds() {
        // Purpose: Verify that elevators of other worlds are not loaded but keep their names reserved

        // Arrange
        let world = MemoryWorld::new("overworld");
        let store = MemoryStore::with_document(Document {
            version: FILE_VERSION,
            elevators: vec![stored("E1", "overworld"), stored("N1", "nether")],
        });

        // Act
        let mut manager = ElevatorManager::load(Box::new(store.clone()), &world, &config());
        let taken = manager.create("N1", pos(0, 0, 0), pos(0, 3, 0), &world);

        // Assert
        assert_eq!(manager.names().collect::<Vec<_>>(), vec!["E1"]);
        assert_eq!(manager.world(), "overworld");
        assert_eq!(taken, Err(ElevatorError::DuplicateName("N1".to_string())));
        assert_eq!(store.snapshot("N1"), Some(stored("N1", "nether")));
    }

    #[test]
    fn test_unreadable_file_gives_empty_registry() {
        // Purpose: Verify that a file with the wrong version loads nothing and is never overwritten

        // Arrange
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("elevators.json");
        let contents = r#"{"version": 99, "elevators": []}"#;
        fs::write(&path, contents).unwrap();
        let world = MemoryWorld::new("overworld");

        // Act
        let mut manager =
            ElevatorManager::load(Box::new(JsonStore::open(&path)), &world, &config());
        let result = manager.create("E1", pos(0, 0, 0), pos(0, 3, 0), &world);

        // Assert
        assert_eq!(manager.names().count(), 0);
        assert!(matches!(
            result,
            Err(ElevatorError::Persistence(StoreError::ReadOnly(_)))
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), contents);
    }

    #[test]
    fn test_call_button_pressed() {
        // Purpose: Verify that only a switch registered as a call button queues a stop

        // Arrange
        let (mut manager, mut world, _store) = setup();
        let lever = pos(1, 5, 0);
        let stale = pos(1, 8, 0);
        world.set_block(lever, BlockState::new(Material::Lever));
        world.set_block(stale, STONE);
        world.set_block(pos(2, 2, 0), BlockState::new(Material::Button));
        manager.create("E1", pos(0, 0, 0), pos(0, 10, 0), &world).unwrap();
        manager
            .with_elevator("E1", |elevator, store| {
                elevator.add_floor(5, pos(0, 5, 0), store, &world)?;
                elevator.add_floor(8, pos(0, 8, 0), store, &world)?;
                elevator.set_floor_call_button(5, Some(lever), store)?;
                elevator.set_floor_call_button(8, Some(stale), store)
            })
            .unwrap()
            .unwrap();

        // Act
        let pressed = manager.call_button_pressed(lever, &world);
        let not_a_switch = manager.call_button_pressed(stale, &world);
        let unregistered = manager.call_button_pressed(pos(2, 2, 0), &world);

        // Assert
        assert_eq!(pressed, Some(true));
        assert_eq!(not_a_switch, None);
        assert_eq!(unregistered, None);
        let elevator = manager.get("E1").unwrap();
        assert_eq!(elevator.stops().iter().copied().collect::<Vec<_>>(), vec![5]);
        assert!(elevator.is_active());
    }

    #[test]
    fn test_region_changed_reloads() {
        // Purpose: Verify that a block edit inside a region rescans the car and clears its queue

        // Arrange
        let (mut manager, mut world, _store) = setup();
        world.set_block(pos(0, 4, 0), STONE);
        manager.create("E1", pos(0, 0, 0), pos(0, 10, 0), &world).unwrap();
        manager
            .with_elevator("E1", |elevator, store| {
                elevator.add_floor(10, pos(0, 10, 0), store, &world)
            })
            .unwrap()
            .unwrap();
        manager.add_stop("E1", 10);

        // Act
        manager.region_changed(BlockChange::Placed(pos(3, 3, 3)), &mut world);

        // Assert
        assert!(manager.get("E1").unwrap().is_active());

        // Act
        manager.region_changed(BlockChange::Broken(pos(0, 0, 0)), &mut world);

        // Assert
        let elevator = manager.get("E1").unwrap();
        assert_eq!(elevator.master_block(), Some(pos(0, 4, 0)));
        assert_eq!(elevator.geometry().blocks(), &[pos(0, 4, 0)]);
        assert!(elevator.stops().is_empty());
        assert!(!elevator.is_active());
    }

    #[test]
    fn test_region_changed_closes_doors() {
        // Purpose: Verify that a reload while the car dwells at a floor closes its car and landing doors

        // Arrange
        let (mut manager, mut world, _store) = setup();
        let iron_door = BlockState::new(Material::IronDoor);
        let car_door = pos(1, 0, 0);
        let landing_door = pos(0, 0, -1);
        world.set_block(car_door, iron_door);
        world.set_block(landing_door, iron_door);
        manager.create("E1", pos(0, 0, 0), pos(0, 10, 0), &world).unwrap();
        manager
            .with_elevator("E1", |elevator, store| {
                elevator.add_door(car_door, store, &world)?;
                elevator.add_floor(0, pos(0, 0, 0), store, &world)?;
                elevator.add_floor_door(0, landing_door, store, &world)
            })
            .unwrap()
            .unwrap();
        assert!(manager.add_stop("E1", 0));
        manager.tick(&mut world);
        assert!(manager.get("E1").unwrap().doors_open());
        assert!(world.block(landing_door).is_actuated());

        // Act
        world.set_block(pos(0, 5, 0), STONE);
        manager.region_changed(BlockChange::Placed(pos(0, 5, 0)), &mut world);
        for _ in 0..20 {
            manager.tick(&mut world);
        }

        // Assert
        let elevator = manager.get("E1").unwrap();
        assert_eq!(elevator.state().behaviour, Behaviour::Idle);
        assert!(!elevator.doors_open());
        assert_eq!(world.block(car_door), iron_door);
        assert_eq!(world.block(landing_door), iron_door);
        assert_eq!(elevator.geometry().blocks(), &[pos(0, 0, 0), pos(0, 5, 0)]);
    }

    #[test]
    fn test_with_elevator() {
        // Purpose: Verify that configuration through the registry is persisted and unknown names fail

        // Arrange
        let (mut manager, world, store) = setup();
        manager.create("E1", pos(0, 0, 0), pos(0, 10, 0), &world).unwrap();

        // Act
        let added = manager.with_elevator("E1", |elevator, store| {
            elevator.add_floor(3, pos(0, 3, 0), store, &world)
        });
        let unknown = manager.with_elevator("E2", |elevator, _| elevator.name().to_string());

        // Assert
        assert_eq!(added, Ok(Ok(())));
        assert_eq!(unknown, Err(ElevatorError::UnknownElevator("E2".to_string())));
        assert_eq!(store.snapshot("E1").unwrap().floors[0].floor, 3);
        assert!(manager.add_stop("E1", 3));
        assert!(!manager.add_stop("E2", 3));
    }

    #[test]
    fn test_elevator_at() {
        // Purpose: Verify that a position is resolved to the elevator whose region contains it

        // Arrange
        let (mut manager, world, _store) = setup();
        manager.create("E1", pos(0, 0, 0), pos(0, 10, 0), &world).unwrap();
        manager.create("E2", pos(5, 0, 5), pos(7, 10, 7), &world).unwrap();

        // Act
        let first = manager.elevator_at(pos(0, 6, 0)).map(|e| e.name().to_string());
        let second = manager.elevator_at(pos(6, 10, 5)).map(|e| e.name().to_string());
        let none = manager.elevator_at(pos(3, 3, 3));

        // Assert
        assert_eq!(first.as_deref(), Some("E1"));
        assert_eq!(second.as_deref(), Some("E2"));
        assert!(none.is_none());
    }

    #[test]
    fn test_tick_and_unload_all() {
        // Purpose: Verify that ticks drive every active elevator and unloading stops them all

        // Arrange
        let (mut manager, mut world, _store) = setup();
        world.set_block(pos(5, 0, 5), STONE);
        manager.create("E1", pos(0, 0, 0), pos(0, 10, 0), &world).unwrap();
        manager.create("E2", pos(5, 0, 5), pos(5, 10, 5), &world).unwrap();
        for (name, x) in [("E1", 0), ("E2", 5)] {
            manager
                .with_elevator(name, |elevator, store| {
                    elevator.add_floor(10, pos(x, 10, x), store, &world)
                })
                .unwrap()
                .unwrap();
            assert!(manager.add_stop(name, 10));
        }

        // Act
        manager.tick(&mut world);

        // Assert
        assert_eq!(manager.get("E1").unwrap().master_block(), Some(pos(0, 1, 0)));
        assert_eq!(manager.get("E2").unwrap().master_block(), Some(pos(5, 1, 5)));

        // Act
        manager.unload_all();
        manager.tick(&mut world);

        // Assert
        assert!(manager.elevators().all(|e| !e.is_loaded() && !e.is_active()));
        assert_eq!(world.block(pos(0, 1, 0)), STONE);
        assert_eq!(world.block(pos(0, 2, 0)), BlockState::AIR);
    }
}
