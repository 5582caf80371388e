/*
 * Unit tests for store module
 *
 * The unit tests follows the Arrange, Act, Assert pattern.
 *
 * Tests:
 * - test_missing_file_loads_empty
 * - test_save_then_load
 * - test_save_none_deletes
 * - test_failed_save_keeps_prior_state
 * - test_failed_rename_removes_temp_file
 * - test_version_mismatch_blocks_writes
 * - test_legacy_door_lever_field
 * - test_memory_store_failing_save
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod store_tests {
    use crate::shared::BlockPos;
    use crate::store::{
        ElevatorSnapshot, FloorSnapshot, JsonStore, MemoryStore, Store, StoreError, FILE_VERSION,
    };
    use std::fs;
    use tempfile::TempDir;

    fn snapshot(name: &str) -> ElevatorSnapshot {
        ElevatorSnapshot {
            name: name.to_string(),
            world: "overworld".to_string(),
            loc1: BlockPos::new(0, 0, 0),
            loc2: BlockPos::new(2, 10, 2),
            doors: vec![BlockPos::new(1, 0, 0)],
            floors: vec![FloorSnapshot {
                floor: 1,
                loc: BlockPos::new(0, 5, 0),
                doors: vec![BlockPos::new(3, 5, 0)],
                call_button: Some(BlockPos::new(4, 6, 0)),
            }],
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        // Purpose: Verify that an absent file is treated as an empty elevator set

        // Arrange
        let dir = TempDir::new().unwrap();
        let mut store = JsonStore::open(dir.path().join("elevators.json"));

        // Act
        let loaded = store.load();

        // Assert
        assert_eq!(loaded, Ok(Vec::new()));
    }

    #[test]
    fn test_save_then_load() {
        // Purpose: Verify that a saved snapshot is returned by a fresh store on the same file

        // Arrange
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("elevators.json");
        let mut store = JsonStore::open(&path);
        store.load().unwrap();

        // Act
        store.save("E1", Some(&snapshot("E1"))).unwrap();
        let mut reopened = JsonStore::open(&path);
        let loaded = reopened.load().unwrap();

        // Assert
        assert_eq!(loaded, vec![snapshot("E1")]);
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], FILE_VERSION);
        assert_eq!(raw["elevators"][0]["loc2"], serde_json::json!([2, 10, 2]));
        assert_eq!(
            raw["elevators"][0]["floors"][0]["callButton"],
            serde_json::json!([4, 6, 0])
        );
    }

    #[test]
    fn test_save_none_deletes() {
        // Purpose: Verify that saving `None` removes the elevator from the file

        // Arrange
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("elevators.json");
        let mut store = JsonStore::open(&path);
        store.save("E1", Some(&snapshot("E1"))).unwrap();
        store.save("E2", Some(&snapshot("E2"))).unwrap();

        // Act
        store.save("E1", None).unwrap();

        // Assert
        let loaded = JsonStore::open(&path).load().unwrap();
        assert_eq!(loaded, vec![snapshot("E2")]);
    }

    #[test]
    fn test_failed_save_keeps_prior_state() {
        // Purpose: Verify that a save that cannot be written leaves both file and cache untouched

        // Arrange
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("elevators.json");
        let mut store = JsonStore::open(&path);
        store.save("E1", Some(&snapshot("E1"))).unwrap();
        let before = fs::read_to_string(&path).unwrap();
        // A directory where the temp file should go makes the write fail
        fs::create_dir(dir.path().join("elevators.json.tmp")).unwrap();

        // Act
        let result = store.save("E2", Some(&snapshot("E2")));

        // Assert
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        assert_eq!(store.load().unwrap(), vec![snapshot("E1")]);
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        // Purpose: Verify that a write that fails after the temp file exists does not leave it behind

        // Arrange
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("elevators.json");
        let mut store = JsonStore::open(&path);
        store.load().unwrap();
        // A non-empty directory at the target path makes the rename fail
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "").unwrap();

        // Act
        let result = store.save("E1", Some(&snapshot("E1")));

        // Assert
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(!dir.path().join("elevators.json.tmp").exists());
        assert!(path.is_dir());
    }

    #[test]
    fn test_version_mismatch_blocks_writes() {
        // Purpose: Verify that a file with another version loads as an error and is never overwritten

        // Arrange
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("elevators.json");
        let content = r#"{"version": 2, "elevators": []}"#;
        fs::write(&path, content).unwrap();
        let mut store = JsonStore::open(&path);

        // Act
        let loaded = store.load();
        let saved = store.save("E1", Some(&snapshot("E1")));

        // Assert
        assert_eq!(
            loaded,
            Err(StoreError::Version {
                expected: FILE_VERSION,
                found: 2
            })
        );
        assert!(matches!(saved, Err(StoreError::ReadOnly(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn test_legacy_door_lever_field() {
        // Purpose: Verify that files using the `doorLevers` key still load

        // Arrange
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("elevators.json");
        fs::write(
            &path,
            r#"{"version": 1, "elevators": [{"name": "E1", "world": "w",
                "loc1": [0, 0, 0], "loc2": [1, 1, 1], "doorLevers": [[0, 1, 0]],
                "floors": [{"floor": 0, "loc": [0, 0, 0], "doorLevers": [],
                            "callButton": null}]}]}"#,
        )
        .unwrap();

        // Act
        let loaded = JsonStore::open(&path).load().unwrap();

        // Assert
        assert_eq!(loaded[0].doors, vec![BlockPos::new(0, 1, 0)]);
        assert_eq!(loaded[0].floors[0].call_button, None);
    }

    #[test]
    fn test_memory_store_failing_save() {
        // Purpose: Verify that the in-memory store rejects saves while failing is set

        // Arrange
        let store = MemoryStore::new();
        let mut handle = store.clone();
        store.set_failing(true);

        // Act
        let result = handle.save("E1", Some(&snapshot("E1")));

        // Assert
        assert!(result.is_err());
        assert_eq!(store.snapshot("E1"), None);
        assert_eq!(store.saves(), 0);
    }
}
