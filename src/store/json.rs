use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, error, info};

use super::snapshot::{Document, ElevatorSnapshot, VersionHeader, FILE_VERSION};
use super::{Store, StoreError};

enum CacheState {
    /// File not read yet.
    Unread,
    Ready,
    /// File exists but could not be used; holds the reason.
    Blocked(String),
}

/**
 * JSON file store.
 *
 * The parsed document is cached in memory. A save applies the change to a
 * copy of the cache, writes the copy to `<file>.tmp`, syncs it and renames it
 * over the file. The cache is only replaced once the rename succeeded, so a
 * failed save changes neither the file nor the cache.
 *
 * # Fields
 * - `path`:    Location of the elevators file.
 * - `cache`:   Last document known to be on disk.
 * - `state`:   Whether `cache` is trustworthy.
 */
pub struct JsonStore {
    path: PathBuf,
    cache: Document,
    state: CacheState,
}

impl JsonStore {
    pub fn open(path: impl Into<PathBuf>) -> JsonStore {
        JsonStore {
            path: path.into(),
            cache: Document::default(),
            state: CacheState::Unread,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn refresh(&mut self) -> Result<(), StoreError> {
        match read_document(&self.path) {
            Ok(Some(document)) => {
                self.cache = document;
                self.state = CacheState::Ready;
                Ok(())
            }
            Ok(None) => {
                info!("No elevators file at {}, starting empty", self.path.display());
                self.cache = Document::default();
                self.state = CacheState::Ready;
                Ok(())
            }
            Err(e) => {
                error!("Failed to load elevators file {}: {}", self.path.display(), e);
                self.cache = Document::default();
                self.state = CacheState::Blocked(e.to_string());
                Err(e)
            }
        }
    }
}

impl Store for JsonStore {
    fn load(&mut self) -> Result<Vec<ElevatorSnapshot>, StoreError> {
        self.refresh()?;
        Ok(self.cache.elevators.clone())
    }

    fn save(&mut self, name: &str, snapshot: Option<&ElevatorSnapshot>) -> Result<(), StoreError> {
        if let CacheState::Unread = self.state {
            self.refresh()?;
        }
        if let CacheState::Blocked(reason) = &self.state {
            return Err(StoreError::ReadOnly(reason.clone()));
        }

        let mut next = self.cache.clone();
        next.apply(name, snapshot);
        write_atomic(&self.path, &next).map_err(|e| {
            error!("Failed to write to elevators file {}: {}", self.path.display(), e);
            StoreError::Io(e.to_string())
        })?;

        debug!("Saved elevator {} to {}", name, self.path.display());
        self.cache = next;
        Ok(())
    }
}

/// Reads and validates the document. `Ok(None)` means there is no file yet.
fn read_document(path: &Path) -> Result<Option<Document>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::Io(format!("failed to read {}: {e}", path.display()))),
    };

    let header: VersionHeader =
        serde_json::from_str(&content).map_err(|e| StoreError::Parse(e.to_string()))?;
    if header.version != FILE_VERSION {
        return Err(StoreError::Version {
            expected: FILE_VERSION,
            found: header.version,
        });
    }

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StoreError::Parse(e.to_string()))
}

fn write_atomic(path: &Path, document: &Document) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "store path has no file name"))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let written = write_file(&tmp_path, document).and_then(|()| fs::rename(&tmp_path, path));
    if written.is_err() {
        // The temp file may not exist yet
        let _ = fs::remove_file(&tmp_path);
    }
    written
}

fn write_file(path: &Path, document: &Document) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, document)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()
}
