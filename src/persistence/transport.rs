// Persistence transports - where serialized compositions are stored
//
// Transports are called from persistence worker threads, never from the
// control thread that owns the block graph.

use crate::persistence::{PersistenceError, PersistenceResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// Storage for serialized compositions, addressed by composition id
pub trait PersistenceTransport: Send + Sync {
    fn save(&self, composition_id: &str, data: &str) -> PersistenceResult<()>;

    fn load(&self, composition_id: &str) -> PersistenceResult<String>;
}

/// One JSON file per composition under a root directory
#[derive(Debug, Clone)]
pub struct FileTransport {
    root: PathBuf,
}

impl FileTransport {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Platform data directory for compositions, if the platform has one
    pub fn default_root() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("blocks_sketch").join("compositions"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing a composition id
    pub fn path_for(&self, composition_id: &str) -> PersistenceResult<PathBuf> {
        let valid = !composition_id.is_empty()
            && composition_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PersistenceError::Storage(format!(
                "Invalid composition id: {:?}",
                composition_id
            )));
        }
        Ok(self.root.join(format!("{}.json", composition_id)))
    }
}

impl PersistenceTransport for FileTransport {
    fn save(&self, composition_id: &str, data: &str) -> PersistenceResult<()> {
        let path = self.path_for(composition_id)?;
        std::fs::create_dir_all(&self.root).map_err(|e| {
            PersistenceError::Storage(format!("Failed to create composition directory: {}", e))
        })?;

        // Write aside then rename so a failed save never truncates the previous
        // one; each save gets its own temp file
        let temp_path = self
            .root
            .join(format!(".{}.{}.tmp", composition_id, Uuid::new_v4()));
        let written = std::fs::write(&temp_path, data)
            .and_then(|()| std::fs::rename(&temp_path, &path));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    fn load(&self, composition_id: &str) -> PersistenceResult<String> {
        let path = self.path_for(composition_id)?;
        if !path.exists() {
            return Err(PersistenceError::CompositionNotFound(
                composition_id.to_string(),
            ));
        }
        Ok(std::fs::read_to_string(path)?)
    }
}

/// In-process store, for tests and offline sessions
#[derive(Debug, Default)]
pub struct MemoryTransport {
    compositions: Mutex<HashMap<String, String>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, composition_id: &str) -> bool {
        self.compositions
            .lock()
            .map(|store| store.contains_key(composition_id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.compositions
            .lock()
            .map(|store| store.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PersistenceTransport for MemoryTransport {
    fn save(&self, composition_id: &str, data: &str) -> PersistenceResult<()> {
        let mut store = self
            .compositions
            .lock()
            .map_err(|_| PersistenceError::Storage("Composition store poisoned".to_string()))?;
        store.insert(composition_id.to_string(), data.to_string());
        Ok(())
    }

    fn load(&self, composition_id: &str) -> PersistenceResult<String> {
        let store = self
            .compositions
            .lock()
            .map_err(|_| PersistenceError::Storage("Composition store poisoned".to_string()))?;
        store
            .get(composition_id)
            .cloned()
            .ok_or_else(|| PersistenceError::CompositionNotFound(composition_id.to_string()))
    }
}
