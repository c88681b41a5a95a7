/*!
Entity roster persistence.

The engine only reads the roster; where it lives is up to the adapter. A
store that cannot produce a roster falls back to its seed roster instead of
failing, so a fresh install starts with something to look at.
*/

use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zipcover_structures::Entity;

use crate::error::{ServiceError, ServiceResult};
use crate::roster::default_roster;

/// Roster persistence boundary
pub trait EntityStore: Send + Sync {
    /// Current roster (seed roster when nothing is stored)
    fn load(&self) -> ServiceResult<Vec<Entity>>;

    /// Replace the stored roster
    fn save(&self, entities: &[Entity]) -> ServiceResult<()>;

    /// Roster used when nothing usable is stored
    fn seed(&self) -> Vec<Entity>;

    /// Overwrite the stored roster with the seed and return it
    fn reset(&self) -> ServiceResult<Vec<Entity>> {
        let seed = self.seed();
        self.save(&seed)?;
        Ok(seed)
    }
}

/// Roster held in memory only
pub struct InMemoryEntityStore {
    entities: RwLock<Vec<Entity>>,
    seed: Vec<Entity>,
}

impl InMemoryEntityStore {
    /// Start from `seed`
    pub fn new(seed: Vec<Entity>) -> Self {
        Self {
            entities: RwLock::new(seed.clone()),
            seed,
        }
    }
}

impl Default for InMemoryEntityStore {
    fn default() -> Self {
        Self::new(default_roster())
    }
}

impl EntityStore for InMemoryEntityStore {
    fn load(&self) -> ServiceResult<Vec<Entity>> {
        Ok(self.entities.read().clone())
    }

    fn save(&self, entities: &[Entity]) -> ServiceResult<()> {
        *self.entities.write() = entities.to_vec();
        Ok(())
    }

    fn seed(&self) -> Vec<Entity> {
        self.seed.clone()
    }
}

/// Roster stored as a JSON array in one file
pub struct JsonFileEntityStore {
    path: PathBuf,
    seed: Vec<Entity>,
}

impl JsonFileEntityStore {
    /// Store at `path` with the default seed roster
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_seed(path, default_roster())
    }

    pub fn with_seed(path: impl Into<PathBuf>, seed: Vec<Entity>) -> Self {
        Self {
            path: path.into(),
            seed,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EntityStore for JsonFileEntityStore {
    /// Missing, unreadable or malformed files yield the seed roster
    fn load(&self) -> ServiceResult<Vec<Entity>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    target: "zipcover-services",
                    "No roster at {}; using seed roster",
                    self.path.display()
                );
                return Ok(self.seed());
            }
            Err(e) => {
                warn!(
                    target: "zipcover-services",
                    "⚠️ Could not read roster {}: {}; using seed roster",
                    self.path.display(),
                    e
                );
                return Ok(self.seed());
            }
        };

        match serde_json::from_str::<Vec<Entity>>(&text) {
            Ok(entities) => {
                info!(
                    target: "zipcover-services",
                    "Loaded {} entities from {}",
                    entities.len(),
                    self.path.display()
                );
                Ok(entities)
            }
            Err(e) => {
                warn!(
                    target: "zipcover-services",
                    "⚠️ Roster {} is not a JSON entity list: {}; using seed roster",
                    self.path.display(),
                    e
                );
                Ok(self.seed())
            }
        }
    }

    fn save(&self, entities: &[Entity]) -> ServiceResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    ServiceError::Storage(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
        }
        let json = serde_json::to_string_pretty(entities)?;
        fs::write(&self.path, json)
            .map_err(|e| ServiceError::Storage(format!("Failed to write {}: {}", self.path.display(), e)))?;
        debug!(
            target: "zipcover-services",
            "Saved {} entities to {}",
            entities.len(),
            self.path.display()
        );
        Ok(())
    }

    fn seed(&self) -> Vec<Entity> {
        self.seed.clone()
    }
}
