//! Persistence (spec §6): a JSON snapshot of each endpoint's sample window,
//! loaded on startup and written on clean shutdown. A corrupt snapshot is
//! discarded rather than treated as fatal (spec §7: state-corruption is
//! surfaced, never panicked on).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::Sample;
use crate::store::SampleStore;

/// Reads and writes the sample-window snapshot file.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot and restore it into `sample_store`. A missing file
    /// is not an error (first run); a corrupt file is logged and discarded,
    /// leaving `sample_store` empty rather than failing startup.
    pub fn load_into(&self, sample_store: &SampleStore) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str::<HashMap<String, Vec<Sample>>>(&contents) {
            Ok(snapshot) => {
                for (endpoint_id, samples) in snapshot {
                    sample_store.restore(&endpoint_id, samples);
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "discarding corrupt snapshot");
                Ok(())
            }
        }
    }

    /// Write the current sample windows to the snapshot file.
    pub fn save_from(&self, sample_store: &SampleStore) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let snapshot = sample_store.snapshot();
        let json = serde_json::to_string(&snapshot)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
