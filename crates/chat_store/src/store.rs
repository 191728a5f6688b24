use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ChatStoreError;
use crate::schema::Message;

/// Durable store for one conversation history snapshot.
pub struct ChatStore {
    path: PathBuf,
}

impl ChatStore {
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted history.
    ///
    /// Missing, unreadable, or malformed data yields an empty history;
    /// a malformed file is deleted so the next load starts clean.
    #[must_use]
    pub fn load(&self) -> Vec<Message> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(error) => {
                log::warn!(
                    "failed to read history at {}: {error}",
                    self.path.display()
                );
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Message>>(&raw) {
            Ok(history) => history,
            Err(error) => {
                log::warn!(
                    "discarding malformed history at {}: {error}",
                    self.path.display()
                );
                self.erase();
                Vec::new()
            }
        }
    }

    /// Replaces the stored snapshot with `history`.
    ///
    /// The snapshot is written to a sibling temp file and renamed into
    /// place, so the stored data is never a partial record.
    pub fn save(&self, history: &[Message]) -> Result<(), ChatStoreError> {
        let serialized = serde_json::to_string(history)
            .map_err(|source| ChatStoreError::serialize(&self.path, source))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| {
                ChatStoreError::io("creating history directory", parent, source)
            })?;
        }

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, serialized)
            .map_err(|source| ChatStoreError::io("writing history snapshot", &staging, source))?;
        fs::rename(&staging, &self.path)
            .map_err(|source| ChatStoreError::io("replacing history snapshot", &self.path, source))?;

        Ok(())
    }

    fn erase(&self) {
        if let Err(error) = fs::remove_file(&self.path) {
            if error.kind() != std::io::ErrorKind::NotFound {
                log::warn!(
                    "failed to erase malformed history at {}: {error}",
                    self.path.display()
                );
            }
        }
    }
}
