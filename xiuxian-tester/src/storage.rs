use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use xiuxian_game::{GameStorage, SaveError, SaveFile};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("save slot '{0}' is not a valid name")]
    InvalidSlot(String),
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Save(#[from] SaveError),
}

/// Saves stored as pretty JSON files, one per slot, in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `slot`.
    ///
    /// # Errors
    ///
    /// Rejects empty slot names and names that would leave the directory.
    pub fn slot_path(&self, slot: &str) -> Result<PathBuf, StorageError> {
        let valid = !slot.is_empty()
            && slot
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidSlot(slot.to_string()));
        }
        Ok(self.dir.join(format!("save_slot_{slot}.json")))
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl GameStorage for FileStorage {
    type Error = StorageError;

    fn save_game(&self, slot: &str, save: &SaveFile) -> Result<(), Self::Error> {
        let path = self.slot_path(slot)?;
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;
        let json = save.to_json()?;
        fs::write(&path, json).map_err(io_error(&path))?;
        log::debug!("wrote save to {}", path.display());
        Ok(())
    }

    fn load_game(&self, slot: &str) -> Result<Option<SaveFile>, Self::Error> {
        let path = self.slot_path(slot)?;
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error(&path)(err)),
        };
        Ok(Some(SaveFile::from_json(&text)?))
    }

    fn delete_save(&self, slot: &str) -> Result<(), Self::Error> {
        let path = self.slot_path(slot)?;
        match fs::remove_file(&path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(io_error(&path)(err)),
            _ => Ok(()),
        }
    }
}
