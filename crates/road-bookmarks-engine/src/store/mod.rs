use crate::models::{BookmarkEntry, FileBookmarks};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on bookmark store {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed bookmark store {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to serialize bookmark store {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to replace bookmark store {path}: {source}")]
    Persist {
        path: PathBuf,
        source: tempfile::PersistError,
    },
}

/// Durable per-file bookmark storage backed by a single JSON file.
///
/// The `try_*` methods report failures. `load`, `save` and `write` are the
/// best-effort variants used by the editor integration: they log and carry on,
/// so a broken store file never interrupts editing.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the persisted file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted mapping; an absent file is an empty mapping
    pub fn try_load(&self) -> Result<FileBookmarks, StoreError> {
        if !self.path.exists() {
            return Ok(FileBookmarks::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Read the persisted mapping, treating any failure as empty
    pub fn load(&self) -> FileBookmarks {
        self.try_load().unwrap_or_else(|e| {
            log::warn!("Bookmark store unreadable, treating as empty: {e}");
            FileBookmarks::new()
        })
    }

    /// Bookmarks recorded for one file, if any
    pub fn get(&self, file: &Path) -> Option<Vec<BookmarkEntry>> {
        self.load().remove(&key_for(file))
    }

    /// Replace the whole entry list for `file`.
    ///
    /// A corrupt store reads as empty here, so the next save overwrites it.
    pub fn try_save(&self, file: &Path, entries: Vec<BookmarkEntry>) -> Result<(), StoreError> {
        let mut bookmarks = self.load();
        bookmarks.insert(key_for(file), entries);
        self.try_write(&bookmarks)
    }

    pub fn save(&self, file: &Path, entries: Vec<BookmarkEntry>) {
        if let Err(e) = self.try_save(file, entries) {
            log::warn!("Failed to save bookmarks for {}: {e}", file.display());
        }
    }

    /// Drop the entry for `file`. Returns whether a key was removed.
    pub fn try_remove(&self, file: &Path) -> Result<bool, StoreError> {
        let mut bookmarks = self.try_load()?;
        if bookmarks.remove(&key_for(file)).is_none() {
            return Ok(false);
        }
        self.try_write(&bookmarks)?;
        Ok(true)
    }

    /// Write the full mapping through a temp file renamed over the target
    pub fn try_write(&self, bookmarks: &FileBookmarks) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        let tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, bookmarks).map_err(|source| {
                StoreError::Serialize {
                    path: self.path.clone(),
                    source,
                }
            })?;
            writer.write_all(b"\n").map_err(io_err)?;
            writer.flush().map_err(io_err)?;
        }
        tmp.as_file().sync_all().map_err(io_err)?;

        tmp.persist(&self.path)
            .map_err(|source| StoreError::Persist {
                path: self.path.clone(),
                source,
            })?;

        log::debug!(
            "Wrote {} bookmarked file(s) to {}",
            bookmarks.len(),
            self.path.display()
        );
        Ok(())
    }

    pub fn write(&self, bookmarks: &FileBookmarks) {
        if let Err(e) = self.try_write(bookmarks) {
            log::warn!("Failed to write bookmark store: {e}");
        }
    }
}

/// Store key for a file path
pub fn key_for(file: &Path) -> String {
    file.to_string_lossy().into_owned()
}
