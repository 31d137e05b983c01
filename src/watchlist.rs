//! The user's pinned assets
//!
//! `Watchlist` is an ordered set of ids that only grows: `pin` appends an id
//! if it is not already there. Readers get immutable copies through a watch
//! channel, so the refresh engine sees a pin at its next poll without sharing
//! the list mutably across tasks.

use crate::{error::WatchlistError, types::AssetId};
use parking_lot::Mutex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

/// JSON file holding the watchlist as an array of ids
#[derive(Debug, Clone)]
pub struct WatchlistFile {
    path: PathBuf,
}

impl WatchlistFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file; a missing file is an empty watchlist
    ///
    /// Entries that are not valid asset ids are skipped with a warning.
    pub fn load(&self) -> Result<Vec<AssetId>, WatchlistError> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(WatchlistError::io(&self.path, e)),
        };

        let entries: Vec<String> =
            serde_json::from_slice(&raw).map_err(|e| WatchlistError::parse(&self.path, e))?;

        let mut unique = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = match AssetId::new(&entry) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "Skipping watchlist entry");
                    continue;
                }
            };
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        Ok(unique)
    }

    /// Reads the file, treating any failure as an empty watchlist
    pub fn load_or_empty(&self) -> Vec<AssetId> {
        match self.load() {
            Ok(ids) => {
                tracing::info!(path = %self.path.display(), count = ids.len(), "Loaded watchlist");
                ids
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not load watchlist, starting empty");
                Vec::new()
            }
        }
    }

    /// Overwrites the file with `ids`
    pub fn save(&self, ids: &[AssetId]) -> Result<(), WatchlistError> {
        let json = serde_json::to_vec(ids).map_err(|e| WatchlistError::parse(&self.path, e))?;
        std::fs::write(&self.path, json).map_err(|e| WatchlistError::io(&self.path, e))
    }
}

#[derive(Debug)]
struct Inner {
    tx: watch::Sender<Vec<AssetId>>,
    file: Option<WatchlistFile>,
    save_lock: Mutex<()>,
}

/// Ordered, append-only set of pinned asset ids
#[derive(Debug, Clone)]
pub struct Watchlist {
    inner: Arc<Inner>,
}

impl Watchlist {
    /// In-memory watchlist, never persisted
    pub fn new(ids: Vec<AssetId>) -> Self {
        Self::build(ids, None)
    }

    /// Watchlist loaded from `file` and saved back to it after every pin
    pub fn open(file: WatchlistFile) -> Self {
        let ids = file.load_or_empty();
        Self::build(ids, Some(file))
    }

    fn build(ids: Vec<AssetId>, file: Option<WatchlistFile>) -> Self {
        let (tx, _) = watch::channel(ids);
        Self {
            inner: Arc::new(Inner {
                tx,
                file,
                save_lock: Mutex::new(()),
            }),
        }
    }

    /// Adds `raw` (normalised) unless already pinned
    ///
    /// Returns `Ok(true)` if the watchlist changed. Pinning an id twice is a
    /// no-op. Persistence failures are logged, not returned.
    pub fn pin(&self, raw: &str) -> Result<bool, WatchlistError> {
        let id = AssetId::new(raw)?;

        let added = self.inner.tx.send_if_modified(|ids| {
            if ids.contains(&id) {
                false
            } else {
                ids.push(id.clone());
                true
            }
        });

        if added {
            tracing::info!(asset = %id, "Pinned asset");
            self.persist();
        } else {
            tracing::debug!(asset = %id, "Asset already pinned");
        }

        Ok(added)
    }

    fn persist(&self) {
        let Some(file) = &self.inner.file else {
            return;
        };

        let _guard = self.inner.save_lock.lock();
        let ids = self.ids();
        if let Err(e) = file.save(&ids) {
            tracing::warn!(error = %e, "Failed to save watchlist");
        }
    }

    /// Current ids, in pin order
    pub fn ids(&self) -> Vec<AssetId> {
        self.inner.tx.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.inner.tx.borrow().contains(id)
    }

    /// Read-only view for another task
    pub fn reader(&self) -> WatchlistReader {
        WatchlistReader {
            rx: self.inner.tx.subscribe(),
        }
    }
}

/// Read-only view of a watchlist
#[derive(Debug, Clone)]
pub struct WatchlistReader {
    rx: watch::Receiver<Vec<AssetId>>,
}

impl WatchlistReader {
    /// Copy of the ids as of now
    pub fn current(&self) -> Vec<AssetId> {
        self.rx.borrow().clone()
    }
}

impl From<Vec<AssetId>> for WatchlistReader {
    fn from(ids: Vec<AssetId>) -> Self {
        // The sender can go: a closed watch channel still serves its last value
        let (_tx, rx) = watch::channel(ids);
        Self { rx }
    }
}
