//! Snapshot publication from the refresh engine to the animator
//!
//! A single writer publishes, a single consumer reads the freshest value.
//! Backed by a `tokio::sync::watch` channel: if the consumer has not looked
//! at a publication before the next one arrives, the older one is simply
//! overwritten, so stale snapshots are never queued.

use crate::types::Snapshot;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// A snapshot as handed to the consumer
#[derive(Debug, Clone)]
pub struct Publication {
    /// Unique id of this publication
    pub id: Uuid,
    /// 1 for the first publication, incremented on each one after
    pub sequence: u64,
    pub published_at: DateTime<Utc>,
    pub snapshot: Arc<Snapshot>,
}

/// Creates a connected publisher/subscriber pair
pub fn snapshot_channel() -> (SnapshotPublisher, SnapshotSubscriber) {
    let (tx, rx) = watch::channel(None);
    (
        SnapshotPublisher { tx, sequence: 0 },
        SnapshotSubscriber { rx },
    )
}

/// Writing half, owned by the refresh engine
#[derive(Debug)]
pub struct SnapshotPublisher {
    tx: watch::Sender<Option<Publication>>,
    sequence: u64,
}

impl SnapshotPublisher {
    /// Replaces the current publication with `snapshot`
    pub fn publish(&mut self, snapshot: Arc<Snapshot>) -> Publication {
        self.sequence += 1;
        let publication = Publication {
            id: Uuid::new_v4(),
            sequence: self.sequence,
            published_at: Utc::now(),
            snapshot,
        };
        // send_replace succeeds even when every subscriber is gone
        self.tx.send_replace(Some(publication.clone()));
        publication
    }

    /// Number of publications made so far
    pub fn published_count(&self) -> u64 {
        self.sequence
    }

    /// Creates another subscriber to the same publications
    pub fn subscribe(&self) -> SnapshotSubscriber {
        SnapshotSubscriber {
            rx: self.tx.subscribe(),
        }
    }
}

/// Reading half, owned by the animator (or anything else that wants the latest snapshot)
#[derive(Debug, Clone)]
pub struct SnapshotSubscriber {
    rx: watch::Receiver<Option<Publication>>,
}

impl SnapshotSubscriber {
    /// Waits until a publication newer than the last one seen is available
    ///
    /// Returns `None` once the publisher has been dropped.
    pub async fn next(&mut self) -> Option<Publication> {
        loop {
            self.rx.changed().await.ok()?;
            if let Some(publication) = self.rx.borrow_and_update().clone() {
                return Some(publication);
            }
        }
    }

    /// Latest publication, marking it as seen so `next` waits for a newer one
    pub fn take_latest(&mut self) -> Option<Publication> {
        self.rx.borrow_and_update().clone()
    }

    /// Latest publication, without marking it as seen
    pub fn latest(&self) -> Option<Publication> {
        self.rx.borrow().clone()
    }
}
