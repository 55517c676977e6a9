use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::confirm::Intent;
use crate::error::{Error, Result};
use crate::models::Variety;

/// A point-in-time copy of the whole collection.
pub type Snapshot = Arc<Vec<Variety>>;

/// Deletion of a variety that has been requested but not yet confirmed.
/// Only [`RecordStore::request_remove`] creates one.
#[derive(Debug, Clone, PartialEq)]
pub struct VarietyRemoval {
    id: String,
}

impl VarietyRemoval {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// The in-memory collection of varieties, newest first.
///
/// Every change is published to subscribers as a fresh [`Snapshot`].
#[derive(Debug)]
pub struct RecordStore {
    varieties: Vec<Variety>,
    changes: watch::Sender<Snapshot>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new(vec![])
    }
}

impl RecordStore {
    pub fn new(varieties: Vec<Variety>) -> Self {
        let (changes, _) = watch::channel(Arc::new(varieties.clone()));
        Self { varieties, changes }
    }

    pub fn varieties(&self) -> &[Variety] {
        &self.varieties
    }

    pub fn len(&self) -> usize {
        self.varieties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.varieties.is_empty()
    }

    pub fn snapshot(&self) -> Snapshot {
        Arc::new(self.varieties.clone())
    }

    /// Receives a snapshot after every change. The value current at
    /// subscription time is already marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.changes.subscribe()
    }

    pub fn find(&self, id: &str) -> Option<&Variety> {
        self.varieties.iter().find(|v| v.id == id)
    }

    /// Case-insensitive match on name or breeder.
    pub fn search(&self, term: &str) -> Vec<&Variety> {
        let term = term.to_lowercase();
        self.varieties
            .iter()
            .filter(|v| v.name.to_lowercase().contains(&term) || v.breeder.to_lowercase().contains(&term))
            .collect()
    }

    pub fn add(&mut self, variety: Variety) {
        debug!(id = %variety.id, name = %variety.name, "adding variety");
        self.varieties.insert(0, variety);
        self.publish();
    }

    /// Replaces the variety with the same id.
    pub fn update(&mut self, variety: Variety) -> Result<()> {
        let slot = self
            .varieties
            .iter_mut()
            .find(|v| v.id == variety.id)
            .ok_or_else(|| Error::VarietyNotFound(variety.id.clone()))?;
        *slot = variety;
        self.publish();
        Ok(())
    }

    /// First half of a deletion: checks the id and returns the question to
    /// ask the user.
    pub fn request_remove(&self, id: &str) -> Result<Intent<VarietyRemoval>> {
        let variety = self.find(id).ok_or_else(|| Error::VarietyNotFound(id.to_string()))?;
        Ok(Intent::new(
            format!(
                "Delete '{}'?\nThis action cannot be undone and all data will be lost.",
                variety.name
            ),
            VarietyRemoval { id: variety.id.clone() },
        ))
    }

    /// Second half of a deletion, once confirmed. Returns the removed variety.
    pub fn remove(&mut self, removal: VarietyRemoval) -> Result<Variety> {
        let index = self
            .varieties
            .iter()
            .position(|v| v.id == removal.id)
            .ok_or_else(|| Error::VarietyNotFound(removal.id.clone()))?;
        let removed = self.varieties.remove(index);
        debug!(id = %removed.id, "removed variety");
        self.publish();
        Ok(removed)
    }

    pub fn replace_all(&mut self, varieties: Vec<Variety>) {
        debug!(count = varieties.len(), "replacing the whole collection");
        self.varieties = varieties;
        self.publish();
    }

    fn publish(&self) {
        self.changes.send_replace(self.snapshot());
    }
}
