//! Editable station list.
//!
//! An ordered, owned collection of records that a list view or the HTML
//! renderer reads from. Each appended record gets a `RecordId` that is never
//! reused, so an edit or delete issued from a view row always hits the entry
//! that row was showing, regardless of duplicates or of what happened to the
//! list since the row was drawn.
//!
//! Views learn about mutations through `subscribe()`, which hands out a
//! channel receiving one `ListChange` per mutation.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::model::StationRecord;

/// Stable identity of one entry in a `StationList`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    UnknownRecord(RecordId),
}

impl fmt::Display for ListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListError::UnknownRecord(id) => write!(f, "no record with id {}", id),
        }
    }
}

impl std::error::Error for ListError {}

/// One mutation, as seen by subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum ListChange {
    Appended(Vec<RecordId>),
    Edited {
        id: RecordId,
        old: StationRecord,
        new: StationRecord,
    },
    Removed {
        id: RecordId,
        record: StationRecord,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    id: RecordId,
    record: StationRecord,
}

#[derive(Debug, Default)]
pub struct StationList {
    entries: Vec<Entry>,
    next_id: u64,
    subscribers: Vec<Sender<ListChange>>,
}

impl StationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list seeded with `records`.
    pub fn from_records(records: Vec<StationRecord>) -> Self {
        let mut list = Self::new();
        list.append(records);
        list
    }

    /// Adds records at the end in arrival order and returns their new ids.
    pub fn append(&mut self, records: Vec<StationRecord>) -> Vec<RecordId> {
        let ids: Vec<RecordId> = records
            .into_iter()
            .map(|record| {
                let id = RecordId(self.next_id);
                self.next_id += 1;
                self.entries.push(Entry { id, record });
                id
            })
            .collect();

        if !ids.is_empty() {
            self.notify(ListChange::Appended(ids.clone()));
        }
        ids
    }

    /// Replaces the record behind `id`, keeping its position. Returns the
    /// record that was replaced.
    pub fn edit(&mut self, id: RecordId, record: StationRecord) -> Result<StationRecord, ListError> {
        let index = self.position(id).ok_or(ListError::UnknownRecord(id))?;
        let old = std::mem::replace(&mut self.entries[index].record, record);
        let new = self.entries[index].record.clone();
        self.notify(ListChange::Edited {
            id,
            old: old.clone(),
            new,
        });
        Ok(old)
    }

    pub fn remove(&mut self, id: RecordId) -> Result<StationRecord, ListError> {
        let index = self.position(id).ok_or(ListError::UnknownRecord(id))?;
        let entry = self.entries.remove(index);
        self.notify(ListChange::Removed {
            id,
            record: entry.record.clone(),
        });
        Ok(entry.record)
    }

    pub fn get(&self, id: RecordId) -> Option<&StationRecord> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.record)
    }

    /// Current index of `id`, for views that draw rows by position.
    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Id of the entry currently at `index`.
    pub fn id_at(&self, index: usize) -> Option<RecordId> {
        self.entries.get(index).map(|e| e.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &StationRecord)> {
        self.entries.iter().map(|e| (e.id, &e.record))
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// Snapshot of the records in list order, e.g. for rendering.
    pub fn records(&self) -> Vec<StationRecord> {
        self.entries.iter().map(|e| e.record.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers a new listener. Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<ListChange> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, change: ListChange) {
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
