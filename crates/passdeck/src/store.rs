//! EntryStore - the editable list of entries plus the edit buffer
//!
//! The buffer is the entry the user is composing. It lives beside the
//! stored entries rather than at the head of them, so no index ever has
//! to be special-cased and the persisted tail is simply `entries()`.

use tracing::{debug, warn};

use crate::command::Command;
use crate::entry::{Entry, Field};
use crate::wire::LoadParseError;

/// Address of a row in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The entry being composed
    Buffer,
    /// A stored entry, by position in `entries()`
    Entry(usize),
}

impl Slot {
    /// Display row number: the buffer is row 0, stored entries follow
    pub fn row(&self) -> usize {
        match self {
            Slot::Buffer => 0,
            Slot::Entry(index) => index + 1,
        }
    }

    pub fn from_row(row: usize) -> Self {
        match row {
            0 => Slot::Buffer,
            n => Slot::Entry(n - 1),
        }
    }
}

/// Whether a stored entry is known to match the persisted store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Synced,
    /// Committed, save not yet confirmed
    Pending,
    /// The save carrying this entry failed
    Unsynced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Record {
    entry: Entry,
    sync: SyncState,
}

/// In-memory entry list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryStore {
    buffer: Entry,
    records: Vec<Record>,
    /// A save failed and no later save has succeeded
    diverged: bool,
}

impl EntryStore {
    /// An empty store: blank buffer, no entries
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh buffer followed by the loaded entries, in load order
    pub fn initialize(loaded: Vec<Entry>) -> Self {
        debug!(count = loaded.len(), "Initializing entry store");
        Self {
            buffer: Entry::empty(),
            records: loaded
                .into_iter()
                .map(|entry| Record {
                    entry,
                    sync: SyncState::Synced,
                })
                .collect(),
            diverged: false,
        }
    }

    /// Initialize from a decode result, degrading to an empty list when the
    /// loaded data could not be interpreted
    pub fn from_decoded(decoded: Result<Vec<Entry>, LoadParseError>) -> Self {
        match decoded {
            Ok(entries) => Self::initialize(entries),
            Err(e) => {
                warn!("Ignoring unreadable store contents: {}", e);
                Self::initialize(Vec::new())
            }
        }
    }

    /// Replace the text of one field. No trimming, no persistence.
    ///
    /// Returns false when the slot does not exist.
    pub fn set_field(&mut self, slot: Slot, field: Field, value: impl Into<String>) -> bool {
        match self.get_mut(slot) {
            Some(entry) => {
                entry.set(field, value);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the stored entries (everything except the buffer)
    pub fn entries(&self) -> Vec<Entry> {
        self.records.iter().map(|r| r.entry.clone()).collect()
    }

    /// All rows in display order, buffer first
    pub fn rows(&self) -> impl Iterator<Item = (Slot, &Entry)> {
        std::iter::once((Slot::Buffer, &self.buffer)).chain(
            self.records
                .iter()
                .enumerate()
                .map(|(i, r)| (Slot::Entry(i), &r.entry)),
        )
    }

    pub fn buffer(&self) -> &Entry {
        &self.buffer
    }

    pub fn get(&self, slot: Slot) -> Option<&Entry> {
        match slot {
            Slot::Buffer => Some(&self.buffer),
            Slot::Entry(index) => self.records.get(index).map(|r| &r.entry),
        }
    }

    fn get_mut(&mut self, slot: Slot) -> Option<&mut Entry> {
        match slot {
            Slot::Buffer => Some(&mut self.buffer),
            Slot::Entry(index) => self.records.get_mut(index).map(|r| &mut r.entry),
        }
    }

    /// Sync state of a stored entry; the buffer has none
    pub fn sync_state(&self, slot: Slot) -> Option<SyncState> {
        match slot {
            Slot::Buffer => None,
            Slot::Entry(index) => self.records.get(index).map(|r| r.sync),
        }
    }

    /// Number of stored entries (the buffer is not counted)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_diverged(&self) -> bool {
        self.diverged
    }

    /// Apply a planned command. The touched entry becomes Pending and an
    /// add also resets the buffer. Returns the new tail, which is exactly
    /// what must be persisted.
    pub(crate) fn apply(&mut self, command: &Command) -> Vec<Entry> {
        self.records = command.apply_to(&self.records, |entry| Record {
            entry: entry.clone(),
            sync: SyncState::Pending,
        });
        if matches!(command, Command::Add(_)) {
            self.buffer = Entry::empty();
        }
        self.entries()
    }

    /// The latest save succeeded: memory and store agree again
    pub(crate) fn mark_saved(&mut self) {
        for record in &mut self.records {
            record.sync = SyncState::Synced;
        }
        self.diverged = false;
    }

    /// A save failed: whatever it carried is not on disk
    pub(crate) fn mark_failed(&mut self) {
        for record in &mut self.records {
            if record.sync == SyncState::Pending {
                record.sync = SyncState::Unsynced;
            }
        }
        self.diverged = true;
    }
}
