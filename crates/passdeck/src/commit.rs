//! CommitEngine - turns "commit this row" into store mutations and saves
//!
//! The engine owns the [`EntryStore`] and is the only thing that mutates it
//! beyond raw text edits. A commit is planned into a [`Command`], applied
//! synchronously, and the resulting list is handed to the [`SaveSink`]
//! without waiting for it to be written. Save reports come back later
//! through [`CommitEngine::reconcile`]; nothing is ever rolled back.

use tracing::{debug, warn};

use crate::command::{Command, Decision, IgnoreReason};
use crate::entry::Field;
use crate::queue::{Revision, SaveOutcome, SaveReport, SaveSink};
use crate::store::{EntryStore, Slot};

/// What a commit did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The buffer became a stored entry at the front of the list
    Added,
    /// The entry at `index` was trimmed in place
    Updated { index: usize },
    /// The entry at `index` was removed
    Deleted { index: usize },
    /// Nothing changed and nothing was saved
    Ignored(IgnoreReason),
}

/// Commit state machine over an entry store
pub struct CommitEngine<S> {
    store: EntryStore,
    sink: S,
    /// Revision of the most recent save submitted
    latest: Option<Revision>,
}

impl<S: SaveSink> CommitEngine<S> {
    pub fn new(store: EntryStore, sink: S) -> Self {
        Self {
            store,
            sink,
            latest: None,
        }
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Raw text edit; nothing is trimmed or saved until the row is committed
    pub fn set_field(&mut self, slot: Slot, field: Field, value: impl Into<String>) -> bool {
        self.store.set_field(slot, field, value)
    }

    /// Commit the row at `slot`
    pub fn commit(&mut self, slot: Slot) -> CommitOutcome {
        let command = match Command::plan(slot, self.store.get(slot)) {
            Decision::Apply(command) => command,
            Decision::Ignore(reason) => {
                debug!(row = slot.row(), "Commit ignored: {}", reason.as_str());
                return CommitOutcome::Ignored(reason);
            }
        };

        let outcome = match &command {
            Command::Add(_) => CommitOutcome::Added,
            Command::Update { index, .. } => CommitOutcome::Updated { index: *index },
            Command::Delete { index } => CommitOutcome::Deleted { index: *index },
        };

        let persisted = self.store.apply(&command);
        debug!(
            command = command.name(),
            count = persisted.len(),
            "Commit applied"
        );

        match self.sink.submit(persisted) {
            Some(revision) => self.latest = Some(revision),
            // Nothing will reach the store for this change
            None => self.store.mark_failed(),
        }

        outcome
    }

    /// Fold a save report back into the store's sync state
    pub fn reconcile(&mut self, report: &SaveReport) {
        match &report.outcome {
            SaveOutcome::Saved if Some(report.revision) == self.latest => {
                self.store.mark_saved();
            }
            SaveOutcome::Saved => {
                debug!(revision = report.revision, "Save superseded by a newer one");
            }
            SaveOutcome::Failed(message) => {
                warn!(
                    revision = report.revision,
                    "Store and memory have diverged: {}", message
                );
                self.store.mark_failed();
            }
        }
    }
}
