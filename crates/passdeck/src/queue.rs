//! Save queue - one writer, strict submission order
//!
//! Commits never wait on the disk. Each commit submits the full entry list
//! it produced; a single writer task runs the saves one after another on
//! the blocking pool and reports how each one went. Because every save
//! carries the whole list, the store ends up matching the last submission
//! regardless of how long earlier saves took.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::entry::Entry;
use crate::gateway::PersistenceGateway;

/// Monotonic id of a submitted save
pub type Revision = u64;

/// Where committed entry lists go
pub trait SaveSink {
    /// Hand over the list to persist. Returns the revision assigned to the
    /// save, or `None` when nothing will be written.
    fn submit(&mut self, entries: Vec<Entry>) -> Option<Revision>;
}

/// How a save finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Failed(String),
}

/// Completion notice for one save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub revision: Revision,
    pub at: DateTime<Utc>,
    pub outcome: SaveOutcome,
}

impl SaveReport {
    pub fn is_saved(&self) -> bool {
        self.outcome == SaveOutcome::Saved
    }
}

enum Job {
    Save { revision: Revision, entries: Vec<Entry> },
    Flush(oneshot::Sender<()>),
}

/// Handle to the writer task
pub struct SaveQueue {
    jobs: mpsc::UnboundedSender<Job>,
    next_revision: Revision,
}

impl SaveQueue {
    /// Start the writer task on the current tokio runtime.
    ///
    /// Returns the queue handle and the stream of save reports.
    pub fn spawn(
        gateway: Arc<dyn PersistenceGateway>,
        location: PathBuf,
    ) -> (Self, mpsc::UnboundedReceiver<SaveReport>) {
        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_writer(gateway, location, jobs_rx, reports_tx));

        (
            Self {
                jobs: jobs_tx,
                next_revision: 1,
            },
            reports_rx,
        )
    }

    /// Wait until every save submitted before this call has finished
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.jobs.send(Job::Flush(ack_tx)).is_err() {
            return;
        }
        let _ = ack_rx.await;
    }
}

impl SaveSink for SaveQueue {
    fn submit(&mut self, entries: Vec<Entry>) -> Option<Revision> {
        let revision = self.next_revision;
        self.next_revision += 1;

        debug!(revision, count = entries.len(), "Queueing save");
        if self.jobs.send(Job::Save { revision, entries }).is_err() {
            error!(revision, "Save writer has stopped; save dropped");
            return None;
        }
        Some(revision)
    }
}

async fn run_writer(
    gateway: Arc<dyn PersistenceGateway>,
    location: PathBuf,
    mut jobs: mpsc::UnboundedReceiver<Job>,
    reports: mpsc::UnboundedSender<SaveReport>,
) {
    while let Some(job) = jobs.recv().await {
        match job {
            Job::Save { revision, entries } => {
                let gateway = Arc::clone(&gateway);
                let location = location.clone();
                let result =
                    tokio::task::spawn_blocking(move || gateway.save(&location, &entries)).await;

                let outcome = match result {
                    Ok(Ok(())) => {
                        info!(revision, "Save completed");
                        SaveOutcome::Saved
                    }
                    Ok(Err(e)) => {
                        error!(revision, "Save failed: {}", e);
                        SaveOutcome::Failed(e.to_string())
                    }
                    Err(e) => {
                        error!(revision, "Save task panicked: {}", e);
                        SaveOutcome::Failed(e.to_string())
                    }
                };

                // Nobody listening is fine; the save itself already happened
                let _ = reports.send(SaveReport {
                    revision,
                    at: Utc::now(),
                    outcome,
                });
            }
            Job::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    debug!("Save writer stopped");
}

/// Sink used when no storage location could be resolved
#[derive(Debug, Default)]
pub struct DetachedSink;

impl SaveSink for DetachedSink {
    fn submit(&mut self, entries: Vec<Entry>) -> Option<Revision> {
        debug!(count = entries.len(), "No storage location; save skipped");
        None
    }
}

/// Sink that keeps every submission in memory
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    pub submitted: Vec<Vec<Entry>>,
}

#[cfg(test)]
impl SaveSink for RecordingSink {
    fn submit(&mut self, entries: Vec<Entry>) -> Option<Revision> {
        self.submitted.push(entries);
        Some(self.submitted.len() as Revision)
    }
}
