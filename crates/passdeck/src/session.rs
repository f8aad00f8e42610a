//! Session - startup loading and the wiring between engine and queue
//!
//! Order matters: the storage location has to be resolved before anything
//! is loaded, and a location that cannot be resolved disables persistence
//! for the whole session rather than failing it.

use passdeck_core::PathsError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::commit::CommitEngine;
use crate::entry::Entry;
use crate::gateway::PersistenceGateway;
use crate::queue::{DetachedSink, Revision, SaveQueue, SaveReport, SaveSink};
use crate::store::EntryStore;
use crate::wire;

/// How startup loading went
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Loaded this many entries
    Loaded(usize),
    /// The store could not be read or decoded; started empty
    Unreadable(String),
    /// No storage location; nothing is loaded or saved this session
    DirectoryUnavailable(String),
}

/// Save destination for a session
pub enum SessionSink {
    Queue(SaveQueue),
    Detached(DetachedSink),
}

impl SaveSink for SessionSink {
    fn submit(&mut self, entries: Vec<Entry>) -> Option<Revision> {
        match self {
            SessionSink::Queue(queue) => queue.submit(entries),
            SessionSink::Detached(sink) => sink.submit(entries),
        }
    }
}

/// A loaded entry list with its save pipeline
pub struct Session {
    engine: CommitEngine<SessionSink>,
    reports: Option<mpsc::UnboundedReceiver<SaveReport>>,
    location: Option<PathBuf>,
    status: LoadStatus,
}

impl Session {
    /// Load the store and start the save writer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(
        gateway: Arc<dyn PersistenceGateway>,
        location: Result<PathBuf, PathsError>,
    ) -> Self {
        let location = match location {
            Ok(location) => location,
            Err(e) => {
                warn!("{}; entries will not be loaded or saved", e);
                return Self {
                    engine: CommitEngine::new(
                        EntryStore::new(),
                        SessionSink::Detached(DetachedSink),
                    ),
                    reports: None,
                    location: None,
                    status: LoadStatus::DirectoryUnavailable(e.to_string()),
                };
            }
        };

        info!("Loading store from {}", location.display());
        let (store, status) = match gateway.load(&location) {
            Ok(payload) => {
                let decoded = wire::decode(payload);
                let status = match &decoded {
                    Ok(entries) => LoadStatus::Loaded(entries.len()),
                    Err(e) => LoadStatus::Unreadable(e.to_string()),
                };
                (EntryStore::from_decoded(decoded), status)
            }
            Err(e) => {
                error!("Error loading store: {}", e);
                (EntryStore::new(), LoadStatus::Unreadable(e.to_string()))
            }
        };

        let (queue, reports) = SaveQueue::spawn(gateway, location.clone());

        Self {
            engine: CommitEngine::new(store, SessionSink::Queue(queue)),
            reports: Some(reports),
            location: Some(location),
            status,
        }
    }

    pub fn engine(&self) -> &CommitEngine<SessionSink> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut CommitEngine<SessionSink> {
        &mut self.engine
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.status
    }

    /// Reconcile every save report that has arrived, without waiting
    pub fn drain_reports(&mut self) -> Vec<SaveReport> {
        let mut drained = Vec::new();
        if let Some(reports) = self.reports.as_mut() {
            while let Ok(report) = reports.try_recv() {
                self.engine.reconcile(&report);
                drained.push(report);
            }
        }
        drained
    }

    /// Wait for all submitted saves, then reconcile their reports
    pub async fn flush(&mut self) -> Vec<SaveReport> {
        if let SessionSink::Queue(queue) = self.engine.sink() {
            queue.flush().await;
        }
        self.drain_reports()
    }
}
