//! passdeck - Local credential manager
//!
//! "Type it, press Enter, it's saved."
//!
//! A list of named secrets edited in place. The first row is a buffer for
//! the entry being composed; committing a row adds, updates or deletes an
//! entry and hands the resulting list to a single save writer, which keeps
//! the encrypted store in step with what is on screen.
//!
//! Uses age encryption (X25519 + ChaCha20-Poly1305) for the store.

pub mod clipboard;
pub mod command;
pub mod commit;
pub mod entry;
pub mod gateway;
pub mod queue;
pub mod search;
pub mod session;
pub mod store;
pub mod wire;

pub use clipboard::{copy_key, Clipboard, ClipboardError, SystemClipboard};
pub use command::{Command, Decision, IgnoreReason};
pub use commit::{CommitEngine, CommitOutcome};
pub use entry::{Entry, Field};
pub use gateway::{AgeFileGateway, GatewayError, MemoryGateway, PersistenceGateway};
pub use queue::{SaveOutcome, SaveQueue, SaveReport, SaveSink};
pub use session::{LoadStatus, Session};
pub use store::{EntryStore, Slot, SyncState};
pub use wire::{LoadParseError, Payload};
