//! Persistence gateways
//!
//! A gateway overwrites and reads back the persisted store at a storage
//! location. It owns the on-disk encoding entirely; the rest of the crate
//! only sees entries going in and a [`Payload`] coming out.

mod age_file;
mod memory;

pub use age_file::AgeFileGateway;
pub use memory::MemoryGateway;

use std::path::Path;
use thiserror::Error;

use crate::entry::Entry;
use crate::wire::Payload;

/// Gateway failures
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Identity key error: {0}")]
    Identity(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Store is not valid UTF-8")]
    Utf8,

    #[error("Save rejected: {0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Backing store for the entry list
pub trait PersistenceGateway: Send + Sync {
    /// Overwrite the store at `location` with exactly `entries`, in order
    fn save(&self, location: &Path, entries: &[Entry]) -> Result<(), GatewayError>;

    /// Read the store at `location`. A store that was never written loads
    /// as an empty list.
    fn load(&self, location: &Path) -> Result<Payload, GatewayError>;
}
