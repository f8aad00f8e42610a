//! Passdeck Core - Shared functionality for the Passdeck credential manager
//!
//! Paths, configuration and display helpers used by both the CLI and the TUI.

pub mod config;
pub mod format;
pub mod paths;

pub use config::Config;
pub use paths::{Paths, PathsError};
