//! Standard paths used by Passdeck

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory resolution failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathsError {
    #[error("Directory unavailable: could not resolve the {0} directory")]
    DirectoryUnavailable(&'static str),
}

/// Standard Passdeck paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Data directory (~/.local/share/passdeck)
    pub data: PathBuf,
    /// Config directory (~/.config/passdeck)
    pub config: PathBuf,
}

impl Paths {
    /// Resolve the platform directories.
    ///
    /// Unlike a best-effort lookup there is no fallback here: when the
    /// platform cannot tell us where user data lives, nothing gets loaded
    /// or saved for the session.
    pub fn resolve() -> Result<Self, PathsError> {
        let data = dirs::data_dir()
            .ok_or(PathsError::DirectoryUnavailable("data"))?
            .join("passdeck");

        let config = dirs::config_dir()
            .ok_or(PathsError::DirectoryUnavailable("config"))?
            .join("passdeck");

        Ok(Self { data, config })
    }

    /// Build paths rooted at an explicit directory (tests, portable installs)
    pub fn rooted(root: &Path) -> Self {
        Self {
            data: root.join("data"),
            config: root.join("config"),
        }
    }

    /// Default location of the configuration file
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.yaml")
    }

    /// Location of the TUI log file
    pub fn log_file(&self) -> PathBuf {
        self.data.join("passdeck.log")
    }

    /// Storage location for the credential store, honouring a configured override
    pub fn storage(&self, override_dir: Option<&Path>) -> PathBuf {
        match override_dir {
            Some(dir) => dir.to_path_buf(),
            None => self.data.join("store"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rooted_layout() {
        let paths = Paths::rooted(Path::new("/tmp/pd"));
        assert_eq!(paths.data, PathBuf::from("/tmp/pd/data"));
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/pd/config/config.yaml"));
        assert_eq!(paths.log_file(), PathBuf::from("/tmp/pd/data/passdeck.log"));
    }

    #[test]
    fn test_storage_override() {
        let paths = Paths::rooted(Path::new("/tmp/pd"));
        assert_eq!(paths.storage(None), PathBuf::from("/tmp/pd/data/store"));
        assert_eq!(
            paths.storage(Some(Path::new("/srv/vault"))),
            PathBuf::from("/srv/vault")
        );
    }

    #[test]
    fn test_unavailable_message() {
        let err = PathsError::DirectoryUnavailable("data");
        assert_eq!(
            err.to_string(),
            "Directory unavailable: could not resolve the data directory"
        );
    }
}
