//! Age-encrypted file gateway
//!
//! Layout under the storage location:
//!
//! ```text
//! <location>/
//!   passwords.age        encrypted canonical JSON
//!   keys/identity.key    X25519 identity, generated on first save
//! ```
//!
//! Uses age encryption (X25519 + ChaCha20-Poly1305).

use age::secrecy::ExposeSecret;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{GatewayError, PersistenceGateway};
use crate::entry::Entry;
use crate::wire::{self, Payload};

/// Stores the entry list as a single age-encrypted file
#[derive(Debug, Clone)]
pub struct AgeFileGateway {
    file_name: String,
}

impl AgeFileGateway {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    pub fn store_path(&self, location: &Path) -> PathBuf {
        location.join(&self.file_name)
    }

    fn identity_path(location: &Path) -> PathBuf {
        location.join("keys").join("identity.key")
    }

    /// Load the identity key, if one has been generated
    fn load_identity(location: &Path) -> Result<Option<age::x25519::Identity>, GatewayError> {
        let path = Self::identity_path(location);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        content
            .trim()
            .parse::<age::x25519::Identity>()
            .map(Some)
            .map_err(|e| GatewayError::Identity(format!("Failed to parse identity: {}", e)))
    }

    /// Load the identity key, generating it (and the directories) on first use
    fn load_or_create_identity(location: &Path) -> Result<age::x25519::Identity, GatewayError> {
        if let Some(identity) = Self::load_identity(location)? {
            return Ok(identity);
        }

        ensure_private_dir(&location.join("keys"))?;

        info!("Generating new identity key");
        let identity = age::x25519::Identity::generate();
        let identity_str = identity.to_string();

        let path = Self::identity_path(location);
        let mut file = create_private(&path)?;
        file.write_all(identity_str.expose_secret().as_bytes())?;

        Ok(identity)
    }

    fn encrypt(identity: &age::x25519::Identity, plaintext: &[u8]) -> Result<Vec<u8>, GatewayError> {
        let recipient = identity.to_public();
        let encryptor = age::Encryptor::with_recipients(vec![Box::new(recipient)])
            .ok_or_else(|| GatewayError::Encryption("No recipients".to_string()))?;

        let mut encrypted = vec![];
        let mut writer = encryptor
            .wrap_output(&mut encrypted)
            .map_err(|e| GatewayError::Encryption(e.to_string()))?;

        writer
            .write_all(plaintext)
            .map_err(|e| GatewayError::Encryption(e.to_string()))?;

        writer
            .finish()
            .map_err(|e| GatewayError::Encryption(e.to_string()))?;

        Ok(encrypted)
    }

    fn decrypt(identity: &age::x25519::Identity, encrypted: &[u8]) -> Result<Vec<u8>, GatewayError> {
        let decryptor = match age::Decryptor::new(encrypted)
            .map_err(|e| GatewayError::Decryption(e.to_string()))?
        {
            age::Decryptor::Recipients(d) => d,
            _ => {
                return Err(GatewayError::Decryption(
                    "Unexpected passphrase encryption".to_string(),
                ))
            }
        };

        let mut decrypted = vec![];
        let mut reader = decryptor
            .decrypt(std::iter::once(identity as &dyn age::Identity))
            .map_err(|e| GatewayError::Decryption(e.to_string()))?;

        reader
            .read_to_end(&mut decrypted)
            .map_err(|e| GatewayError::Decryption(e.to_string()))?;

        Ok(decrypted)
    }
}

impl PersistenceGateway for AgeFileGateway {
    fn save(&self, location: &Path, entries: &[Entry]) -> Result<(), GatewayError> {
        let identity = Self::load_or_create_identity(location)?;

        let json = wire::encode(entries)?;
        let encrypted = Self::encrypt(&identity, json.as_bytes())?;

        // Write beside the store, then swap it in
        let path = self.store_path(location);
        let tmp = path.with_extension("tmp");
        if tmp.exists() {
            // Left over from an interrupted save; its mode is unknown
            fs::remove_file(&tmp)?;
        }
        {
            let mut file = create_private(&tmp)?;
            file.write_all(&encrypted)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;

        info!(count = entries.len(), "Store saved");
        Ok(())
    }

    fn load(&self, location: &Path) -> Result<Payload, GatewayError> {
        let path = self.store_path(location);
        if !path.exists() {
            debug!("No store at {}", path.display());
            return Ok(Payload::empty());
        }

        let identity = Self::load_identity(location)?.ok_or_else(|| {
            GatewayError::Identity("Store exists but identity key is missing".to_string())
        })?;

        let encrypted = fs::read(&path)?;
        let decrypted = Self::decrypt(&identity, &encrypted)?;
        let text = String::from_utf8(decrypted).map_err(|_| GatewayError::Utf8)?;

        info!("Store loaded");
        Ok(Payload::Text(text))
    }
}

/// Create `dir` and any missing parents as owner-only directories.
/// Directories that already exist are left as they are.
fn ensure_private_dir(dir: &Path) -> std::io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

/// Open `path` for writing, creating it owner-only (0600) from the start
fn create_private(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn gateway() -> AgeFileGateway {
        AgeFileGateway::new("passwords.age")
    }

    #[test]
    fn test_missing_store_loads_empty() {
        let dir = TempDir::new().unwrap();
        let payload = gateway().load(dir.path()).unwrap();
        assert!(wire::decode(payload).unwrap().is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let location = dir.path().join("store");
        let gateway = gateway();

        let entries = vec![
            Entry::new("github", "gh-token"),
            Entry::new("mail", "hunter2"),
            Entry::new("github", "second account"),
        ];
        gateway.save(&location, &entries).unwrap();

        let loaded = wire::decode(gateway.load(&location).unwrap()).unwrap();
        assert_eq!(loaded, entries);
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let mode = |path: &Path| fs::metadata(path).unwrap().permissions().mode() & 0o777;

        let dir = TempDir::new().unwrap();
        let gateway = gateway();

        // A directory the user already has keeps its mode
        let shared = dir.path().join("shared");
        fs::create_dir(&shared).unwrap();
        fs::set_permissions(&shared, fs::Permissions::from_mode(0o755)).unwrap();
        gateway.save(&shared, &[Entry::new("a", "1")]).unwrap();
        assert_eq!(mode(&shared), 0o755);
        assert_eq!(mode(&shared.join("keys")), 0o700);
        assert_eq!(mode(&shared.join("keys").join("identity.key")), 0o600);
        assert_eq!(mode(&gateway.store_path(&shared)), 0o600);

        // One the gateway creates is owner-only
        let fresh = dir.path().join("fresh").join("store");
        gateway.save(&fresh, &[Entry::new("a", "1")]).unwrap();
        assert_eq!(mode(&fresh), 0o700);
        assert_eq!(mode(&fresh.join("keys")), 0o700);
    }

    #[test]
    fn test_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway();

        gateway.save(dir.path(), &[Entry::new("a", "1")]).unwrap();
        gateway.save(dir.path(), &[]).unwrap();

        let loaded = wire::decode(gateway.load(dir.path()).unwrap()).unwrap();
        assert!(loaded.is_empty());
        assert!(!gateway.store_path(dir.path()).with_extension("tmp").exists());
    }

    #[test]
    fn test_store_is_not_plaintext() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway();
        gateway.save(dir.path(), &[Entry::new("bank", "p4ss")]).unwrap();

        let raw = fs::read(gateway.store_path(dir.path())).unwrap();
        let raw = String::from_utf8_lossy(&raw);
        assert!(!raw.contains("p4ss"));
        assert!(!raw.contains("bank"));
    }

    #[test]
    fn test_identity_is_reused() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway();
        gateway.save(dir.path(), &[Entry::new("a", "1")]).unwrap();
        let first = fs::read_to_string(AgeFileGateway::identity_path(dir.path())).unwrap();

        gateway.save(dir.path(), &[Entry::new("b", "2")]).unwrap();
        let second = fs::read_to_string(AgeFileGateway::identity_path(dir.path())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_identity_is_error() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway();
        gateway.save(dir.path(), &[Entry::new("a", "1")]).unwrap();
        fs::remove_file(AgeFileGateway::identity_path(dir.path())).unwrap();

        assert!(matches!(
            gateway.load(dir.path()),
            Err(GatewayError::Identity(_))
        ));
    }
}
