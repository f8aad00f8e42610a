//! passdeck - Local credential manager
//!
//! An editable list of named secrets, saved to an encrypted store on
//! every confirmed edit.
//!
//! Commands:
//! - ui (default): Interactive terminal UI
//! - list [TERM]: List entries whose key contains TERM
//! - add <KEY> [SECRET]: Add an entry (prompts if no secret)
//! - edit <ROW>: Change the key and/or secret of an entry
//! - remove <ROW>: Delete an entry
//! - path: Show where the store lives

mod app;
mod ui;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use passdeck::{
    search, AgeFileGateway, CommitOutcome, Field, LoadStatus, SaveOutcome, Session, Slot,
    SystemClipboard,
};
use passdeck_core::{format, Config, Paths, PathsError};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "passdeck")]
#[command(about = "Local credential manager - named secrets in an encrypted store")]
#[command(version)]
#[command(after_help = r#"ROWS:
    Row 0 is the new-entry buffer. Stored entries are numbered from 1,
    most recently added first. `passdeck list` shows the numbers.

EDITING RULES:
    - A new entry needs both a key and a secret
    - Clearing both fields of an entry deletes it
    - Clearing only one field is refused; nothing is saved
    - Keys do not have to be unique

SECURITY:
    - The store is encrypted with age (X25519 + ChaCha20-Poly1305)
    - Store and identity key live in ~/.local/share/passdeck/store/
    - Secrets are never logged"#)]
struct Cli {
    /// Config file (default: ~/.config/passdeck/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal UI (default)
    Ui,

    /// List entries whose key contains TERM (case-insensitive)
    List {
        /// Search term
        term: Option<String>,
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
        /// Show secrets instead of masking them
        #[arg(long)]
        reveal: bool,
    },

    /// Add an entry (prompts securely if the secret is omitted)
    Add {
        /// Entry key (e.g. github, mail/work)
        key: String,
        /// Secret value (omit for a hidden prompt)
        secret: Option<String>,
    },

    /// Change an entry's key and/or secret
    Edit {
        /// Row number from `passdeck list`
        row: usize,
        /// New key
        #[arg(long)]
        key: Option<String>,
        /// New secret
        #[arg(long)]
        secret: Option<String>,
    },

    /// Delete an entry
    Remove {
        /// Row number from `passdeck list`
        row: usize,
    },

    /// Show the storage location
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = Paths::resolve();
    let config = load_config(cli.config.as_deref(), paths.as_ref().ok())?;
    let interactive = matches!(cli.command, None | Some(Commands::Ui));
    init_logging(&config, paths.as_ref().ok(), interactive)?;

    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let location = resolve_location(&paths, &config);
    let gateway = Arc::new(AgeFileGateway::new(config.storage.file.clone()));
    let mut session = Session::open(gateway, location);

    match cli.command {
        None | Some(Commands::Ui) => {
            app::run(session, Box::new(SystemClipboard::new()), &config, &rt)
        }
        Some(Commands::List { term, json, reveal }) => {
            cmd_list(&session, term.as_deref(), json, reveal)
        }
        Some(Commands::Add { key, secret }) => rt.block_on(cmd_add(&mut session, key, secret)),
        Some(Commands::Edit { row, key, secret }) => {
            rt.block_on(cmd_edit(&mut session, row, key, secret))
        }
        Some(Commands::Remove { row }) => rt.block_on(cmd_remove(&mut session, row)),
        Some(Commands::Path) => cmd_path(&session, &config),
    }
}

fn load_config(explicit: Option<&std::path::Path>, paths: Option<&Paths>) -> Result<Config> {
    match (explicit, paths) {
        (Some(path), _) => Config::load_from(path),
        (None, Some(paths)) => Config::load(paths),
        (None, None) => Ok(Config::default()),
    }
}

/// Storage directory: the configured override, else the standard one
fn resolve_location(
    paths: &Result<Paths, PathsError>,
    config: &Config,
) -> Result<PathBuf, PathsError> {
    match (paths, config.storage.dir.as_deref()) {
        (Ok(paths), dir) => Ok(paths.storage(dir)),
        (Err(_), Some(dir)) => Ok(dir.to_path_buf()),
        (Err(e), None) => Err(e.clone()),
    }
}

fn init_logging(config: &Config, paths: Option<&Paths>, interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.filter));

    if !interactive {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(());
    }

    // The TUI owns the terminal, so logs go to a file (or nowhere)
    let Some(paths) = paths else {
        return Ok(());
    };
    fs::create_dir_all(&paths.data)
        .with_context(|| format!("Failed to create {}", paths.data.display()))?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(paths.log_file())
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

fn warn_load_status(session: &Session) {
    match session.load_status() {
        LoadStatus::Loaded(_) => {}
        LoadStatus::Unreadable(reason) => {
            eprintln!("warning: Store could not be read ({}); showing no entries", reason)
        }
        LoadStatus::DirectoryUnavailable(reason) => eprintln!("warning: {}", reason),
    }
}

/// Wait for the save of a mutating command and fail loudly if it did not land
async fn finish(session: &mut Session) -> Result<()> {
    if session.location().is_none() {
        bail!("No storage location available; the change was not saved");
    }

    for report in session.flush().await {
        if let SaveOutcome::Failed(message) = report.outcome {
            bail!("Save failed: {}", message);
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct ListedEntry<'a> {
    row: usize,
    key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret: Option<&'a str>,
}

/// List entries
fn cmd_list(session: &Session, term: Option<&str>, json: bool, reveal: bool) -> Result<()> {
    warn_load_status(session);

    let store = session.engine().store();
    let listed: Vec<ListedEntry> = search::filter(store, term.unwrap_or(""))
        .into_iter()
        .filter(|m| m.slot != Slot::Buffer)
        .map(|m| ListedEntry {
            row: m.slot.row(),
            key: &m.entry.key,
            secret: reveal.then_some(m.entry.secret.as_str()),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }

    if listed.is_empty() {
        match term {
            Some(term) => println!("No entries matching: {}", term),
            None => println!("No entries stored. Add one with: passdeck add <key>"),
        }
        return Ok(());
    }

    println!("Stored Entries");
    println!();

    for entry in &listed {
        let secret = match entry.secret {
            Some(secret) => secret.to_string(),
            None => "••••••".to_string(),
        };
        println!(
            "  {:>3}  {:<32}  {}",
            entry.row,
            format::truncate(entry.key, 32),
            secret
        );
    }

    Ok(())
}

/// Add an entry through the buffer
async fn cmd_add(session: &mut Session, key: String, secret: Option<String>) -> Result<()> {
    warn_load_status(session);

    let secret = match secret {
        Some(v) => v,
        None => rpassword::prompt_password("Enter secret: ")
            .context("Failed to read secret value")?,
    };

    let engine = session.engine_mut();
    engine.set_field(Slot::Buffer, Field::Key, key.as_str());
    engine.set_field(Slot::Buffer, Field::Secret, secret);

    match engine.commit(Slot::Buffer) {
        CommitOutcome::Ignored(reason) => bail!("Nothing saved: {}", reason.as_str()),
        _ => finish(session).await?,
    }

    println!("success: Entry added: {}", key.trim());
    Ok(())
}

fn entry_slot(session: &Session, row: usize) -> Result<Slot> {
    let slot = Slot::from_row(row);
    if slot == Slot::Buffer {
        bail!("Row 0 is the new-entry buffer; use `passdeck add` instead");
    }
    if session.engine().store().get(slot).is_none() {
        bail!("No entry at row {}", row);
    }
    Ok(slot)
}

/// Edit an entry in place
async fn cmd_edit(
    session: &mut Session,
    row: usize,
    key: Option<String>,
    secret: Option<String>,
) -> Result<()> {
    warn_load_status(session);
    let slot = entry_slot(session, row)?;

    if key.is_none() && secret.is_none() {
        bail!("Nothing to change; pass --key and/or --secret");
    }

    let engine = session.engine_mut();
    if let Some(key) = key {
        engine.set_field(slot, Field::Key, key);
    }
    if let Some(secret) = secret {
        engine.set_field(slot, Field::Secret, secret);
    }

    let message = match engine.commit(slot) {
        CommitOutcome::Updated { .. } => format!("success: Entry updated at row {}", row),
        CommitOutcome::Deleted { .. } => format!("success: Entry deleted at row {}", row),
        CommitOutcome::Ignored(reason) => bail!("Nothing saved: {}", reason.as_str()),
        CommitOutcome::Added => bail!("Unexpected add while editing row {}", row),
    };

    finish(session).await?;
    println!("{}", message);
    Ok(())
}

/// Remove an entry by clearing both fields
async fn cmd_remove(session: &mut Session, row: usize) -> Result<()> {
    warn_load_status(session);
    let slot = entry_slot(session, row)?;

    let engine = session.engine_mut();
    engine.set_field(slot, Field::Key, "");
    engine.set_field(slot, Field::Secret, "");

    if !matches!(engine.commit(slot), CommitOutcome::Deleted { .. }) {
        bail!("Entry at row {} was not deleted", row);
    }

    finish(session).await?;
    println!("success: Entry deleted at row {}", row);
    Ok(())
}

/// Show the storage location
fn cmd_path(session: &Session, config: &Config) -> Result<()> {
    match session.location() {
        Some(location) => println!("{}", config.store_file(location).display()),
        None => bail!("No storage location available"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use passdeck::{Entry, MemoryGateway, PersistenceGateway};

    #[test]
    fn test_cli_parse() {
        let cli = Cli::try_parse_from(["passdeck"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["passdeck", "add", "github", "token"]).unwrap();
        if let Some(Commands::Add { key, secret }) = cli.command {
            assert_eq!(key, "github");
            assert_eq!(secret, Some("token".to_string()));
        } else {
            panic!("Expected Add command");
        }

        let cli = Cli::try_parse_from(["passdeck", "list", "git", "--json"]).unwrap();
        if let Some(Commands::List { term, json, reveal }) = cli.command {
            assert_eq!(term.as_deref(), Some("git"));
            assert!(json);
            assert!(!reveal);
        } else {
            panic!("Expected List command");
        }
    }

    #[test]
    fn test_cli_edit_and_global_config() {
        let cli = Cli::try_parse_from([
            "passdeck", "edit", "2", "--secret", "new", "--config", "/tmp/c.yaml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.yaml")));
        if let Some(Commands::Edit { row, key, secret }) = cli.command {
            assert_eq!(row, 2);
            assert_eq!(key, None);
            assert_eq!(secret.as_deref(), Some("new"));
        } else {
            panic!("Expected Edit command");
        }
    }

    #[test]
    fn test_resolve_location() {
        let paths = Ok(Paths::rooted(std::path::Path::new("/home/u")));
        let mut config = Config::default();
        assert_eq!(
            resolve_location(&paths, &config),
            Ok(PathBuf::from("/home/u/data/store"))
        );

        let unavailable = Err(PathsError::DirectoryUnavailable("data"));
        assert!(resolve_location(&unavailable, &config).is_err());

        config.storage.dir = Some(PathBuf::from("/srv/keys"));
        assert_eq!(
            resolve_location(&unavailable, &config),
            Ok(PathBuf::from("/srv/keys"))
        );
    }

    fn session_with(entries: &[Entry]) -> (Session, Arc<MemoryGateway>) {
        let gateway = Arc::new(MemoryGateway::new());
        let location = PathBuf::from("/vault");
        gateway.save(&location, entries).unwrap();
        (Session::open(gateway.clone(), Ok(location)), gateway)
    }

    #[tokio::test]
    async fn test_cmd_add_and_edit() {
        let (mut session, gateway) = session_with(&[]);

        cmd_add(&mut session, "github".into(), Some("token".into()))
            .await
            .unwrap();
        cmd_add(&mut session, "mail".into(), Some("m".into()))
            .await
            .unwrap();
        cmd_edit(&mut session, 2, None, Some("token2".into()))
            .await
            .unwrap();

        assert_eq!(
            gateway.saves().last(),
            Some(&vec![Entry::new("mail", "m"), Entry::new("github", "token2")])
        );
    }

    #[tokio::test]
    async fn test_cmd_add_refuses_blank_secret() {
        let (mut session, gateway) = session_with(&[]);
        let result = cmd_add(&mut session, "github".into(), Some("   ".into())).await;
        assert!(result.is_err());
        // Only the seeding save
        assert_eq!(gateway.saves().len(), 1);
    }

    #[tokio::test]
    async fn test_cmd_edit_partial_is_refused() {
        let (mut session, _) = session_with(&[Entry::new("a", "1")]);
        let result = cmd_edit(&mut session, 1, None, Some(String::new())).await;
        assert!(result.is_err());
        assert!(cmd_edit(&mut session, 0, Some("x".into()), None).await.is_err());
        assert!(cmd_edit(&mut session, 5, Some("x".into()), None).await.is_err());
    }

    #[tokio::test]
    async fn test_cmd_remove() {
        let (mut session, gateway) = session_with(&[Entry::new("a", "1"), Entry::new("b", "2")]);
        cmd_remove(&mut session, 1).await.unwrap();
        assert_eq!(gateway.saves().last(), Some(&vec![Entry::new("b", "2")]));
    }

    #[tokio::test]
    async fn test_failed_save_is_an_error() {
        let (mut session, gateway) = session_with(&[Entry::new("a", "1")]);
        gateway.set_failing(true);
        assert!(cmd_remove(&mut session, 1).await.is_err());
    }
}
