//! Terminal UI state and event loop

use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use passdeck::{
    copy_key, search, Clipboard, CommitOutcome, Entry, Field, LoadStatus, SaveOutcome, Session,
    Slot,
};
use passdeck_core::Config;
use ratatui::prelude::*;
use std::io;
use std::time::{Duration, Instant};

use crate::ui;

/// What has keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    Row(Field),
}

/// Severity of the footer message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

pub struct App {
    pub session: Session,
    clipboard: Box<dyn Clipboard>,
    pub search: String,
    /// Row that edits, Enter and copy act on
    pub selected: Slot,
    pub focus: Focus,
    pub mask_secrets: bool,
    pub reveal: bool,
    pub show_help: bool,
    pub status: Option<(String, StatusKind)>,
}

impl App {
    pub fn new(session: Session, clipboard: Box<dyn Clipboard>, config: &Config) -> Self {
        let status = match session.load_status() {
            LoadStatus::Loaded(_) => None,
            LoadStatus::Unreadable(_) => Some((
                "Store could not be read; starting empty".to_string(),
                StatusKind::Error,
            )),
            LoadStatus::DirectoryUnavailable(_) => Some((
                "No storage location; changes will not be saved".to_string(),
                StatusKind::Error,
            )),
        };

        Self {
            session,
            clipboard,
            search: String::new(),
            selected: Slot::Buffer,
            focus: Focus::Row(Field::Key),
            mask_secrets: config.ui.mask_secrets,
            reveal: false,
            show_help: false,
            status,
        }
    }

    /// Slots matching the search term, in display order
    fn matching(&self) -> Vec<Slot> {
        search::filter(self.session.engine().store(), &self.search)
            .into_iter()
            .map(|m| m.slot)
            .collect()
    }

    /// Rows currently shown. The selected row stays listed while it is
    /// being edited, even once its key no longer matches.
    pub fn visible(&self) -> Vec<(Slot, Entry)> {
        let matching = self.matching();
        self.session
            .engine()
            .store()
            .rows()
            .filter(|(slot, _)| *slot == self.selected || matching.contains(slot))
            .map(|(slot, entry)| (slot, entry.clone()))
            .collect()
    }

    /// Where the selected row sits in `visible()`
    pub fn selected_position(&self) -> Option<usize> {
        self.visible()
            .iter()
            .position(|(slot, _)| *slot == self.selected)
    }

    pub fn secrets_hidden(&self) -> bool {
        self.mask_secrets && !self.reveal
    }

    /// Select the first row matching the search, or the buffer
    fn select_first_match(&mut self) {
        self.selected = self.matching().first().copied().unwrap_or(Slot::Buffer);
    }

    /// Move the selection by `delta` rows within `visible()`
    fn move_selection(&mut self, delta: isize) {
        let visible = self.visible();
        let Some(position) = self.selected_position() else {
            return;
        };
        let target = position
            .saturating_add_signed(delta)
            .min(visible.len().saturating_sub(1));
        if let Some((slot, _)) = visible.get(target) {
            self.selected = *slot;
        }
    }

    fn set_status(&mut self, message: impl Into<String>, kind: StatusKind) {
        self.status = Some((message.into(), kind));
    }

    /// Handle one key press. Returns true when the app should exit.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::F(1)) {
                self.show_help = false;
            }
            return false;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Char('c') if ctrl => return true,
            KeyCode::Char('y') if ctrl => self.copy_selected(),
            KeyCode::Char('r') if ctrl => self.reveal = !self.reveal,
            KeyCode::F(1) => self.show_help = true,
            KeyCode::Tab => self.next_focus(),
            KeyCode::BackTab => self.prev_focus(),
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Enter => match self.focus {
                Focus::Search => self.focus = Focus::Row(Field::Key),
                Focus::Row(_) => self.commit_selected(),
            },
            KeyCode::Backspace => self.edit(|text| {
                text.pop();
            }),
            KeyCode::Char(c) if !ctrl => self.edit(|text| text.push(c)),
            _ => {}
        }
        false
    }

    fn next_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Search => Focus::Row(Field::Key),
            Focus::Row(Field::Key) => Focus::Row(Field::Secret),
            Focus::Row(Field::Secret) => Focus::Search,
        };
    }

    fn prev_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Search => Focus::Row(Field::Secret),
            Focus::Row(Field::Secret) => Focus::Row(Field::Key),
            Focus::Row(Field::Key) => Focus::Search,
        };
    }

    /// Apply a text edit to whatever has focus
    fn edit(&mut self, change: impl FnOnce(&mut String)) {
        match self.focus {
            Focus::Search => {
                change(&mut self.search);
                self.select_first_match();
            }
            Focus::Row(field) => {
                let slot = self.selected;
                let Some(entry) = self.session.engine().store().get(slot) else {
                    return;
                };
                let mut text = entry.field(field).to_string();
                change(&mut text);
                self.session.engine_mut().set_field(slot, field, text);
            }
        }
    }

    fn commit_selected(&mut self) {
        let slot = self.selected;
        let position = self.selected_position().unwrap_or(0);

        match self.session.engine_mut().commit(slot) {
            CommitOutcome::Added => {
                self.selected = Slot::Buffer;
                self.focus = Focus::Row(Field::Key);
                self.set_status("Entry added", StatusKind::Info);
            }
            CommitOutcome::Updated { .. } => self.set_status("Entry updated", StatusKind::Info),
            CommitOutcome::Deleted { .. } => {
                // Later entries shifted up; take whichever row now sits there
                let matching = self.matching();
                let position = position.min(matching.len().saturating_sub(1));
                self.selected = matching.get(position).copied().unwrap_or(Slot::Buffer);
                self.set_status("Entry deleted", StatusKind::Info);
            }
            CommitOutcome::Ignored(reason) => self.set_status(reason.as_str(), StatusKind::Info),
        }
    }

    fn copy_selected(&mut self) {
        let slot = self.selected;
        if slot == Slot::Buffer {
            return;
        }
        // Failures are already logged; the user only hears about success
        if copy_key(self.clipboard.as_mut(), self.session.engine().store(), slot) {
            self.set_status("Key copied", StatusKind::Info);
        }
    }

    /// Pick up finished saves
    pub fn tick(&mut self) {
        for report in self.session.drain_reports() {
            let at = report.at.with_timezone(&Local).format("%H:%M:%S");
            match report.outcome {
                SaveOutcome::Saved => self.set_status(format!("Saved {}", at), StatusKind::Info),
                SaveOutcome::Failed(_) => self.set_status(
                    format!("Save failed {} - changes are not on disk", at),
                    StatusKind::Error,
                ),
            }
        }
    }
}

/// Run the TUI until the user quits, then wait for outstanding saves
pub fn run(
    session: Session,
    clipboard: Box<dyn Clipboard>,
    config: &Config,
    rt: &tokio::runtime::Runtime,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, clipboard, config);
    let result = run_app(
        &mut terminal,
        &mut app,
        Duration::from_millis(config.ui.tick_ms),
    );

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let reports = rt.block_on(app.session.flush());
    if reports.iter().any(|r| !r.is_saved()) || app.session.engine().store().is_diverged() {
        eprintln!("warning: Some changes could not be saved; see the log for details");
    }

    result
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.on_key(key) {
                    return Ok(());
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }
    }
}
