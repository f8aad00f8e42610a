//! UI rendering

use passdeck::{Field, Slot, SyncState};
use passdeck_core::format;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use crate::app::{App, Focus, StatusKind};

/// Main draw function
pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Search
            Constraint::Min(0),    // Entries
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_search(f, app, chunks[1]);
    draw_entries(f, app, chunks[2]);
    draw_footer(f, app, chunks[3]);

    if app.show_help {
        draw_help_overlay(f);
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let store = app.session.engine().store();

    let location = match app.session.location() {
        Some(path) => Span::styled(
            path.display().to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        None => Span::styled("no storage", Style::default().fg(Color::Red)),
    };

    let mut spans = vec![
        Span::styled(" Passdeck ", Style::default().fg(Color::Cyan).bold()),
        Span::raw(format!(" {} entries - ", store.len())),
        location,
    ];
    if store.is_diverged() {
        spans.push(Span::styled(
            "  [UNSAVED CHANGES]",
            Style::default().fg(Color::Red).bold(),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn draw_search(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Search;
    let border_color = if focused { Color::Yellow } else { Color::Blue };

    let text = if app.search.is_empty() && !focused {
        Line::from(Span::styled("Search...", Style::default().fg(Color::DarkGray)))
    } else {
        Line::from(with_cursor(&app.search, focused))
    };

    let search = Paragraph::new(text).block(
        Block::default()
            .title(" Search ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color)),
    );

    f.render_widget(search, area);
}

fn draw_entries(f: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec!["#", "Key", "Secret", ""])
        .style(Style::default().fg(Color::Cyan).bold())
        .bottom_margin(1);

    // Borders=2, header=2
    let height = area.height.saturating_sub(4) as usize;
    let position = app.selected_position().unwrap_or(0);
    let offset = if height == 0 {
        position
    } else {
        position.saturating_sub(height - 1)
    };

    let key_width = (area.width.saturating_sub(14) / 2).max(10) as usize;
    let store = app.session.engine().store();

    let visible = app.visible();
    let rows: Vec<Row> = visible
        .iter()
        .skip(offset)
        .take(height.max(1))
        .map(|(slot, entry)| {
            let selected = *slot == app.selected;
            let editing = |field| selected && app.focus == Focus::Row(field);

            let key_cell = if entry.key.is_empty() && !editing(Field::Key) {
                placeholder(*slot, "New key")
            } else {
                Cell::from(with_cursor(
                    &format::truncate(&entry.key, key_width),
                    editing(Field::Key),
                ))
            };

            let shown_secret = if app.secrets_hidden() {
                format::mask(&entry.secret)
            } else {
                format::truncate(&entry.secret, key_width)
            };
            let secret_cell = if entry.secret.is_empty() && !editing(Field::Secret) {
                placeholder(*slot, "Secret")
            } else {
                Cell::from(with_cursor(&shown_secret, editing(Field::Secret)))
            };

            let (marker, marker_color) = match store.sync_state(*slot) {
                Some(SyncState::Pending) => ("…", Color::Yellow),
                Some(SyncState::Unsynced) => ("!", Color::Red),
                _ => ("", Color::Reset),
            };

            let number = match slot {
                Slot::Buffer => "+".to_string(),
                Slot::Entry(_) => slot.row().to_string(),
            };

            let row = Row::new(vec![
                Cell::from(number).style(Style::default().fg(Color::DarkGray)),
                key_cell,
                secret_cell,
                Cell::from(marker).style(Style::default().fg(marker_color)),
            ]);

            if selected {
                row.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                row
            }
        })
        .collect();

    let title = if app.search.is_empty() {
        " Entries ".to_string()
    } else {
        format!(" Entries ({} matching) ", visible.len())
    };

    let border_color = if matches!(app.focus, Focus::Row(_)) {
        Color::Yellow
    } else {
        Color::Magenta
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),      // Row number
            Constraint::Percentage(45), // Key
            Constraint::Min(10),        // Secret
            Constraint::Length(2),      // Sync marker
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(title)
            .title_style(Style::default().fg(Color::Magenta).bold())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color)),
    );

    f.render_widget(table, area);
}

fn placeholder(slot: Slot, text: &str) -> Cell<'static> {
    // Only the buffer row advertises what goes where
    let text = if slot == Slot::Buffer { text } else { "" };
    Cell::from(text.to_string()).style(Style::default().fg(Color::DarkGray))
}

fn with_cursor(text: &str, focused: bool) -> String {
    if focused {
        format!("{}▏", text)
    } else {
        text.to_string()
    }
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    if let Some((message, kind)) = &app.status {
        let color = match kind {
            StatusKind::Info => Color::Green,
            StatusKind::Error => Color::Red,
        };
        let footer = Paragraph::new(Line::from(Span::styled(
            format!(" {}", message),
            Style::default().fg(color),
        )));
        f.render_widget(footer, area);
        return;
    }

    let help = Line::from(vec![
        Span::styled(" Enter", Style::default().fg(Color::Cyan).bold()),
        Span::raw(" save row  "),
        Span::styled("Tab", Style::default().fg(Color::Cyan).bold()),
        Span::raw(" next field  "),
        Span::styled("^Y", Style::default().fg(Color::Cyan).bold()),
        Span::raw(" copy key  "),
        Span::styled("^R", Style::default().fg(Color::Cyan).bold()),
        Span::raw(" reveal  "),
        Span::styled("F1", Style::default().fg(Color::Cyan).bold()),
        Span::raw(" help  "),
        Span::styled("Esc", Style::default().fg(Color::Cyan).bold()),
        Span::raw(" quit"),
    ]);

    let footer = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, area);
}

fn draw_help_overlay(f: &mut Frame) {
    let area = f.area();

    let popup_width = 56;
    let popup_height = 15;
    let x = (area.width.saturating_sub(popup_width)) / 2;
    let y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(
        x,
        y,
        popup_width.min(area.width),
        popup_height.min(area.height),
    );

    f.render_widget(Clear, popup_area);

    let binding = |keys: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(keys, Style::default().fg(Color::Cyan)),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        Line::from(""),
        binding("  Enter      ", "Save the selected row"),
        binding("  Tab        ", "Search / key / secret"),
        binding("  Up/Down    ", "Select row"),
        binding("  Ctrl+Y     ", "Copy the key of the selected row"),
        binding("  Ctrl+R     ", "Reveal or hide secrets"),
        binding("  Esc        ", "Quit"),
        Line::from(""),
        Line::from(" Row + is the new entry: fill both fields and press"),
        Line::from(" Enter. Clear both fields of a row and press Enter"),
        Line::from(" to delete it."),
        Line::from(""),
        Line::from(Span::styled(
            "Press F1 or Esc to close",
            Style::default().fg(Color::DarkGray),
        ))
        .centered(),
    ];

    let help_popup = Paragraph::new(help_text).block(
        Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(Style::default().fg(Color::Yellow).bold())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );

    f.render_widget(help_popup, popup_area);
}
