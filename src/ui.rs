//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{App, PlaybackStatus};
use crate::config::{ControlsSettings, UiSettings};
use crate::remote::ConnectionState;

const CONTROLS: [(&str, &str); 10] = [
    ("j/k", "up/down"),
    ("enter", "play selected"),
    ("space/p", "play/pause"),
    ("h/l", "prev/next song"),
    ("t", "playlist"),
    ("d", "delete selected"),
    ("i", "import drop folder"),
    ("r", "reload"),
    ("esc", "dismiss message"),
    ("q", "quit"),
];

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    let mut parts: Vec<String> = CONTROLS
        .iter()
        .map(|(k, v)| format!("[{}] {}", k, v))
        .collect();
    // Keep scrub next to song navigation.
    parts.insert(4, format!("[H/L] scrub -/+{}s", scrub_seconds));
    parts.join(" | ")
}

/// Format seconds as `MM:SS`. Unknown or negative values render as zero.
pub fn format_clock(secs: f64) -> String {
    let secs = if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    };
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn status_label(status: PlaybackStatus) -> &'static str {
    match status {
        PlaybackStatus::Empty => "Stopped",
        PlaybackStatus::LoadedPaused => "Paused",
        PlaybackStatus::LoadedPlaying => "Playing",
    }
}

fn remote_label(remote: Option<ConnectionState>) -> &'static str {
    match remote {
        None => "REMOTE: off",
        Some(ConnectionState::Disconnected) => "REMOTE: offline",
        Some(ConnectionState::Connecting) => "REMOTE: connecting",
        Some(ConnectionState::Connected) => "REMOTE: connected",
    }
}

fn status_text(app: &App, remote: Option<ConnectionState>) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(format!(" {}", status_label(app.status())));
    match app.current_song() {
        Some(song) => parts.push(format!(
            "Song: {} [{} / {}]",
            song.display(),
            format_clock(app.elapsed),
            format_clock(app.total)
        )),
        None if app.loading => parts.push("Loading library...".to_string()),
        None if !app.has_songs() => parts.push("Library is empty".to_string()),
        None => {}
    }
    parts.push(format!("Songs: {}", app.playlist.len()));
    parts.push(remote_label(remote).to_string());

    parts.join(" • ")
}

/// Compute the visible window of the playlist so the cursor stays centered.
fn visible_window(total: usize, height: usize, selected: usize) -> (usize, usize) {
    if total <= height || height == 0 {
        return (0, total);
    }
    let half = height / 2;
    let mut start = selected.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height)
}

fn draw_playlist(frame: &mut Frame, app: &App, area: Rect) {
    let total = app.playlist.len();
    let (start, end) = visible_window(total, area.height.saturating_sub(2) as usize, app.selected);

    let items: Vec<ListItem> = app.playlist[start..end]
        .iter()
        .enumerate()
        .map(|(offset, song)| {
            let index = start + offset;
            let marker = if app.current == Some(index) { "♪ " } else { "  " };
            let line = format!(
                "{}{} ({})",
                marker,
                song.display(),
                format_clock(song.duration)
            );
            if app.current == Some(index) {
                ListItem::new(line).bold()
            } else {
                ListItem::new(line)
            }
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" playlist "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ratatui::widgets::ListState::default();
    if total > 0 {
        state.select(Some(app.selected - start));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_now_playing(frame: &mut Frame, app: &App, area: Rect) {
    let text = match app.current_song() {
        Some(song) => format!(
            "{}\n{}\n\nAdded: {}",
            song.name,
            song.artist,
            song.added_at
        ),
        None if app.has_songs() => "Press space to start playing.".to_string(),
        None => "Import songs with `handwave import <PATH>`, or press i.".to_string(),
    };
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" now playing "))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
///
/// `remote` is `None` when the remote channel is disabled.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    remote: Option<ConnectionState>,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" handwave ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let mut status = status_text(app, remote);
    if let Some(notice) = &app.notice {
        status.push_str("\n ! ");
        status.push_str(notice);
    }
    let status_par = Paragraph::new(status)
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    let percent = app.progress_percent();
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" progress "))
        .gauge_style(Style::default().add_modifier(Modifier::BOLD))
        .percent(percent.round() as u16)
        .label(format!("{:.0}%", percent));
    frame.render_widget(gauge, chunks[2]);

    if app.show_playlist {
        draw_playlist(frame, app, chunks[3]);
    } else {
        draw_now_playing(frame, app, chunks[3]);
    }

    let footer = Paragraph::new(controls_text(controls_settings.scrub_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}
