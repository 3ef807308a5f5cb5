use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, info};

use crate::app::App;
use crate::audio::{AudioPlayer, PlaybackEngine};
use crate::config;
use crate::library::LibraryStore;
use crate::remote::{ControlCmd, RemoteChannel};
use crate::ui;

use super::commands;

/// Main terminal event loop: drains engine events, draws, then applies
/// queued control commands and key presses. This is the only place session
/// state changes. Returns `Ok(())` once a `Quit` control is applied.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    store: &LibraryStore,
    audio_player: &mut AudioPlayer,
    remote: &RemoteChannel,
    control_tx: &mpsc::Sender<ControlCmd>,
    control_rx: &mpsc::Receiver<ControlCmd>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        for event in audio_player.poll_events() {
            app.handle_engine_event(event, audio_player);
        }

        let remote_state = remote.is_running().then(|| remote.state());
        terminal.draw(|f| ui::draw(f, app, remote_state, &settings.ui, &settings.controls))?;

        // The frame above showed the loading state; do the work now.
        if app.loading {
            if app.load_playlist(store, audio_player).is_ok() {
                info!(songs = app.playlist.len(), "library loaded");
            }
            continue;
        }

        while let Ok(cmd) = control_rx.try_recv() {
            if apply_control(cmd, app, audio_player) {
                audio_player.quit_softly(Duration::from_millis(settings.audio.quit_fade_out_ms));
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                handle_key_event(key, settings, app, store, audio_player, control_tx);
            }
        }
    }
}

/// Apply one queued control to the state machine. Returns true on `Quit`.
pub(super) fn apply_control(
    cmd: ControlCmd,
    app: &mut App,
    engine: &mut impl PlaybackEngine,
) -> bool {
    debug!(?cmd, "control");
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::PlayPause => app.toggle_play_pause(engine),
        ControlCmd::Next => app.play_next(engine),
        ControlCmd::Prev => app.play_previous(engine),
        ControlCmd::ToggleList => app.toggle_playlist(),
    }
    false
}

fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    store: &LibraryStore,
    audio_player: &mut AudioPlayer,
    control_tx: &mpsc::Sender<ControlCmd>,
) {
    // Transport keys go through the same queue as remote commands so both
    // sources are applied in arrival order.
    let queued = match key.code {
        KeyCode::Char('q') => Some(ControlCmd::Quit),
        KeyCode::Char('p') | KeyCode::Char(' ') => Some(ControlCmd::PlayPause),
        KeyCode::Char('l') => Some(ControlCmd::Next),
        KeyCode::Char('h') => Some(ControlCmd::Prev),
        KeyCode::Char('t') => Some(ControlCmd::ToggleList),
        _ => None,
    };
    if let Some(cmd) = queued {
        let _ = control_tx.send(cmd);
        return;
    }

    let scrub = settings.controls.scrub_seconds.min(i32::MAX as u64) as i32;
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::Enter => app.play_selected(audio_player),
        KeyCode::Char('L') => app.seek_by(scrub, audio_player),
        KeyCode::Char('H') => app.seek_by(-scrub, audio_player),
        KeyCode::Char('d') => {
            if let Some(id) = app.selected_song().map(|s| s.id) {
                let _ = app.remove_song(id, store, audio_player);
            }
        }
        KeyCode::Char('r') => app.request_reload(),
        KeyCode::Char('i') => import_drop_folder(settings, app, store),
        KeyCode::Esc => app.clear_notice(),
        _ => {}
    }
}

/// Import whatever sits in the configured drop folder into the running
/// player. The outcome is reported through the notice line.
pub(super) fn import_drop_folder(
    settings: &config::Settings,
    app: &mut App,
    store: &LibraryStore,
) {
    let Some(dir) = settings.import_dir() else {
        app.set_notice("No import folder configured");
        return;
    };
    if !dir.is_dir() {
        app.set_notice(format!("Nothing to import: {} is not a folder", dir.display()));
        return;
    }

    // A storage failure has already been put on the notice line.
    if let Ok(summary) = commands::import_paths(&[dir], settings, app, store) {
        info!(imported = summary.imported, skipped = summary.skipped, "drop folder imported");
        app.set_notice(format!(
            "Imported {} song(s), skipped {}",
            summary.imported, summary.skipped
        ));
    }
}
