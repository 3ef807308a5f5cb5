use super::commands::{ImportSummary, import_paths};
use super::event_loop::{apply_control, import_drop_folder};
use super::*;
use crate::audio::PlaybackEngine;
use crate::library::{NewSong, Song};
use std::path::Path;
use std::sync::Arc;

#[derive(Default)]
struct CountingEngine {
    loads: usize,
    plays: usize,
    pauses: usize,
}

impl PlaybackEngine for CountingEngine {
    fn load(&mut self, _audio: Arc<[u8]>) {
        self.loads += 1;
    }
    fn play(&mut self) {
        self.plays += 1;
    }
    fn pause(&mut self) {
        self.pauses += 1;
    }
    fn seek_by(&mut self, _seconds: i32) {}
    fn stop(&mut self) {}
}

fn app_with_two_songs() -> App {
    let mut app = App::new(false);
    for (id, name) in [(1, "a"), (2, "b")] {
        app.add_song(Song::with_id(
            id,
            NewSong {
                name: name.to_string(),
                artist: String::new(),
                audio: Arc::from(name.as_bytes()),
                duration: 1.0,
                added_at: id,
            },
        ));
    }
    app
}

#[test]
fn controls_drive_the_state_machine() {
    let mut app = app_with_two_songs();
    let mut engine = CountingEngine::default();

    assert!(!apply_control(ControlCmd::PlayPause, &mut app, &mut engine));
    assert_eq!(app.current, Some(0));
    assert!(!apply_control(ControlCmd::Next, &mut app, &mut engine));
    assert_eq!(app.current, Some(1));
    assert!(!apply_control(ControlCmd::Prev, &mut app, &mut engine));
    assert_eq!(app.current, Some(0));
    assert!(!apply_control(ControlCmd::PlayPause, &mut app, &mut engine));
    assert!(!app.playing);
    assert!(!apply_control(ControlCmd::ToggleList, &mut app, &mut engine));
    assert!(app.show_playlist);

    assert_eq!(engine.loads, 3);
    assert_eq!(engine.plays, 3);
    assert_eq!(engine.pauses, 1);
}

#[test]
fn quit_control_requests_shutdown_without_touching_state() {
    let mut app = app_with_two_songs();
    let mut engine = CountingEngine::default();
    assert!(apply_control(ControlCmd::Quit, &mut app, &mut engine));
    assert_eq!(app.current, None);
    assert_eq!(engine.loads, 0);
}

#[test]
fn cli_without_subcommand_runs_the_player() {
    let cli = Cli::try_parse_from(["handwave"]).unwrap();
    assert!(cli.command.is_none());
    assert!(!cli.no_remote);
}

#[test]
fn cli_parses_subcommands() {
    let cli = Cli::try_parse_from(["handwave", "import", "a.mp3", "music"]).unwrap();
    assert_eq!(
        cli.command,
        Some(Command::Import {
            paths: vec![PathBuf::from("a.mp3"), PathBuf::from("music")]
        })
    );

    let cli = Cli::try_parse_from(["handwave", "remove", "7"]).unwrap();
    assert_eq!(cli.command, Some(Command::Remove { id: 7 }));

    assert!(Cli::try_parse_from(["handwave", "import"]).is_err());
    assert!(Cli::try_parse_from(["handwave", "remove", "seven"]).is_err());
}

#[test]
fn cli_overrides_settings() {
    let cli = Cli::try_parse_from([
        "handwave",
        "--endpoint",
        "ws://10.0.0.2:9000",
        "--no-remote",
        "list",
        "--database",
        "/tmp/songs.db",
    ])
    .unwrap();
    let mut settings = Settings::default();
    cli.apply_overrides(&mut settings);

    assert_eq!(settings.remote.endpoint, "ws://10.0.0.2:9000");
    assert!(!settings.remote.enabled);
    assert_eq!(
        settings.library.database_path,
        Some(PathBuf::from("/tmp/songs.db"))
    );
}

#[test]
fn cli_leaves_settings_alone_without_flags() {
    let cli = Cli::try_parse_from(["handwave", "config"]).unwrap();
    let mut settings = Settings::default();
    let before = settings.remote.endpoint.clone();
    cli.apply_overrides(&mut settings);
    assert!(settings.remote.enabled);
    assert_eq!(settings.remote.endpoint, before);
    assert!(settings.library.database_path.is_none());
}

/// One second of 8 kHz mono 16-bit silence.
fn write_wav(path: &Path) {
    let data = vec![0u8; 16_000];
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&8_000u32.to_le_bytes());
    bytes.extend_from_slice(&16_000u32.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&data);
    std::fs::write(path, bytes).unwrap();
}

fn drop_folder() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_wav(&dir.path().join("song.wav"));
    std::fs::write(dir.path().join("broken.wav"), b"not audio").unwrap();
    std::fs::write(dir.path().join("cover.txt"), b"ignored").unwrap();
    dir
}

fn store_in(dir: &Path) -> LibraryStore {
    LibraryStore::open(&dir.join("library.db")).unwrap()
}

#[test]
fn import_paths_adds_songs_to_store_and_playlist() {
    let folder = drop_folder();
    let db = tempfile::tempdir().unwrap();
    let store = store_in(db.path());
    let mut app = App::new(false);

    let summary = import_paths(
        &[folder.path().to_path_buf()],
        &Settings::default(),
        &mut app,
        &store,
    )
    .unwrap();

    assert_eq!(summary, ImportSummary { imported: 1, skipped: 1 });
    assert_eq!(store.count().unwrap(), 1);
    assert_eq!(app.playlist.len(), 1);
    assert_eq!(app.playlist[0].name, "song");
    assert_eq!(app.playlist[0].artist, "Unknown Artist");
    assert!(app.playlist[0].duration > 0.0);
    assert_eq!(store.list().unwrap()[0].id, app.playlist[0].id);
    assert_eq!(app.current, None);
}

#[test]
fn import_paths_stops_on_storage_failure() {
    let folder = drop_folder();
    let db = tempfile::tempdir().unwrap();
    let store = store_in(db.path());
    store.connection().execute_batch("DROP TABLE songs").unwrap();
    let mut app = App::new(false);

    let result = import_paths(
        &[folder.path().to_path_buf()],
        &Settings::default(),
        &mut app,
        &store,
    );

    assert!(result.is_err());
    assert!(app.playlist.is_empty());
    assert!(app.notice.as_deref().unwrap().starts_with("Could not save song"));
}

#[test]
fn drop_folder_import_reaches_the_running_player() {
    let folder = drop_folder();
    let db = tempfile::tempdir().unwrap();
    let store = store_in(db.path());
    let mut settings = Settings::default();
    settings.library.import_dir = Some(folder.path().to_path_buf());
    let mut app = app_with_two_songs();

    import_drop_folder(&settings, &mut app, &store);

    assert_eq!(app.playlist.len(), 3);
    assert_eq!(app.playlist[2].name, "song");
    assert_eq!(app.notice.as_deref(), Some("Imported 1 song(s), skipped 1"));
}

#[test]
fn drop_folder_import_reports_a_missing_folder() {
    let db = tempfile::tempdir().unwrap();
    let store = store_in(db.path());
    let mut settings = Settings::default();
    settings.library.import_dir = Some(db.path().join("nope"));
    let mut app = App::new(false);

    import_drop_folder(&settings, &mut app, &store);

    assert!(app.playlist.is_empty());
    assert!(app.notice.as_deref().unwrap().starts_with("Nothing to import"));
    assert_eq!(store.count().unwrap(), 0);
}
