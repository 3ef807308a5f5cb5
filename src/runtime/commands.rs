//! Library import shared with the player, and the non-interactive subcommands.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::app::App;
use crate::config::Settings;
use crate::library::{LibraryStore, SongId, StorageError, collect_audio_files, read_song};
use crate::ui::format_clock;

#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Import every audio file under `paths` into `store` and `app`.
///
/// Unreadable or unplayable files are logged and skipped. A storage failure
/// aborts the run, since every following write would fail too.
pub(super) fn import_paths(
    paths: &[PathBuf],
    settings: &Settings,
    app: &mut App,
    store: &LibraryStore,
) -> Result<ImportSummary, StorageError> {
    let files = collect_audio_files(paths, &settings.library);
    debug!(files = files.len(), "collected files to import");

    let mut summary = ImportSummary::default();
    for path in &files {
        match read_song(path, &settings.library.default_artist) {
            Ok(song) => {
                app.import_song(song, store)?;
                summary.imported += 1;
            }
            Err(e) => {
                summary.skipped += 1;
                warn!("skipping: {e}");
            }
        }
    }
    Ok(summary)
}

pub fn import(
    paths: &[PathBuf],
    settings: &Settings,
    store: &LibraryStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::new(false);
    let summary = import_paths(paths, settings, &mut app, store)?;
    for song in &app.playlist {
        println!("{:>5}  {}", song.id, song.display());
    }
    println!(
        "imported {} song(s), skipped {}",
        summary.imported, summary.skipped
    );
    Ok(())
}

pub fn list(store: &LibraryStore) -> Result<(), Box<dyn std::error::Error>> {
    let songs = store.list()?;
    for song in &songs {
        println!(
            "{:>5}  {:>14}  {}  {}",
            song.id,
            song.added_at,
            format_clock(song.duration),
            song.display()
        );
    }
    println!("{} song(s)", store.count()?);
    Ok(())
}

/// Delete a song. Removing an unknown id succeeds and says so.
pub fn remove(id: SongId, store: &LibraryStore) -> Result<(), Box<dyn std::error::Error>> {
    let existing = store.get_by_id(id)?;
    store.delete_by_id(id)?;
    match existing {
        Some(song) => println!("removed {}  {}", id, song.display()),
        None => println!("no song with id {id}"),
    }
    Ok(())
}

pub fn print_config(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", toml::to_string_pretty(settings)?);
    Ok(())
}
