//! Turn audio files on disk into unsaved songs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::{NewSong, now_millis};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("not a playable audio file {path}: {source}")]
    NotAudio {
        path: PathBuf,
        source: lofty::error::LoftyError,
    },
}

pub(crate) fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            settings
                .extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
                .any(|e| !e.is_empty() && e == ext)
        })
        .unwrap_or(false)
}

/// Expand `paths` into the audio files to import: files are taken as given,
/// directories are walked and filtered by the configured extensions.
pub fn collect_audio_files(paths: &[PathBuf], settings: &LibrarySettings) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(settings.follow_links)
                .into_iter()
                .filter_map(Result::ok)
                .map(|e| e.into_path())
                .filter(|p| p.is_file() && is_audio_file(p, settings))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    files
}

/// Read `path` into a `NewSong` stamped with the current time.
///
/// The name comes from the title tag, falling back to the file stem; the
/// artist falls back to `default_artist`. Files lofty cannot read are
/// rejected so that nothing undecodable reaches the store.
pub fn read_song(path: &Path, default_artist: &str) -> Result<NewSong, ImportError> {
    let tagged = lofty::read_from_path(path).map_err(|source| ImportError::NotAudio {
        path: path.to_path_buf(),
        source,
    })?;
    let bytes = std::fs::read(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();
    let mut artist = default_artist.to_string();

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        if let Some(title) = tag.title() {
            if !title.trim().is_empty() {
                name = title.trim().to_string();
            }
        }
        if let Some(a) = tag.artist() {
            if !a.trim().is_empty() {
                artist = a.trim().to_string();
            }
        }
    }

    Ok(NewSong {
        name,
        artist,
        audio: Arc::from(bytes),
        duration: tagged.properties().duration().as_secs_f64(),
        added_at: now_millis(),
    })
}
