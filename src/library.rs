use anyhow::{Context, Result};
use lofty::prelude::*;
use lofty::probe::Probe;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "m4a", "ogg"];

pub fn is_audio(path: &Path) -> bool {
    let ext = path.extension().and_then(OsStr::to_str).unwrap_or_default();
    AUDIO_EXTENSIONS
        .iter()
        .any(|supported| ext.eq_ignore_ascii_case(supported))
}

/// Entries directly inside `dir`, symlinks followed. Only an unreadable `dir`
/// is an error; a broken entry is logged and skipped.
pub fn immediate_entries(dir: &Path) -> Result<Vec<DirEntry>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        match entry {
            Ok(entry) => entries.push(entry),
            Err(err) if err.depth() > 0 => {
                tracing::debug!(error = %err, "skipping unreadable entry");
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to list {}", dir.display()));
            }
        }
    }
    Ok(entries)
}

/// Supported audio files directly inside `folder`, sorted by path.
pub fn build_playlist(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut tracks: Vec<PathBuf> = immediate_entries(folder)?
        .into_iter()
        .filter(|entry| entry.file_type().is_file() && is_audio(entry.path()))
        .map(DirEntry::into_path)
        .collect();
    tracks.sort();
    Ok(tracks)
}

/// Names of the immediate sub-directories of `base`, sorted.
pub fn list_subfolders(base: &Path) -> Result<Vec<String>> {
    let mut folders: Vec<String> = immediate_entries(base)?
        .iter()
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    folders.sort();
    Ok(folders)
}

pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Embedded title tag, if the file has a readable one.
pub fn tag_title(path: &Path) -> Option<String> {
    let tagged = Probe::open(path).ok()?.read().ok()?;
    let tag = tagged.primary_tag().or_else(|| tagged.first_tag())?;
    tag.title()
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Title shown for a playing track: its tag, else the file name.
pub fn media_title(path: &Path) -> String {
    tag_title(path).unwrap_or_else(|| file_label(path))
}
