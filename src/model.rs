use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub const MAX_VOLUME: u16 = 150;
pub const VOLUME_STEP: u16 = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub base_paths: Vec<PathBuf>,
    #[serde(default = "default_volume")]
    pub volume: u16,
    #[serde(default = "default_audio_backend")]
    pub audio_backend: String,
    #[serde(default = "default_cava_enabled")]
    pub cava_enabled: bool,
    #[serde(default)]
    pub background_app: Option<PathBuf>,
    #[serde(default)]
    pub directory_picker: Option<String>,
}

fn default_volume() -> u16 {
    50
}

fn default_audio_backend() -> String {
    String::from("auto")
}

fn default_cava_enabled() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_paths: Vec::new(),
            volume: default_volume(),
            audio_backend: default_audio_backend(),
            cava_enabled: default_cava_enabled(),
            background_app: None,
            directory_picker: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddPathOutcome {
    Added,
    AlreadyKnown,
    NotADirectory,
}

impl Config {
    /// Sorts and dedups base paths and clamps the volume.
    pub fn normalize(&mut self) {
        self.base_paths.sort();
        self.base_paths.dedup();
        self.volume = self.volume.min(MAX_VOLUME);
    }

    pub fn add_base_path(&mut self, path: &Path) -> AddPathOutcome {
        if !path.is_dir() {
            return AddPathOutcome::NotADirectory;
        }
        if self.base_paths.iter().any(|known| known == path) {
            return AddPathOutcome::AlreadyKnown;
        }
        self.base_paths.push(path.to_path_buf());
        self.normalize();
        AddPathOutcome::Added
    }

    /// Program launched by the visualizer key, if the visualizer is enabled.
    pub fn visualizer_program(&self) -> Option<PathBuf> {
        if !self.cava_enabled {
            return None;
        }
        Some(
            self.background_app
                .clone()
                .unwrap_or_else(|| PathBuf::from("cava")),
        )
    }
}

/// Folder path -> file name -> RFC 3339 first-seen timestamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SeenSongs {
    pub folders: BTreeMap<String, BTreeMap<String, String>>,
}

impl SeenSongs {
    /// Records every file of `playlist` under `folder` and returns the playlist
    /// indices that were not seen on an earlier visit.
    ///
    /// A folder visited for the first time is recorded in full and reports
    /// nothing as new.
    pub fn register_folder(
        &mut self,
        folder: &Path,
        playlist: &[PathBuf],
        now: &str,
    ) -> BTreeSet<usize> {
        let key = folder.to_string_lossy().to_string();
        let first_visit = !self.folders.contains_key(&key);
        let seen = self.folders.entry(key).or_default();

        let mut fresh = BTreeSet::new();
        for (idx, path) in playlist.iter().enumerate() {
            let Some(name) = path.file_name() else {
                continue;
            };
            let name = name.to_string_lossy().to_string();
            if seen.contains_key(&name) {
                continue;
            }
            seen.insert(name, now.to_string());
            if !first_visit {
                fresh.insert(idx);
            }
        }
        fresh
    }

    pub fn first_seen(&self, folder: &Path, file_name: &str) -> Option<&str> {
        self.folders
            .get(folder.to_string_lossy().as_ref())
            .and_then(|files| files.get(file_name))
            .map(String::as_str)
    }
}
