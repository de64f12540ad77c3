use crate::model::{Config, SeenSongs};
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const APP_DIR: &str = "foldertune";
const CONFIG_FILE: &str = "config.json";
const SEEN_SONGS_FILE: &str = "seen_songs.json";

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var("FOLDERTUNE_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let home = home_dir().context("neither HOME nor USERPROFILE is set")?;
    Ok(home.join(".config").join(APP_DIR))
}

pub fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}

/// On-disk home of the config and seen-songs files.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    root: PathBuf,
}

impl ConfigStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(config_root()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn seen_songs_path(&self) -> PathBuf {
        self.root.join(SEEN_SONGS_FILE)
    }

    pub fn ensure_dir(&self) -> Result<&Path> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;
        Ok(&self.root)
    }

    /// Loads the config, replacing a missing or unreadable file with defaults.
    ///
    /// Base paths that are no longer directories are dropped from the result.
    pub fn load_config(&self) -> Config {
        let path = self.config_path();
        let mut config = if path.exists() {
            match read_config(&path) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(error = %format!("{err:#}"), "config unreadable, using defaults");
                    self.write_defaults()
                }
            }
        } else {
            self.write_defaults()
        };

        config.base_paths.retain(|base| base.is_dir());
        config.normalize();
        config
    }

    fn write_defaults(&self) -> Config {
        let config = Config::default();
        if let Err(err) = self.save_config(&config) {
            tracing::warn!(error = %format!("{err:#}"), "failed to write default config");
        }
        config
    }

    pub fn save_config(&self, config: &Config) -> Result<()> {
        self.ensure_dir()?;
        let mut normalized = config.clone();
        normalized.normalize();
        let path = self.config_path();
        let json = serde_json::to_string_pretty(&normalized)?;
        fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn load_seen_songs(&self) -> SeenSongs {
        let path = self.seen_songs_path();
        if !path.exists() {
            return SeenSongs::default();
        }

        let parsed = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))
            .and_then(|raw| {
                serde_json::from_str(&raw)
                    .with_context(|| format!("failed to parse {}", path.display()))
            });
        match parsed {
            Ok(seen) => seen,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "seen-songs registry unreadable, starting empty");
                SeenSongs::default()
            }
        }
    }

    pub fn save_seen_songs(&self, seen: &SeenSongs) -> Result<()> {
        self.ensure_dir()?;
        let path = self.seen_songs_path();
        if path.exists() {
            let backup = path.with_extension("json.bak");
            let _ = fs::copy(&path, &backup);
        }
        let json = serde_json::to_string_pretty(seen)?;
        fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

fn read_config(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: Config = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(config)
}

pub fn now_timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(&Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

pub fn normalize_path(path: &Path) -> PathBuf {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    strip_windows_verbatim_prefix(&canonical)
}

pub fn strip_windows_verbatim_prefix(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();

    if let Some(trimmed) = raw.strip_prefix(r"\\?\UNC\") {
        return PathBuf::from(format!(r"\\{trimmed}"));
    }

    if let Some(trimmed) = raw.strip_prefix(r"\\?\") {
        return PathBuf::from(trimmed);
    }

    path.to_path_buf()
}
