use crate::audio::MediaEngine;
use crate::browser::DirectoryPicker;
use crate::config::{self, ConfigStore};
use crate::input::Command;
use crate::library;
use crate::menu::MenuState;
use crate::model::{AddPathOutcome, Config};
use crate::screen::Screen;
use crate::session::{POLL_INTERVAL, PlaybackSession};
use anyhow::Result;
use std::path::{Path, PathBuf};

pub const ADD_PATH_ITEM: &str = "[ Add New Path ]";
const BASE_PATH_TITLE: &str = "Select Music Base Path";
const BASE_PATH_HELP: &str = "↑/↓: Select | Enter: Open | q: Exit";
const FOLDER_HELP: &str = "↑/↓: Select | Enter: Open | q: Back";

/// Builds a media engine for the configured audio backend.
pub type EngineFactory<'a> = Box<dyn FnMut(&str) -> Result<Box<dyn MediaEngine>> + 'a>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavState {
    SelectBasePath,
    AddPath,
    SelectFolder(PathBuf),
    Playing(PathBuf),
    Exit,
}

/// Top-level state machine: base path, then folder, then playback, and back.
pub struct Navigator<'a> {
    screen: &'a mut dyn Screen,
    store: &'a ConfigStore,
    config: Config,
    engines: EngineFactory<'a>,
    picker: Box<dyn DirectoryPicker + 'a>,
}

impl<'a> Navigator<'a> {
    pub fn new(
        screen: &'a mut dyn Screen,
        store: &'a ConfigStore,
        config: Config,
        engines: EngineFactory<'a>,
        picker: Box<dyn DirectoryPicker + 'a>,
    ) -> Self {
        Self {
            screen,
            store,
            config,
            engines,
            picker,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs until the user cancels the base path menu.
    pub fn run(&mut self) -> Result<()> {
        let mut state = NavState::SelectBasePath;
        while state != NavState::Exit {
            tracing::debug!(?state, "entering navigation state");
            state = self.step(state)?;
        }
        Ok(())
    }

    pub fn step(&mut self, state: NavState) -> Result<NavState> {
        match state {
            NavState::SelectBasePath => self.select_base_path(),
            NavState::AddPath => self.add_path(),
            NavState::SelectFolder(base) => self.select_folder(&base),
            NavState::Playing(folder) => self.play(&folder),
            NavState::Exit => Ok(NavState::Exit),
        }
    }

    fn select_base_path(&mut self) -> Result<NavState> {
        let mut items: Vec<String> = self
            .config
            .base_paths
            .iter()
            .map(|path| path.display().to_string())
            .collect();
        items.push(String::from(ADD_PATH_ITEM));
        let mut menu = MenuState::new(items);

        let Some(choice) = run_menu(&mut *self.screen, &mut menu, BASE_PATH_TITLE, BASE_PATH_HELP)?
        else {
            return Ok(NavState::Exit);
        };
        Ok(match self.config.base_paths.get(choice) {
            Some(base) => NavState::SelectFolder(base.clone()),
            None => NavState::AddPath,
        })
    }

    fn add_path(&mut self) -> Result<NavState> {
        let hint = config::home_dir().unwrap_or_else(|| PathBuf::from("/"));
        let picked = match self.picker.choose_directory(&mut *self.screen, &hint) {
            Ok(picked) => picked,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "directory picker failed");
                self.screen
                    .show_message(&format!("Directory picker failed: {err:#}"))?;
                return Ok(NavState::SelectBasePath);
            }
        };
        let Some(picked) = picked else {
            self.screen.show_message("Path addition cancelled.")?;
            return Ok(NavState::SelectBasePath);
        };

        let path = config::normalize_path(&picked);
        match self.config.add_base_path(&path) {
            AddPathOutcome::Added => {
                if let Err(err) = self.store.save_config(&self.config) {
                    tracing::warn!(error = %format!("{err:#}"), "failed to save config");
                }
                tracing::info!(path = %path.display(), "base path added");
                self.screen.show_message(&format!(
                    "Path '{}' successfully saved.",
                    path.display()
                ))?;
                Ok(NavState::SelectFolder(path))
            }
            AddPathOutcome::AlreadyKnown | AddPathOutcome::NotADirectory => {
                self.screen.show_message(&format!(
                    "Error: Path '{}' is invalid or already exists.",
                    path.display()
                ))?;
                Ok(NavState::SelectBasePath)
            }
        }
    }

    fn select_folder(&mut self, base: &Path) -> Result<NavState> {
        let folders = match library::list_subfolders(base) {
            Ok(folders) => folders,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "failed to list base path");
                Vec::new()
            }
        };
        if folders.is_empty() {
            self.screen.show_message(&format!(
                "No sub-folders found in {}.",
                base.display()
            ))?;
            return Ok(NavState::SelectBasePath);
        }

        let title = format!("Select Folder in {}", library::file_label(base));
        let mut menu = MenuState::new(folders);
        let Some(choice) = run_menu(&mut *self.screen, &mut menu, &title, FOLDER_HELP)? else {
            return Ok(NavState::SelectBasePath);
        };
        Ok(match menu.items.get(choice) {
            Some(name) => NavState::Playing(base.join(name)),
            None => NavState::SelectBasePath,
        })
    }

    fn play(&mut self, folder: &Path) -> Result<NavState> {
        let playlist = match library::build_playlist(folder) {
            Ok(playlist) => playlist,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "failed to read folder");
                Vec::new()
            }
        };
        if playlist.is_empty() {
            self.screen
                .show_message("No audio files found in this folder.")?;
            return Ok(NavState::SelectBasePath);
        }

        let engine = match (self.engines)(&self.config.audio_backend) {
            Ok(engine) => engine,
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "audio engine unavailable");
                self.screen
                    .show_message(&format!("Audio engine failed: {err:#}"))?;
                return Ok(NavState::SelectBasePath);
            }
        };

        let registry = self.store.load_seen_songs();
        let mut session =
            match PlaybackSession::start(folder, playlist, registry, engine, &self.config) {
                Ok(session) => session,
                Err(err) => {
                    self.screen
                        .show_message(&format!("Playback failed: {err:#}"))?;
                    return Ok(NavState::SelectBasePath);
                }
            };
        session.run(&mut *self.screen, &mut self.config, self.store)?;
        Ok(NavState::SelectBasePath)
    }
}

/// Shows `menu` until the user confirms an item or backs out.
///
/// Selection wraps at both ends.
pub fn run_menu(
    screen: &mut dyn Screen,
    menu: &mut MenuState,
    title: &str,
    help: &str,
) -> Result<Option<usize>> {
    loop {
        let (_, rows) = screen.size()?;
        menu.scroll_into_view(MenuState::viewport_height(rows));
        screen.draw_menu(&menu.view(title, help))?;

        match screen.poll_command(POLL_INTERVAL)? {
            Some(Command::Up) => menu.select_prev(),
            Some(Command::Down) => menu.select_next(),
            Some(Command::Confirm) if !menu.items.is_empty() => return Ok(Some(menu.selected)),
            Some(Command::Quit) => return Ok(None),
            _ => {}
        }
    }
}
