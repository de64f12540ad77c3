use crate::audio::MediaEngine;
use crate::config::{self, ConfigStore};
use crate::input::Command;
use crate::library;
use crate::menu;
use crate::model::{Config, MAX_VOLUME, SeenSongs, VOLUME_STEP};
use crate::screen::Screen;
use crate::text::{self, FrameClock, Marquee};
use crate::ui;
use anyhow::Result;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use std::time::Duration;

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Consecutive input failures after which the session gives up on the terminal.
pub const MAX_INPUT_FAILURES: usize = 10;

const NEW_MARK: char = '*';
const PLAYING_MARK: char = '>';
const NOTHING_PLAYING: &str = "Nothing playing";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistRow {
    pub text: String,
    pub selected: bool,
}

/// One rendered player frame, ready for [`ui::draw_player`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerView {
    pub now_playing: String,
    pub progress: String,
    pub paused: bool,
    pub locked: bool,
    pub rows: Vec<PlaylistRow>,
    pub volume: String,
    pub help: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Plays one folder until the user quits.
pub struct PlaybackSession {
    folder: PathBuf,
    playlist: Vec<PathBuf>,
    names: Vec<String>,
    new_songs: BTreeSet<usize>,
    registry: SeenSongs,
    engine: Box<dyn MediaEngine>,
    visualizer: Option<PathBuf>,
    cursor: usize,
    scroll_offset: usize,
    now_playing: Marquee,
    selected: Marquee,
    clock: FrameClock,
    last_playing: Option<usize>,
    last_cursor: usize,
}

impl PlaybackSession {
    /// Registers the folder's files in `registry`, queues the whole playlist on
    /// `engine` and starts the first track.
    pub fn start(
        folder: &Path,
        playlist: Vec<PathBuf>,
        mut registry: SeenSongs,
        mut engine: Box<dyn MediaEngine>,
        config: &Config,
    ) -> Result<Self> {
        if playlist.is_empty() {
            anyhow::bail!("no audio files in {}", folder.display());
        }

        let new_songs = registry.register_folder(folder, &playlist, &config::now_timestamp());
        tracing::info!(
            folder = %folder.display(),
            tracks = playlist.len(),
            new = new_songs.len(),
            "starting playback session"
        );

        for track in &playlist {
            engine.append(track);
        }
        engine.set_volume(config.volume);
        engine.set_loop_playlist(true);
        engine.set_paused(false);
        if let Err(err) = engine.set_playlist_pos(0) {
            tracing::warn!(error = %format!("{err:#}"), "first track failed to start");
        }

        let names = playlist.iter().map(|path| library::file_label(path)).collect();
        Ok(Self {
            folder: folder.to_path_buf(),
            playlist,
            names,
            new_songs,
            registry,
            engine,
            visualizer: config.visualizer_program(),
            cursor: 0,
            scroll_offset: 0,
            now_playing: Marquee::default(),
            selected: Marquee::default(),
            clock: FrameClock::default(),
            last_playing: None,
            last_cursor: 0,
        })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn playlist(&self) -> &[PathBuf] {
        &self.playlist
    }

    pub fn new_songs(&self) -> &BTreeSet<usize> {
        &self.new_songs
    }

    pub fn registry(&self) -> &SeenSongs {
        &self.registry
    }

    pub fn engine(&self) -> &dyn MediaEngine {
        self.engine.as_ref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Draws and polls until the user quits. A failed frame is logged and the
    /// loop keeps going. Input failures back off for one poll interval and end
    /// the session once [`MAX_INPUT_FAILURES`] happen in a row.
    pub fn run(
        &mut self,
        screen: &mut dyn Screen,
        config: &mut Config,
        store: &ConfigStore,
    ) -> Result<()> {
        let mut input_failures = 0;
        loop {
            if let Err(err) = self.render(screen) {
                tracing::error!(error = %format!("{err:#}"), "player frame failed");
            }

            let command = match screen.poll_command(POLL_INTERVAL) {
                Ok(command) => {
                    input_failures = 0;
                    command
                }
                Err(err) => {
                    input_failures += 1;
                    tracing::error!(
                        error = %format!("{err:#}"),
                        attempt = input_failures,
                        "input poll failed"
                    );
                    if input_failures >= MAX_INPUT_FAILURES {
                        self.engine.stop();
                        return Err(err.context("terminal input is unavailable"));
                    }
                    thread::sleep(POLL_INTERVAL);
                    continue;
                }
            };
            if let Some(command) = command
                && self.handle(command, screen, config, store)? == Flow::Quit
            {
                return Ok(());
            }
        }
    }

    fn render(&mut self, screen: &mut dyn Screen) -> Result<()> {
        self.engine.tick();
        let (cols, rows) = screen.size()?;
        let view = self.frame(cols, rows);
        screen.draw_player(&view)
    }

    /// Builds the next frame for a `cols` x `rows` terminal and advances the
    /// marquees.
    pub fn frame(&mut self, cols: u16, rows: u16) -> PlayerView {
        let height = ui::player_viewport_height(rows);
        self.scroll_offset = menu::adjust_scroll(self.cursor, height, self.scroll_offset);

        let playing = self.engine.playlist_pos();
        if playing != self.last_playing {
            self.now_playing.reset();
            self.clock.reset();
            self.last_playing = playing;
        }
        if self.cursor != self.last_cursor {
            self.selected.reset();
            self.last_cursor = self.cursor;
        }

        let width = ui::content_width(cols);
        let title = self
            .engine
            .media_title()
            .or_else(|| playing.and_then(|idx| self.names.get(idx).cloned()))
            .unwrap_or_else(|| String::from(NOTHING_PLAYING));
        let progress = ui::progress_line(
            self.engine.position().unwrap_or_default(),
            self.engine.duration().unwrap_or_default(),
            cols,
        );

        let end = (self.scroll_offset + height).min(self.playlist.len());
        let rows = (self.scroll_offset..end)
            .map(|idx| self.row(idx, playing, width))
            .collect();

        let volume = format!("Volume: {}% (9/0)", self.engine.volume());
        let help_width = width.saturating_sub(text::display_width(&volume) + 2);
        let help = text::truncate(&self.help(), help_width);

        let view = PlayerView {
            now_playing: self.now_playing.view(&title, width),
            progress,
            paused: self.engine.is_paused(),
            locked: self.engine.loop_file(),
            rows,
            volume,
            help,
        };

        if self.clock.tick() {
            self.now_playing.step();
            self.selected.step();
        }
        view
    }

    fn row(&self, idx: usize, playing: Option<usize>, width: usize) -> PlaylistRow {
        let new_mark = if self.new_songs.contains(&idx) {
            NEW_MARK
        } else {
            ' '
        };
        let playing_mark = if playing == Some(idx) {
            PLAYING_MARK
        } else {
            ' '
        };
        let prefix = format!("{new_mark}{playing_mark} {}. ", idx + 1);
        let name_width = width.saturating_sub(text::display_width(&prefix)).max(1);
        let name = &self.names[idx];
        let selected = idx == self.cursor;
        let name = if selected {
            self.selected.view(name, name_width)
        } else {
            text::truncate(name, name_width)
        };
        PlaylistRow {
            text: format!("{prefix}{name}"),
            selected,
        }
    }

    fn help(&self) -> String {
        let mut parts = vec![
            "↑/↓: Select",
            "Enter: Play",
            "p: Pause",
            "l: Lock",
            "b/n: Prev/Next",
        ];
        if self.visualizer.is_some() {
            parts.push("v: Visualizer");
        }
        parts.push("q: Exit");
        parts.join(" | ")
    }

    pub fn handle(
        &mut self,
        command: Command,
        screen: &mut dyn Screen,
        config: &mut Config,
        store: &ConfigStore,
    ) -> Result<Flow> {
        match command {
            Command::Up => self.cursor = self.cursor.saturating_sub(1),
            Command::Down => {
                if self.cursor + 1 < self.playlist.len() {
                    self.cursor += 1;
                }
            }
            Command::Confirm => {
                self.engine.set_paused(false);
                let result = self.engine.set_playlist_pos(self.cursor);
                report(screen, result)?;
            }
            Command::TogglePause => {
                let paused = self.engine.is_paused();
                self.engine.set_paused(!paused);
            }
            Command::ToggleLock => {
                let locked = self.engine.loop_file();
                self.engine.set_loop_file(!locked);
            }
            Command::Previous => {
                let result = self.previous();
                report(screen, result)?;
            }
            Command::Next => {
                let result = self.next();
                report(screen, result)?;
            }
            Command::VolumeDown => self.adjust_volume(false, config, store),
            Command::VolumeUp => self.adjust_volume(true, config, store),
            Command::Visualizer => {
                if let Some(program) = self.visualizer.clone() {
                    launch_visualizer(screen, &program)?;
                }
            }
            Command::Quit => return Ok(self.quit(store)),
            Command::SelectCurrent => {}
        }
        Ok(Flow::Continue)
    }

    fn previous(&mut self) -> Result<()> {
        match self.engine.playlist_pos() {
            Some(pos) if pos > 0 => self.engine.prev(),
            _ => self.engine.set_playlist_pos(self.playlist.len() - 1),
        }
    }

    fn next(&mut self) -> Result<()> {
        match self.engine.playlist_pos() {
            Some(pos) if pos + 1 < self.playlist.len() => self.engine.next(),
            _ => self.engine.set_playlist_pos(0),
        }
    }

    fn adjust_volume(&mut self, up: bool, config: &mut Config, store: &ConfigStore) {
        let current = self.engine.volume();
        let volume = if up {
            current.saturating_add(VOLUME_STEP).min(MAX_VOLUME)
        } else {
            current.saturating_sub(VOLUME_STEP)
        };
        self.engine.set_volume(volume);
        config.volume = volume;
        if let Err(err) = store.save_config(config) {
            tracing::warn!(error = %format!("{err:#}"), "failed to save volume");
        }
    }

    fn quit(&mut self, store: &ConfigStore) -> Flow {
        if let Err(err) = store.save_seen_songs(&self.registry) {
            tracing::warn!(error = %format!("{err:#}"), "failed to save seen-songs registry");
        }
        self.engine.stop();
        tracing::info!(folder = %self.folder.display(), "playback session ended");
        Flow::Quit
    }
}

fn report(screen: &mut dyn Screen, result: Result<()>) -> Result<()> {
    if let Err(err) = result {
        tracing::warn!(error = %format!("{err:#}"), "playback command failed");
        screen.show_message(&format!("Playback error: {err:#}"))?;
    }
    Ok(())
}

/// Hands the terminal to the visualizer until it exits.
fn launch_visualizer(screen: &mut dyn Screen, program: &Path) -> Result<()> {
    screen.suspend()?;
    let status = process::Command::new(program).status();
    screen.resume()?;

    match status {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => {
            tracing::warn!(program = %program.display(), %status, "visualizer failed");
            screen.show_message(&format!("Visualizer exited with {status}."))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => screen.show_message(&format!(
            "Visualizer '{}' not found.",
            program.display()
        )),
        Err(err) => {
            tracing::warn!(program = %program.display(), error = %err, "visualizer launch failed");
            screen.show_message(&format!("Failed to launch visualizer: {err}"))
        }
    }
}
