#![allow(dead_code)]

use anyhow::Result;
use foldertune::audio::{MediaEngine, PlaylistCursor};
use foldertune::browser::DirectoryPicker;
use foldertune::input::Command;
use foldertune::menu::MenuView;
use foldertune::navigation::EngineFactory;
use foldertune::screen::Screen;
use foldertune::session::PlayerView;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

/// Plays back a fixed list of commands, then quits forever.
pub struct ScriptedScreen {
    commands: VecDeque<Command>,
    pub menus: Vec<(String, Vec<String>)>,
    pub players: Vec<PlayerView>,
    pub messages: Vec<String>,
    pub suspended: usize,
    /// Number of upcoming `draw_player` calls that fail.
    pub failing_draws: usize,
    /// Number of upcoming `poll_command` calls that fail.
    pub failing_polls: usize,
}

impl ScriptedScreen {
    pub fn new(commands: impl IntoIterator<Item = Command>) -> Self {
        Self {
            commands: commands.into_iter().collect(),
            menus: Vec::new(),
            players: Vec::new(),
            messages: Vec::new(),
            suspended: 0,
            failing_draws: 0,
            failing_polls: 0,
        }
    }

    pub fn idle() -> Self {
        Self::new(Vec::<Command>::new())
    }

    pub fn menu_titles(&self) -> Vec<&str> {
        self.menus.iter().map(|(title, _)| title.as_str()).collect()
    }
}

impl Screen for ScriptedScreen {
    fn size(&self) -> Result<(u16, u16)> {
        Ok((80, 24))
    }

    fn draw_menu(&mut self, view: &MenuView<'_>) -> Result<()> {
        self.menus
            .push((view.title.to_string(), view.items.to_vec()));
        Ok(())
    }

    fn draw_player(&mut self, view: &PlayerView) -> Result<()> {
        if self.failing_draws > 0 {
            self.failing_draws -= 1;
            anyhow::bail!("terminal write failed");
        }
        self.players.push(view.clone());
        Ok(())
    }

    fn show_message(&mut self, message: &str) -> Result<()> {
        self.messages.push(message.to_string());
        Ok(())
    }

    fn poll_command(&mut self, _timeout: Duration) -> Result<Option<Command>> {
        if self.failing_polls > 0 {
            self.failing_polls -= 1;
            anyhow::bail!("input device gone");
        }
        Ok(Some(self.commands.pop_front().unwrap_or(Command::Quit)))
    }

    fn suspend(&mut self) -> Result<()> {
        self.suspended += 1;
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        Ok(())
    }
}

/// What a [`RecordingEngine`] was told to do, readable after it is dropped.
#[derive(Debug, Default)]
pub struct EngineLog {
    pub cursor: PlaylistCursor,
    pub paused: bool,
    pub volume: u16,
    pub stopped: bool,
    pub engines_built: usize,
}

pub type SharedLog = Rc<RefCell<EngineLog>>;

pub struct RecordingEngine {
    log: SharedLog,
}

impl RecordingEngine {
    pub fn new(log: SharedLog) -> Self {
        log.borrow_mut().engines_built += 1;
        Self { log }
    }
}

impl MediaEngine for RecordingEngine {
    fn append(&mut self, path: &Path) {
        self.log.borrow_mut().cursor.tracks.push(path.to_path_buf());
    }

    fn playlist_len(&self) -> usize {
        self.log.borrow().cursor.tracks.len()
    }

    fn playlist_pos(&self) -> Option<usize> {
        self.log.borrow().cursor.pos
    }

    fn set_playlist_pos(&mut self, index: usize) -> Result<()> {
        let mut log = self.log.borrow_mut();
        log.cursor.check_index(index)?;
        log.cursor.pos = Some(index);
        Ok(())
    }

    fn next(&mut self) -> Result<()> {
        let mut log = self.log.borrow_mut();
        let Some(index) = log.cursor.next_index() else {
            anyhow::bail!("no next track");
        };
        log.cursor.pos = Some(index);
        Ok(())
    }

    fn prev(&mut self) -> Result<()> {
        let mut log = self.log.borrow_mut();
        let Some(index) = log.cursor.prev_index() else {
            anyhow::bail!("no previous track");
        };
        log.cursor.pos = Some(index);
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.log.borrow().paused
    }

    fn set_paused(&mut self, paused: bool) {
        self.log.borrow_mut().paused = paused;
    }

    fn loop_file(&self) -> bool {
        self.log.borrow().cursor.loop_file
    }

    fn set_loop_file(&mut self, enabled: bool) {
        self.log.borrow_mut().cursor.loop_file = enabled;
    }

    fn loop_playlist(&self) -> bool {
        self.log.borrow().cursor.loop_playlist
    }

    fn set_loop_playlist(&mut self, enabled: bool) {
        self.log.borrow_mut().cursor.loop_playlist = enabled;
    }

    fn volume(&self) -> u16 {
        self.log.borrow().volume
    }

    fn set_volume(&mut self, volume: u16) {
        self.log.borrow_mut().volume = volume;
    }

    fn media_title(&self) -> Option<String> {
        None
    }

    fn position(&self) -> Option<Duration> {
        self.log.borrow().cursor.pos.map(|_| Duration::ZERO)
    }

    fn duration(&self) -> Option<Duration> {
        None
    }

    fn tick(&mut self) {}

    fn stop(&mut self) {
        let mut log = self.log.borrow_mut();
        log.stopped = true;
        log.cursor.pos = None;
    }
}

pub fn recording_factory(log: &SharedLog) -> EngineFactory<'static> {
    let log = Rc::clone(log);
    Box::new(move |_backend: &str| -> Result<Box<dyn MediaEngine>> {
        Ok(Box::new(RecordingEngine::new(Rc::clone(&log))))
    })
}

pub fn failing_factory() -> EngineFactory<'static> {
    Box::new(|backend: &str| -> Result<Box<dyn MediaEngine>> {
        anyhow::bail!("no output device for backend {backend}")
    })
}

/// Picker that always answers the same way.
pub struct FixedPicker(pub Option<PathBuf>);

impl DirectoryPicker for FixedPicker {
    fn choose_directory(
        &mut self,
        _screen: &mut dyn Screen,
        _start_hint: &Path,
    ) -> Result<Option<PathBuf>> {
        Ok(self.0.clone())
    }
}
