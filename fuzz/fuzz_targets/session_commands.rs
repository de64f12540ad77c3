#![no_main]

use anyhow::Result;
use foldertune::audio::NullEngine;
use foldertune::config::ConfigStore;
use foldertune::input::Command;
use foldertune::menu::MenuView;
use foldertune::model::{Config, MAX_VOLUME, SeenSongs};
use foldertune::screen::Screen;
use foldertune::session::{Flow, PlaybackSession, PlayerView};
use libfuzzer_sys::fuzz_target;
use std::path::{Path, PathBuf};
use std::time::Duration;

const COMMANDS: [Command; 11] = [
    Command::Up,
    Command::Down,
    Command::Confirm,
    Command::SelectCurrent,
    Command::TogglePause,
    Command::ToggleLock,
    Command::Previous,
    Command::Next,
    Command::VolumeDown,
    Command::VolumeUp,
    Command::Quit,
];

struct Headless {
    cols: u16,
    rows: u16,
}

impl Screen for Headless {
    fn size(&self) -> Result<(u16, u16)> {
        Ok((self.cols, self.rows))
    }

    fn draw_menu(&mut self, _view: &MenuView<'_>) -> Result<()> {
        Ok(())
    }

    fn draw_player(&mut self, _view: &PlayerView) -> Result<()> {
        Ok(())
    }

    fn show_message(&mut self, _message: &str) -> Result<()> {
        Ok(())
    }

    fn poll_command(&mut self, _timeout: Duration) -> Result<Option<Command>> {
        Ok(None)
    }

    fn suspend(&mut self) -> Result<()> {
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&shape, commands)) = data.split_first() else {
        return;
    };
    let Ok(dir) = tempfile::tempdir() else {
        return;
    };
    let store = ConfigStore::new(dir.path());
    let mut config = Config {
        cava_enabled: false,
        ..Config::default()
    };

    let len = usize::from(shape % 40) + 1;
    let playlist: Vec<PathBuf> = (0..len)
        .map(|idx| PathBuf::from(format!("/fuzz/track_{idx:02}_with_a_rather_long_name.mp3")))
        .collect();
    let Ok(mut session) = PlaybackSession::start(
        Path::new("/fuzz"),
        playlist,
        SeenSongs::default(),
        Box::new(NullEngine::new()),
        &config,
    ) else {
        return;
    };
    let mut screen = Headless {
        cols: 40 + u16::from(shape),
        rows: 10 + u16::from(shape % 30),
    };

    for byte in commands {
        let command = COMMANDS[usize::from(*byte) % COMMANDS.len()];
        let Ok(flow) = session.handle(command, &mut screen, &mut config, &store) else {
            return;
        };
        let view = session.frame(screen.cols, screen.rows);
        assert!(session.cursor() < len);
        assert!(view.rows.iter().filter(|row| row.selected).count() <= 1);
        assert!(session.engine().volume() <= MAX_VOLUME);
        if flow == Flow::Quit {
            break;
        }
    }
});
