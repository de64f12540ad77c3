use crate::input::{self, Command};
use crate::menu::MenuView;
use crate::session::PlayerView;
use crate::ui;
use anyhow::Result;
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout, stdout};
use std::time::Duration;

/// Everything the state machines need from a terminal.
pub trait Screen {
    /// `(columns, rows)`.
    fn size(&self) -> Result<(u16, u16)>;
    fn draw_menu(&mut self, view: &MenuView<'_>) -> Result<()>;
    fn draw_player(&mut self, view: &PlayerView) -> Result<()>;
    /// Shows a modal message and waits for any key.
    fn show_message(&mut self, message: &str) -> Result<()>;
    /// Waits up to `timeout` for a bound key.
    fn poll_command(&mut self, timeout: Duration) -> Result<Option<Command>>;
    /// Hands the terminal to a child process.
    fn suspend(&mut self) -> Result<()>;
    fn resume(&mut self) -> Result<()>;
}

/// Leaves raw mode and the alternate screen. Safe to call more than once.
pub fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen, Show)
}

pub struct CrosstermScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl CrosstermScreen {
    pub fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut out = stdout();
        execute!(out, EnterAlternateScreen, Hide)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(out))?;
        terminal.clear()?;
        Ok(Self { terminal })
    }
}

impl Drop for CrosstermScreen {
    fn drop(&mut self) {
        let _ = restore_terminal();
    }
}

impl Screen for CrosstermScreen {
    fn size(&self) -> Result<(u16, u16)> {
        let size = self.terminal.size()?;
        Ok((size.width, size.height))
    }

    fn draw_menu(&mut self, view: &MenuView<'_>) -> Result<()> {
        self.terminal.draw(|frame| ui::draw_menu(frame, view))?;
        Ok(())
    }

    fn draw_player(&mut self, view: &PlayerView) -> Result<()> {
        self.terminal.draw(|frame| ui::draw_player(frame, view))?;
        Ok(())
    }

    fn show_message(&mut self, message: &str) -> Result<()> {
        self.terminal
            .draw(|frame| ui::draw_message(frame, message))?;
        loop {
            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                return Ok(());
            }
        }
    }

    fn poll_command(&mut self, timeout: Duration) -> Result<Option<Command>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) => Ok(input::command_for(key)),
            _ => Ok(None),
        }
    }

    fn suspend(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen, Show)?;
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        enable_raw_mode()?;
        execute!(self.terminal.backend_mut(), EnterAlternateScreen, Hide)?;
        self.terminal.clear()?;
        Ok(())
    }
}
