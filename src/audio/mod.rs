mod output;

pub use output::RodioEngine;

use crate::library;
use crate::model::MAX_VOLUME;
use anyhow::Result;
use rodio::{Decoder, Source};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Playlist-level transport surface the player drives.
///
/// State is polled, never pushed: callers read it once per frame and call
/// [`MediaEngine::tick`] so the engine can move on when a track ends.
pub trait MediaEngine {
    fn append(&mut self, path: &Path);
    fn playlist_len(&self) -> usize;
    fn playlist_pos(&self) -> Option<usize>;
    fn set_playlist_pos(&mut self, index: usize) -> Result<()>;
    fn next(&mut self) -> Result<()>;
    fn prev(&mut self) -> Result<()>;
    fn is_paused(&self) -> bool;
    fn set_paused(&mut self, paused: bool);
    fn loop_file(&self) -> bool;
    fn set_loop_file(&mut self, enabled: bool);
    fn loop_playlist(&self) -> bool;
    fn set_loop_playlist(&mut self, enabled: bool);
    /// Percent, 0..=150.
    fn volume(&self) -> u16;
    fn set_volume(&mut self, volume: u16);
    fn media_title(&self) -> Option<String>;
    fn position(&self) -> Option<Duration>;
    fn duration(&self) -> Option<Duration>;
    fn tick(&mut self);
    fn stop(&mut self);
}

/// Playlist bookkeeping shared by the engines.
#[derive(Debug, Clone, Default)]
pub struct PlaylistCursor {
    pub tracks: Vec<PathBuf>,
    pub pos: Option<usize>,
    pub loop_file: bool,
    pub loop_playlist: bool,
}

impl PlaylistCursor {
    pub fn current(&self) -> Option<&Path> {
        self.pos
            .and_then(|idx| self.tracks.get(idx))
            .map(PathBuf::as_path)
    }

    pub fn next_index(&self) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }
        match self.pos {
            None => Some(0),
            Some(pos) if pos + 1 < self.tracks.len() => Some(pos + 1),
            Some(_) => self.loop_playlist.then_some(0),
        }
    }

    pub fn prev_index(&self) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }
        match self.pos {
            Some(pos) if pos > 0 => Some(pos - 1),
            _ => self.loop_playlist.then_some(self.tracks.len() - 1),
        }
    }

    /// Track to start once the current one finishes on its own.
    pub fn after_end(&self) -> Option<usize> {
        if self.loop_file {
            return self.pos;
        }
        self.next_index()
    }

    /// Track to try after `failures` loads in a row came up empty. Gives up
    /// when the same track would be retried or every track has failed.
    pub fn after_failed_load(&self, failures: usize) -> Option<usize> {
        if self.loop_file || failures >= self.tracks.len() {
            return None;
        }
        self.next_index()
    }

    pub fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.tracks.len() {
            anyhow::bail!(
                "playlist index {index} out of range ({} tracks)",
                self.tracks.len()
            );
        }
        Ok(())
    }
}

/// Engine with a simulated clock and no audio output.
///
/// Selected with the `null` audio backend; useful headless and in tests.
pub struct NullEngine {
    cursor: PlaylistCursor,
    paused: bool,
    volume: u16,
    started_at: Option<Instant>,
    position_offset: Duration,
    track_duration: Option<Duration>,
    title: Option<String>,
}

impl NullEngine {
    pub fn new() -> Self {
        Self {
            cursor: PlaylistCursor::default(),
            paused: false,
            volume: 100,
            started_at: None,
            position_offset: Duration::ZERO,
            track_duration: None,
            title: None,
        }
    }

    fn estimate_duration(path: &Path) -> Option<Duration> {
        let file = File::open(path).ok()?;
        let source = Decoder::try_from(file).ok()?;
        source
            .total_duration()
            .filter(|duration| !duration.is_zero())
    }

    fn current_position(&self) -> Duration {
        let mut position = self.position_offset;
        if !self.paused
            && self.cursor.pos.is_some()
            && let Some(started_at) = self.started_at
        {
            position = position.saturating_add(started_at.elapsed());
        }
        if let Some(duration) = self.track_duration {
            return position.min(duration);
        }
        position
    }

    fn load(&mut self, index: usize) {
        self.cursor.pos = Some(index);
        self.started_at = (!self.paused).then(Instant::now);
        self.position_offset = Duration::ZERO;
        let path = self.cursor.current().map(Path::to_path_buf);
        self.track_duration = path.as_deref().and_then(Self::estimate_duration);
        self.title = path.as_deref().map(library::media_title);
    }

    fn is_finished(&self) -> bool {
        let Some(duration) = self.track_duration else {
            return false;
        };
        self.cursor.pos.is_some() && !self.paused && self.current_position() >= duration
    }
}

impl Default for NullEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaEngine for NullEngine {
    fn append(&mut self, path: &Path) {
        self.cursor.tracks.push(path.to_path_buf());
    }

    fn playlist_len(&self) -> usize {
        self.cursor.tracks.len()
    }

    fn playlist_pos(&self) -> Option<usize> {
        self.cursor.pos
    }

    fn set_playlist_pos(&mut self, index: usize) -> Result<()> {
        self.cursor.check_index(index)?;
        self.load(index);
        Ok(())
    }

    fn next(&mut self) -> Result<()> {
        if let Some(index) = self.cursor.next_index() {
            self.load(index);
        }
        Ok(())
    }

    fn prev(&mut self) -> Result<()> {
        if let Some(index) = self.cursor.prev_index() {
            self.load(index);
        }
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_paused(&mut self, paused: bool) {
        if paused == self.paused {
            return;
        }
        if paused {
            self.position_offset = self.current_position();
            self.started_at = None;
        } else if self.cursor.pos.is_some() {
            self.started_at = Some(Instant::now());
        }
        self.paused = paused;
    }

    fn loop_file(&self) -> bool {
        self.cursor.loop_file
    }

    fn set_loop_file(&mut self, enabled: bool) {
        self.cursor.loop_file = enabled;
    }

    fn loop_playlist(&self) -> bool {
        self.cursor.loop_playlist
    }

    fn set_loop_playlist(&mut self, enabled: bool) {
        self.cursor.loop_playlist = enabled;
    }

    fn volume(&self) -> u16 {
        self.volume
    }

    fn set_volume(&mut self, volume: u16) {
        self.volume = volume.min(MAX_VOLUME);
    }

    fn media_title(&self) -> Option<String> {
        self.title.clone()
    }

    fn position(&self) -> Option<Duration> {
        self.cursor.pos?;
        Some(self.current_position())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn tick(&mut self) {
        if !self.is_finished() {
            return;
        }
        match self.cursor.after_end() {
            Some(index) => self.load(index),
            None => self.stop(),
        }
    }

    fn stop(&mut self) {
        self.cursor.pos = None;
        self.paused = false;
        self.started_at = None;
        self.position_offset = Duration::ZERO;
        self.track_duration = None;
        self.title = None;
    }
}
