use super::{MediaEngine, PlaylistCursor};
use crate::library;
use crate::model::MAX_VOLUME;
use anyhow::{Context, Result};
use rodio::Source;
use rodio::cpal::traits::{DeviceTrait, HostTrait};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
#[cfg(unix)]
use std::ffi::CString;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

const AUTO_BACKEND: &str = "auto";

/// Sound-card backed engine on top of a rodio output stream.
pub struct RodioEngine {
    stream: OutputStream,
    sink: Sink,
    cursor: PlaylistCursor,
    paused: bool,
    volume: u16,
    track_duration: Option<Duration>,
    title: Option<String>,
    failed_loads: usize,
}

impl RodioEngine {
    /// Opens `backend`: `auto` for the system default output, or an output
    /// device name.
    pub fn new(backend: &str) -> Result<Self> {
        let device = (!backend.trim().is_empty() && !backend.eq_ignore_ascii_case(AUTO_BACKEND))
            .then_some(backend.trim());
        let stream = open_output_stream(device)?;
        let sink = Sink::connect_new(stream.mixer());
        tracing::info!(backend, "audio output opened");

        Ok(Self {
            stream,
            sink,
            cursor: PlaylistCursor::default(),
            paused: false,
            volume: 100,
            track_duration: None,
            title: None,
            failed_loads: 0,
        })
    }

    fn sink_volume(&self) -> f32 {
        f32::from(self.volume) / 100.0
    }

    fn load(&mut self, index: usize) -> Result<()> {
        let loaded = self.try_load(index);
        self.failed_loads = match loaded {
            Ok(()) => 0,
            Err(_) => self.failed_loads + 1,
        };
        loaded
    }

    fn try_load(&mut self, index: usize) -> Result<()> {
        self.sink.stop();
        self.sink = Sink::connect_new(self.stream.mixer());
        self.cursor.pos = Some(index);
        self.track_duration = None;
        self.title = None;

        let Some(path) = self.cursor.current().map(Path::to_path_buf) else {
            anyhow::bail!("playlist index {index} has no track");
        };
        self.title = Some(library::media_title(&path));

        let file =
            File::open(&path).with_context(|| format!("failed to open track {}", path.display()))?;
        let source = Decoder::try_from(file)
            .with_context(|| format!("failed to decode {}", path.display()))?;
        self.track_duration = source.total_duration();
        self.sink.append(source);
        self.sink.set_volume(self.sink_volume());
        if self.paused {
            self.sink.pause();
        }
        tracing::debug!(track = %path.display(), index, "track loaded");
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.cursor.pos.is_some() && !self.paused && self.sink.empty()
    }
}

impl MediaEngine for RodioEngine {
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
        self.load(index)
    }

    fn next(&mut self) -> Result<()> {
        match self.cursor.next_index() {
            Some(index) => self.load(index),
            None => Ok(()),
        }
    }

    fn prev(&mut self) -> Result<()> {
        match self.cursor.prev_index() {
            Some(index) => self.load(index),
            None => Ok(()),
        }
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        if paused {
            self.sink.pause();
        } else {
            self.sink.play();
        }
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
        self.sink.set_volume(self.sink_volume());
    }

    fn media_title(&self) -> Option<String> {
        self.title.clone()
    }

    fn position(&self) -> Option<Duration> {
        self.cursor.pos?;
        Some(self.sink.get_pos())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn tick(&mut self) {
        if !self.is_finished() {
            return;
        }
        // An undecodable track leaves the sink empty, so the next tick moves past it.
        let next = if self.failed_loads == 0 {
            self.cursor.after_end()
        } else {
            self.cursor.after_failed_load(self.failed_loads)
        };
        let Some(index) = next else {
            if self.failed_loads > 0 {
                tracing::warn!(failed = self.failed_loads, "no playable track left, stopping");
            }
            self.stop();
            return;
        };
        if let Err(err) = self.load(index) {
            tracing::warn!(error = %format!("{err:#}"), "skipping unplayable track");
        }
    }

    fn stop(&mut self) {
        self.sink.stop();
        self.cursor.pos = None;
        self.track_duration = None;
        self.title = None;
        self.failed_loads = 0;
    }
}

fn open_output_stream(device: Option<&str>) -> Result<OutputStream> {
    let mut stream = with_silenced_stderr(|| {
        let host = rodio::cpal::default_host();
        if let Some(requested) = device {
            let device = find_device(&host, requested)
                .with_context(|| format!("audio output device not found: {requested}"))?;
            return start_stream(OutputStreamBuilder::from_device(device), requested);
        }

        let default_err = match start_stream(OutputStreamBuilder::from_default_device(), "default")
        {
            Ok(stream) => return Ok(stream),
            Err(err) => err,
        };
        for name in ranked_device_names(&host) {
            let Some(device) = find_device(&host, &name) else {
                continue;
            };
            if let Ok(stream) = start_stream(OutputStreamBuilder::from_device(device), &name) {
                tracing::info!(device = %name, "using fallback output device");
                return Ok(stream);
            }
        }
        Err(default_err.context("unable to start any audio output stream"))
    })?;
    stream.log_on_drop(false);
    Ok(stream)
}

fn start_stream<E>(builder: Result<OutputStreamBuilder, E>, device: &str) -> Result<OutputStream>
where
    E: std::error::Error + Send + Sync + 'static,
{
    builder
        .with_context(|| format!("failed to open output device {device}"))?
        .with_error_callback(|_| {})
        .open_stream_or_fallback()
        .with_context(|| format!("failed to start output stream on {device}"))
}

fn find_device(host: &rodio::cpal::Host, name: &str) -> Option<rodio::cpal::Device> {
    host.output_devices()
        .ok()?
        .find(|candidate| candidate.name().ok().as_deref() == Some(name))
}

/// Output device names, sound servers first.
fn ranked_device_names(host: &rodio::cpal::Host) -> Vec<String> {
    let mut names: Vec<String> = host
        .output_devices()
        .map(|devices| devices.filter_map(|device| device.name().ok()).collect())
        .unwrap_or_default();
    names.sort_by_cached_key(|name| {
        let lower = name.to_ascii_lowercase();
        let rank = ["pulse", "pipewire", "default"]
            .iter()
            .position(|server| lower.contains(server))
            .unwrap_or(3);
        (rank, lower)
    });
    names.dedup();
    names
}

#[cfg(unix)]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    let saved = unsafe { libc::dup(libc::STDERR_FILENO) };
    if saved < 0 {
        return operation();
    }

    let devnull = CString::new("/dev/null")
        .ok()
        .map(|path| unsafe { libc::open(path.as_ptr(), libc::O_WRONLY) })
        .unwrap_or(-1);

    if devnull >= 0 {
        unsafe {
            libc::dup2(devnull, libc::STDERR_FILENO);
            libc::close(devnull);
        }
    }

    let result = operation();

    unsafe {
        libc::dup2(saved, libc::STDERR_FILENO);
        libc::close(saved);
    }

    result
}

#[cfg(not(unix))]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    operation()
}
