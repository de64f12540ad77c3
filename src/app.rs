use crate::audio::{MediaEngine, NullEngine, RodioEngine};
use crate::browser::{DirectoryPicker, ExternalPicker, MenuBrowser};
use crate::config::ConfigStore;
use crate::model::Config;
use crate::navigation::Navigator;
use crate::screen::{self, CrosstermScreen};
use anyhow::{Context, Result};
use std::panic;

pub const MIN_COLS: u16 = 40;
pub const MIN_ROWS: u16 = 10;

const NULL_BACKEND: &str = "null";

pub fn run(store: &ConfigStore) -> Result<()> {
    let (cols, rows) = crossterm::terminal::size().context("failed to read terminal size")?;
    if !fits(cols, rows) {
        eprintln!(
            "Terminal too small: need at least {MIN_COLS}x{MIN_ROWS}, current size is {cols}x{rows}."
        );
        return Ok(());
    }

    let config = store.load_config();
    tracing::info!(
        base_paths = config.base_paths.len(),
        backend = %config.audio_backend,
        "starting"
    );
    let picker = picker_for(&config);

    install_panic_hook();
    let mut screen = CrosstermScreen::enter()?;
    let mut navigator = Navigator::new(
        &mut screen,
        store,
        config,
        Box::new(open_engine),
        picker,
    );
    let result = navigator.run();
    if let Err(err) = &result {
        tracing::error!(error = %format!("{err:#}"), "terminal failure");
    }
    result
}

pub fn fits(cols: u16, rows: u16) -> bool {
    cols >= MIN_COLS && rows >= MIN_ROWS
}

/// `null` selects the silent engine; anything else goes to rodio.
pub fn open_engine(backend: &str) -> Result<Box<dyn MediaEngine>> {
    if backend.trim().eq_ignore_ascii_case(NULL_BACKEND) {
        return Ok(Box::new(NullEngine::new()));
    }
    Ok(Box::new(RodioEngine::new(backend)?))
}

pub fn picker_for(config: &Config) -> Box<dyn DirectoryPicker> {
    match config
        .directory_picker
        .as_deref()
        .map(str::trim)
        .filter(|program| !program.is_empty())
    {
        Some(program) => Box::new(ExternalPicker::new(program)),
        None => Box::new(MenuBrowser),
    }
}

fn install_panic_hook() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = screen::restore_terminal();
        default_hook(info);
    }));
}
