use crate::config;
use crate::input::Command;
use crate::library;
use crate::menu::MenuState;
use crate::screen::Screen;
use crate::session::POLL_INTERVAL;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{self, Stdio};
use walkdir::{DirEntry, WalkDir};

pub const SELECT_CURRENT: &str = "[ Select Current Directory ]";
pub const PARENT: &str = "[../]";
const BROWSE_HELP: &str = "↑/↓: Nav | Enter: Open | s: Select | q: Back";

/// How deep the external picker's candidate list reaches below its root.
const PICKER_DEPTH: usize = 3;

/// Asks the user for a directory.
///
/// `Ok(None)` means the user cancelled. Errors are reserved for a picker that
/// could not run at all.
pub trait DirectoryPicker {
    fn choose_directory(
        &mut self,
        screen: &mut dyn Screen,
        start_hint: &Path,
    ) -> Result<Option<PathBuf>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserOutcome {
    Continue,
    Chosen(PathBuf),
    Cancelled,
}

/// Directory-walk menu state, one directory at a time.
#[derive(Debug, Clone)]
pub struct DirectoryBrowser {
    current: PathBuf,
    menu: MenuState,
}

impl DirectoryBrowser {
    /// Starts at `start_hint`, or the home directory when the hint is not a
    /// directory.
    pub fn open(start_hint: &Path) -> Self {
        let start = if start_hint.is_dir() {
            start_hint.to_path_buf()
        } else {
            config::home_dir().unwrap_or_else(|| PathBuf::from("/"))
        };
        Self::at(start)
    }

    /// Starts at `dir`, climbing to the nearest readable ancestor.
    pub fn at(dir: PathBuf) -> Self {
        let mut browser = Self {
            current: dir,
            menu: MenuState::default(),
        };
        browser.refresh();
        browser
    }

    pub fn current(&self) -> &Path {
        &self.current
    }

    pub fn menu(&self) -> &MenuState {
        &self.menu
    }

    pub fn menu_mut(&mut self) -> &mut MenuState {
        &mut self.menu
    }

    pub fn title(&self) -> String {
        format!("Browse: {}", self.current.display())
    }

    fn refresh(&mut self) {
        loop {
            match list_entries(&self.current) {
                Ok(items) => {
                    self.menu = MenuState::new(items);
                    return;
                }
                Err(err) => {
                    tracing::warn!(error = %format!("{err:#}"), "directory unreadable, going up");
                    let Some(parent) = self.current.parent().map(Path::to_path_buf) else {
                        self.menu = MenuState::new(fixed_entries());
                        return;
                    };
                    self.current = parent;
                }
            }
        }
    }

    fn enter(&mut self, dir: PathBuf) {
        self.current = dir;
        self.refresh();
    }

    pub fn handle(&mut self, command: Command) -> BrowserOutcome {
        match command {
            Command::Up => self.menu.select_prev(),
            Command::Down => self.menu.select_next(),
            Command::SelectCurrent => return BrowserOutcome::Chosen(self.current.clone()),
            Command::Quit => return BrowserOutcome::Cancelled,
            Command::Confirm => {
                let Some(item) = self.menu.selected_item().map(str::to_string) else {
                    return BrowserOutcome::Continue;
                };
                match item.as_str() {
                    SELECT_CURRENT => return BrowserOutcome::Chosen(self.current.clone()),
                    PARENT => {
                        if let Some(parent) = self.current.parent().map(Path::to_path_buf) {
                            self.enter(parent);
                        }
                    }
                    name => {
                        let target = self.current.join(name);
                        if target.is_dir() {
                            self.enter(target);
                        }
                    }
                }
            }
            _ => {}
        }
        BrowserOutcome::Continue
    }
}

fn fixed_entries() -> Vec<String> {
    vec![String::from(SELECT_CURRENT), String::from(PARENT)]
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Browser menu items for `dir`: the two fixed entries, then visible
/// directories, then visible files.
pub fn list_entries(dir: &Path) -> Result<Vec<String>> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in library::immediate_entries(dir)? {
        if is_hidden(&entry) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if entry.file_type().is_dir() {
            dirs.push(name);
        } else if entry.file_type().is_file() {
            files.push(name);
        }
    }
    dirs.sort();
    files.sort();

    let mut items = fixed_entries();
    items.extend(dirs);
    items.extend(files);
    Ok(items)
}

/// Built-in picker driving a [`DirectoryBrowser`] through the screen.
#[derive(Debug, Clone, Copy, Default)]
pub struct MenuBrowser;

impl DirectoryPicker for MenuBrowser {
    fn choose_directory(
        &mut self,
        screen: &mut dyn Screen,
        start_hint: &Path,
    ) -> Result<Option<PathBuf>> {
        let mut browser = DirectoryBrowser::open(start_hint);
        loop {
            let (_, rows) = screen.size()?;
            browser
                .menu_mut()
                .scroll_into_view(MenuState::viewport_height(rows));
            let title = browser.title();
            screen.draw_menu(&browser.menu().view(&title, BROWSE_HELP))?;

            let Some(command) = screen.poll_command(POLL_INTERVAL)? else {
                continue;
            };
            match browser.handle(command) {
                BrowserOutcome::Continue => {}
                BrowserOutcome::Chosen(dir) => return Ok(Some(dir)),
                BrowserOutcome::Cancelled => return Ok(None),
            }
        }
    }
}

/// Fuzzy-finder style program fed a directory list on stdin.
///
/// The first line it prints is the choice; a non-zero exit is a cancel.
#[derive(Debug, Clone)]
pub struct ExternalPicker {
    program: String,
}

impl ExternalPicker {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl DirectoryPicker for ExternalPicker {
    fn choose_directory(
        &mut self,
        screen: &mut dyn Screen,
        start_hint: &Path,
    ) -> Result<Option<PathBuf>> {
        let root = if start_hint.is_dir() {
            start_hint.to_path_buf()
        } else {
            config::home_dir().unwrap_or_else(|| PathBuf::from("/"))
        };
        let candidates = directory_candidates(&root);

        screen.suspend()?;
        let picked = run_picker(&self.program, &candidates);
        screen.resume()?;
        picked
    }
}

fn directory_candidates(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .max_depth(PICKER_DEPTH)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .map(DirEntry::into_path)
        .collect()
}

fn run_picker(program: &str, candidates: &[PathBuf]) -> Result<Option<PathBuf>> {
    let mut child = process::Command::new(program)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to launch directory picker '{program}'"))?;

    if let Some(mut stdin) = child.stdin.take() {
        for candidate in candidates {
            // The picker may exit before reading everything.
            if writeln!(stdin, "{}", candidate.display()).is_err() {
                break;
            }
        }
    }

    let output = child
        .wait_with_output()
        .with_context(|| format!("directory picker '{program}' failed"))?;
    if !output.status.success() {
        tracing::debug!(program, status = %output.status, "directory picker cancelled");
        return Ok(None);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(PathBuf::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn fixture() -> tempfile::TempDir {
        let dir = tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("Rock")).expect("mkdir");
        fs::create_dir_all(dir.path().join("Ambient")).expect("mkdir");
        fs::create_dir_all(dir.path().join(".cache")).expect("mkdir");
        fs::write(dir.path().join("notes.txt"), b"").expect("write");
        fs::write(dir.path().join(".hidden"), b"").expect("write");
        dir
    }

    #[test]
    fn entries_list_dirs_before_files_without_hidden() {
        let dir = fixture();
        let items = list_entries(dir.path()).expect("entries");
        assert_eq!(
            items,
            vec![SELECT_CURRENT, PARENT, "Ambient", "Rock", "notes.txt"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_keeps_browser_in_place() {
        let dir = fixture();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("stale-link"))
            .expect("symlink");

        let browser = DirectoryBrowser::open(dir.path());

        assert_eq!(browser.current(), dir.path());
        assert_eq!(
            browser.menu().items,
            vec![SELECT_CURRENT, PARENT, "Ambient", "Rock", "notes.txt"]
        );
    }

    #[test]
    fn confirm_descends_and_parent_ascends() {
        let dir = fixture();
        let mut browser = DirectoryBrowser::open(dir.path());

        browser.menu_mut().selected = 3;
        assert_eq!(browser.handle(Command::Confirm), BrowserOutcome::Continue);
        assert_eq!(browser.current(), dir.path().join("Rock"));
        assert_eq!(browser.menu().selected, 0);

        browser.menu_mut().selected = 1;
        browser.handle(Command::Confirm);
        assert_eq!(browser.current(), dir.path());
    }

    #[test]
    fn confirm_on_file_stays_put() {
        let dir = fixture();
        let mut browser = DirectoryBrowser::open(dir.path());
        browser.menu_mut().selected = 4;
        assert_eq!(browser.handle(Command::Confirm), BrowserOutcome::Continue);
        assert_eq!(browser.current(), dir.path());
    }

    #[test]
    fn select_and_cancel_end_browsing() {
        let dir = fixture();
        let mut browser = DirectoryBrowser::open(dir.path());
        assert_eq!(
            browser.handle(Command::SelectCurrent),
            BrowserOutcome::Chosen(dir.path().to_path_buf())
        );
        assert_eq!(
            browser.handle(Command::Confirm),
            BrowserOutcome::Chosen(dir.path().to_path_buf())
        );
        assert_eq!(browser.handle(Command::Quit), BrowserOutcome::Cancelled);
    }

    #[test]
    fn selection_wraps_around() {
        let dir = fixture();
        let mut browser = DirectoryBrowser::open(dir.path());
        browser.handle(Command::Up);
        assert_eq!(browser.menu().selected, 4);
        browser.handle(Command::Down);
        assert_eq!(browser.menu().selected, 0);
    }

    #[test]
    fn unreadable_directory_falls_back_to_parent() {
        let dir = fixture();
        let browser = DirectoryBrowser::at(dir.path().join("vanished"));
        assert_eq!(browser.current(), dir.path());
        assert_eq!(browser.title(), format!("Browse: {}", dir.path().display()));
    }

    #[test]
    fn candidates_skip_hidden_directories() {
        let dir = fixture();
        let candidates = directory_candidates(dir.path());
        assert_eq!(candidates[0], dir.path());
        assert!(candidates.contains(&dir.path().join("Rock")));
        assert!(!candidates.iter().any(|path| path.ends_with(".cache")));
        assert!(!candidates.iter().any(|path| path.ends_with("notes.txt")));
    }

    #[cfg(unix)]
    #[test]
    fn picker_output_first_line_is_the_choice() {
        let dir = fixture();
        let candidates = directory_candidates(dir.path());
        let picked = run_picker("head", &candidates).expect("picker");
        assert_eq!(picked, Some(dir.path().to_path_buf()));
    }

    #[cfg(unix)]
    #[test]
    fn picker_failure_exit_is_a_cancel() {
        let picked = run_picker("false", &[PathBuf::from("/")]).expect("picker");
        assert_eq!(picked, None);
    }

    #[test]
    fn missing_picker_is_an_error() {
        assert!(run_picker("foldertune-no-such-picker", &[]).is_err());
    }
}
