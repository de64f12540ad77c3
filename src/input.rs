use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Logical actions, independent of how they were typed.
///
/// Every screen reads the same command stream and ignores what it has no use
/// for, so `SelectCurrent` is a no-op in the player and `VolumeUp` in a menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Up,
    Down,
    Confirm,
    SelectCurrent,
    TogglePause,
    ToggleLock,
    Previous,
    Next,
    VolumeDown,
    VolumeUp,
    Visualizer,
    Quit,
}

const BINDINGS: &[(KeyCode, Command)] = &[
    (KeyCode::Up, Command::Up),
    (KeyCode::Down, Command::Down),
    (KeyCode::Enter, Command::Confirm),
    (KeyCode::Char('s'), Command::SelectCurrent),
    (KeyCode::Char('p'), Command::TogglePause),
    (KeyCode::Char(' '), Command::TogglePause),
    (KeyCode::Char('l'), Command::ToggleLock),
    (KeyCode::Char('b'), Command::Previous),
    (KeyCode::Char('n'), Command::Next),
    (KeyCode::Char('9'), Command::VolumeDown),
    (KeyCode::Char('0'), Command::VolumeUp),
    (KeyCode::Char('v'), Command::Visualizer),
    (KeyCode::Char('q'), Command::Quit),
    (KeyCode::Esc, Command::Quit),
];

pub fn command_for(key: KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Command::Quit);
    }
    BINDINGS
        .iter()
        .find(|(code, _)| *code == key.code)
        .map(|(_, command)| *command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn player_keys_map_to_commands() {
        assert_eq!(command_for(press(KeyCode::Char('p'))), Some(Command::TogglePause));
        assert_eq!(command_for(press(KeyCode::Char('9'))), Some(Command::VolumeDown));
        assert_eq!(command_for(press(KeyCode::Char('0'))), Some(Command::VolumeUp));
        assert_eq!(command_for(press(KeyCode::Enter)), Some(Command::Confirm));
    }

    #[test]
    fn ctrl_c_quits() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(command_for(key), Some(Command::Quit));
    }

    #[test]
    fn unbound_keys_and_releases_are_ignored() {
        assert_eq!(command_for(press(KeyCode::Char('z'))), None);
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(command_for(release), None);
    }
}
