//! Keyboard chords bound to window-manager commands.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
/// A key press with its modifier state. `key` uses DOM `KeyboardEvent.key` names (`Tab`, `F4`).
pub struct KeyChord {
    pub key: String,
    pub alt: bool,
    pub shift: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl KeyChord {
    pub fn plain(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn alt(key: impl Into<String>) -> Self {
        Self {
            alt: true,
            ..Self::plain(key)
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCommand {
    CycleForward,
    CycleBackward,
    CloseActive,
}

/// Maps `Alt+Tab`, `Alt+Shift+Tab` and `Alt+F4` to their window commands.
pub fn command_for_chord(chord: &KeyChord) -> Option<WindowCommand> {
    if !chord.alt || chord.ctrl || chord.meta {
        return None;
    }
    match (chord.key.as_str(), chord.shift) {
        ("Tab", false) => Some(WindowCommand::CycleForward),
        ("Tab", true) => Some(WindowCommand::CycleBackward),
        ("F4", false) => Some(WindowCommand::CloseActive),
        _ => None,
    }
}
