// Keyboard shortcuts

use crate::document::Mark;
use once_cell::sync::Lazy;
use std::str::FromStr;
use thiserror::Error;
use tracing::trace;

/// Modifier state of a chord.
///
/// `command` is the platform command key: Cmd on macOS, Ctrl elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChordModifiers {
    pub command: bool,
    pub shift: bool,
    pub alt: bool,
}

/// A key press with its modifiers, as delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub modifiers: ChordModifiers,

    /// Lowercase key character
    pub key: char,
}

impl KeyChord {
    pub fn new(modifiers: ChordModifiers, key: char) -> Self {
        Self {
            modifiers,
            key: key.to_ascii_lowercase(),
        }
    }

    /// Translate an egui key press. Keys without a single-character name are ignored.
    pub fn from_egui(key: egui::Key, modifiers: egui::Modifiers) -> Option<Self> {
        let name = key.name();
        let mut chars = name.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return None;
        };
        Some(Self::new(
            ChordModifiers {
                command: modifiers.command,
                shift: modifiers.shift,
                alt: modifiers.alt,
            },
            ch,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseHotkeyError {
    #[error("empty hotkey")]
    Empty,

    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),

    #[error("modifier '{0}' names a platform key, use 'mod' instead")]
    PlatformModifier(String),

    #[error("hotkey key must be a single character, got '{0}'")]
    InvalidKey(String),
}

/// A parsed hotkey such as `mod+b` or `mod+shift+z`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub modifiers: ChordModifiers,
    pub key: char,
}

impl Hotkey {
    /// Matches only with exactly the listed modifiers held
    pub fn matches(&self, chord: &KeyChord) -> bool {
        self.modifiers == chord.modifiers && self.key == chord.key
    }
}

impl FromStr for Hotkey {
    type Err = ParseHotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The key itself may be '+', so split off the last segment by hand
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseHotkeyError::Empty);
        }
        let (prefix, key) = match s.strip_suffix("++") {
            Some(prefix) => (prefix, "+"),
            None => match s.rsplit_once('+') {
                Some((prefix, key)) => (prefix, key),
                None => ("", s),
            },
        };

        let mut modifiers = ChordModifiers::default();
        for part in prefix.split('+').filter(|part| !part.is_empty()) {
            match part.to_ascii_lowercase().as_str() {
                // Cmd on macOS, Ctrl elsewhere
                "mod" => modifiers.command = true,
                "shift" => modifiers.shift = true,
                "alt" | "option" => modifiers.alt = true,
                // A chord has no separate Ctrl flag, so these cannot be told apart from "mod"
                "ctrl" | "control" | "cmd" | "command" => {
                    return Err(ParseHotkeyError::PlatformModifier(part.to_string()));
                }
                _ => return Err(ParseHotkeyError::UnknownModifier(part.to_string())),
            }
        }

        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(Hotkey {
                modifiers,
                key: ch.to_ascii_lowercase(),
            }),
            _ => Err(ParseHotkeyError::InvalidKey(key.to_string())),
        }
    }
}

/// What a shortcut does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    ToggleMark(Mark),
    Undo,
    Redo,
    SelectAll,
}

/// Chord to mark table
pub const MARK_HOTKEYS: [(&str, Mark); 4] = [
    ("mod+b", Mark::Bold),
    ("mod+i", Mark::Italic),
    ("mod+u", Mark::Underline),
    ("mod+`", Mark::Code),
];

const EDITOR_HOTKEYS: [(&str, KeyAction); 4] = [
    ("mod+z", KeyAction::Undo),
    ("mod+shift+z", KeyAction::Redo),
    ("mod+y", KeyAction::Redo),
    ("mod+a", KeyAction::SelectAll),
];

static KEYMAP: Lazy<Vec<(Hotkey, KeyAction)>> = Lazy::new(|| {
    let marks = MARK_HOTKEYS
        .iter()
        .map(|(chord, mark)| (*chord, KeyAction::ToggleMark(*mark)));
    marks
        .chain(EDITOR_HOTKEYS.iter().copied())
        .filter_map(|(chord, action)| chord.parse().ok().map(|hotkey| (hotkey, action)))
        .collect()
});

/// Action bound to `chord`, if any
pub fn action_for(chord: &KeyChord) -> Option<KeyAction> {
    let action = KEYMAP
        .iter()
        .find(|(hotkey, _)| hotkey.matches(chord))
        .map(|(_, action)| *action);
    if let Some(action) = action {
        trace!("{:?} -> {:?}", chord, action);
    }
    action
}
