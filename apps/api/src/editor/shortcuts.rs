//! Keyboard shortcut table.
//!
//! Chords are written `Mod+Shift+Z`, where `Mod` is Ctrl or Cmd depending on
//! the platform. Parsing is case-insensitive and order-insensitive for the
//! modifiers.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorCommand {
    Save,
    Copy,
    Undo,
    Redo,
    Export,
    Preview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub primary: bool,
    pub shift: bool,
    pub alt: bool,
    pub key: char,
}

impl KeyChord {
    pub const fn command(key: char) -> Self {
        Self {
            primary: true,
            shift: false,
            alt: false,
            key,
        }
    }

    pub const fn command_shift(key: char) -> Self {
        Self {
            primary: true,
            shift: true,
            alt: false,
            key,
        }
    }

    /// Parses `Mod+Shift+Z`-style strings. `Ctrl`, `Cmd` and `Meta` are
    /// accepted as aliases of `Mod`.
    pub fn parse(chord: &str) -> Option<Self> {
        let mut primary = false;
        let mut shift = false;
        let mut alt = false;
        let mut key = None;

        for part in chord.split('+').map(str::trim) {
            match part.to_ascii_lowercase().as_str() {
                "mod" | "ctrl" | "control" | "cmd" | "meta" => primary = true,
                "shift" => shift = true,
                "alt" | "option" => alt = true,
                other => {
                    let mut chars = other.chars();
                    let (Some(c), None) = (chars.next(), chars.next()) else {
                        return None;
                    };
                    if key.replace(c.to_ascii_lowercase()).is_some() {
                        return None;
                    }
                }
            }
        }

        Some(Self {
            primary,
            shift,
            alt,
            key: key?,
        })
    }
}

const BINDINGS: &[(KeyChord, EditorCommand)] = &[
    (KeyChord::command('s'), EditorCommand::Save),
    (KeyChord::command_shift('c'), EditorCommand::Copy),
    (KeyChord::command('z'), EditorCommand::Undo),
    (KeyChord::command_shift('z'), EditorCommand::Redo),
    (KeyChord::command('y'), EditorCommand::Redo),
    (KeyChord::command('e'), EditorCommand::Export),
    (KeyChord::command('p'), EditorCommand::Preview),
];

pub fn command_for(chord: KeyChord) -> Option<EditorCommand> {
    BINDINGS
        .iter()
        .find(|(bound, _)| *bound == chord)
        .map(|(_, command)| *command)
}

/// Resolves a chord string to the bound command, if any.
pub fn dispatch(chord: &str) -> Option<EditorCommand> {
    KeyChord::parse(chord).and_then(command_for)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_table() {
        assert_eq!(dispatch("Mod+S"), Some(EditorCommand::Save));
        assert_eq!(dispatch("Mod+Shift+C"), Some(EditorCommand::Copy));
        assert_eq!(dispatch("Mod+Z"), Some(EditorCommand::Undo));
        assert_eq!(dispatch("Mod+Shift+Z"), Some(EditorCommand::Redo));
        assert_eq!(dispatch("Mod+Y"), Some(EditorCommand::Redo));
        assert_eq!(dispatch("Mod+E"), Some(EditorCommand::Export));
        assert_eq!(dispatch("Mod+P"), Some(EditorCommand::Preview));
    }

    #[test]
    fn test_aliases_and_order() {
        assert_eq!(dispatch("ctrl+s"), Some(EditorCommand::Save));
        assert_eq!(dispatch("Shift+Cmd+z"), Some(EditorCommand::Redo));
    }

    #[test]
    fn test_unbound_chords() {
        assert_eq!(dispatch("S"), None);
        assert_eq!(dispatch("Mod+C"), None);
        assert_eq!(dispatch("Mod+Alt+S"), None);
    }

    #[test]
    fn test_malformed_chords() {
        assert_eq!(KeyChord::parse("Mod+"), None);
        assert_eq!(KeyChord::parse("Mod+S+T"), None);
        assert_eq!(KeyChord::parse("Mod+Enter"), None);
    }
}
