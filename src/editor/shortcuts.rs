//! Keyboard shortcuts for the editor session
//!
//! Chords are written `ctrl+shift+z`; `cmd`/`meta` count as `ctrl`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DagError;

/// Actions a shortcut can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorAction {
    DeleteSelected,
    ClearSelection,
    SelectAll,
    AddNode,
    AutoLayout,
    Export,
    ToggleJsonPanel,
    Undo,
    Redo,
}

impl EditorAction {
    pub fn label(&self) -> &'static str {
        match self {
            EditorAction::DeleteSelected => "Delete selected nodes and edges",
            EditorAction::ClearSelection => "Clear selection",
            EditorAction::SelectAll => "Select all nodes and edges",
            EditorAction::AddNode => "Add a node",
            EditorAction::AutoLayout => "Auto layout (top to bottom)",
            EditorAction::Export => "Export graph as JSON",
            EditorAction::ToggleJsonPanel => "Toggle JSON preview panel",
            EditorAction::Undo => "Undo",
            EditorAction::Redo => "Redo",
        }
    }
}

/// Non-modifier key of a chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Delete,
    Backspace,
    Escape,
}

/// A parsed key chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shortcut {
    pub ctrl: bool,
    pub shift: bool,
    pub key: Key,
}

impl Shortcut {
    /// Action bound to this chord, if any
    pub fn action(&self) -> Option<EditorAction> {
        match (self.ctrl, self.shift, self.key) {
            (_, _, Key::Delete | Key::Backspace) => Some(EditorAction::DeleteSelected),
            (_, _, Key::Escape) => Some(EditorAction::ClearSelection),
            (true, _, Key::Enter) => Some(EditorAction::AddNode),
            (true, true, Key::Char('z')) => Some(EditorAction::Redo),
            (true, false, Key::Char('z')) => Some(EditorAction::Undo),
            (true, _, Key::Char('a')) => Some(EditorAction::SelectAll),
            (true, _, Key::Char('l')) => Some(EditorAction::AutoLayout),
            (true, _, Key::Char('s')) => Some(EditorAction::Export),
            (true, _, Key::Char('h')) => Some(EditorAction::ToggleJsonPanel),
            _ => None,
        }
    }
}

impl FromStr for Shortcut {
    type Err = DagError;

    fn from_str(chord: &str) -> Result<Self, Self::Err> {
        let unknown = || DagError::UnknownShortcut {
            chord: chord.to_string(),
        };

        let lowered = chord.trim().to_ascii_lowercase();
        let mut parts: Vec<&str> = lowered.split('+').map(str::trim).collect();
        let key_part = parts.pop().filter(|k| !k.is_empty()).ok_or_else(unknown)?;

        let mut ctrl = false;
        let mut shift = false;
        for modifier in parts {
            match modifier {
                "ctrl" | "control" | "cmd" | "meta" => ctrl = true,
                "shift" => shift = true,
                _ => return Err(unknown()),
            }
        }

        let key = match key_part {
            "enter" | "return" => Key::Enter,
            "delete" | "del" => Key::Delete,
            "backspace" => Key::Backspace,
            "escape" | "esc" => Key::Escape,
            single if single.chars().count() == 1 => {
                single.chars().next().map(Key::Char).ok_or_else(unknown)?
            }
            _ => return Err(unknown()),
        };

        Ok(Self { ctrl, shift, key })
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("ctrl+")?;
        }
        if self.shift {
            f.write_str("shift+")?;
        }
        match self.key {
            Key::Char(c) => write!(f, "{}", c),
            Key::Enter => f.write_str("enter"),
            Key::Delete => f.write_str("delete"),
            Key::Backspace => f.write_str("backspace"),
            Key::Escape => f.write_str("escape"),
        }
    }
}

/// Shortcut table entry (for help output)
#[derive(Debug, Clone, Copy)]
pub struct Binding {
    pub chord: &'static str,
    pub action: EditorAction,
}

/// Default shortcut table
pub const BINDINGS: &[Binding] = &[
    Binding { chord: "delete", action: EditorAction::DeleteSelected },
    Binding { chord: "backspace", action: EditorAction::DeleteSelected },
    Binding { chord: "escape", action: EditorAction::ClearSelection },
    Binding { chord: "ctrl+a", action: EditorAction::SelectAll },
    Binding { chord: "ctrl+enter", action: EditorAction::AddNode },
    Binding { chord: "ctrl+l", action: EditorAction::AutoLayout },
    Binding { chord: "ctrl+s", action: EditorAction::Export },
    Binding { chord: "ctrl+h", action: EditorAction::ToggleJsonPanel },
    Binding { chord: "ctrl+z", action: EditorAction::Undo },
    Binding { chord: "ctrl+shift+z", action: EditorAction::Redo },
];
