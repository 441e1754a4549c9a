use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// Everything the backend table reacts to while no input field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Quit,
    Up,
    Down,
    Top,
    Bottom,
    Refresh,
    ToggleAutoRefresh,
    Sync,
    EditWeight,
    SaveWeight,
    DiscardEdit,
    Filter,
    ClearFilter,
    Ping,
    AuditLog,
    Register,
    Settings,
}

/// Key bindings of the backend table, built once at startup.
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<(KeyModifiers, KeyCode), Command>,
}

impl Default for Keymap {
    fn default() -> Self {
        use Command::*;

        let none = KeyModifiers::NONE;
        let mut keymap = Keymap {
            bindings: HashMap::new(),
        };
        keymap
            .bind(KeyModifiers::CONTROL, KeyCode::Char('c'), Quit)
            .bind(none, KeyCode::Char('q'), Quit)
            .bind(none, KeyCode::Up, Up)
            .bind(none, KeyCode::Char('k'), Up)
            .bind(none, KeyCode::Down, Down)
            .bind(none, KeyCode::Char('j'), Down)
            .bind(none, KeyCode::Home, Top)
            .bind(none, KeyCode::End, Bottom)
            .bind(none, KeyCode::Char('r'), Refresh)
            .bind(none, KeyCode::Char('a'), ToggleAutoRefresh)
            .bind(none, KeyCode::Char('s'), Sync)
            .bind(none, KeyCode::Enter, EditWeight)
            .bind(none, KeyCode::Char('e'), EditWeight)
            .bind(none, KeyCode::Char('w'), SaveWeight)
            .bind(none, KeyCode::Char('x'), DiscardEdit)
            .bind(none, KeyCode::Char('/'), Filter)
            .bind(none, KeyCode::Esc, ClearFilter)
            .bind(none, KeyCode::Char('p'), Ping)
            .bind(none, KeyCode::Char('l'), AuditLog)
            .bind(none, KeyCode::Char('n'), Register)
            .bind(none, KeyCode::Char('c'), Settings);
        keymap
    }
}

impl Keymap {
    pub fn bind(&mut self, modifiers: KeyModifiers, code: KeyCode, command: Command) -> &mut Self {
        self.bindings.insert((modifiers, code), command);
        self
    }

    /// Resolves a key press; shifted characters match their plain binding.
    pub fn resolve(&self, key: &KeyEvent) -> Option<Command> {
        let modifiers = match key.code {
            KeyCode::Char(_) => key.modifiers.difference(KeyModifiers::SHIFT),
            _ => key.modifiers,
        };
        let code = match key.code {
            KeyCode::Char(c) if modifiers.is_empty() || modifiers == KeyModifiers::CONTROL => {
                KeyCode::Char(c.to_ascii_lowercase())
            }
            code => code,
        };
        self.bindings.get(&(modifiers, code)).copied()
    }
}
