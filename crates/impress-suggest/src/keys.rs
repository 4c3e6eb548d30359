//! Key events and per-matcher key bindings.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::handlers::SuggestContext;

/// A key that can be bound while a suggestion is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    Space,
    Char(char),
}

impl Key {
    /// Display name, e.g. "Enter", "ArrowUp" or the character itself.
    pub fn name(&self) -> String {
        match self {
            Key::Enter => "Enter".to_string(),
            Key::Escape => "Escape".to_string(),
            Key::Tab => "Tab".to_string(),
            Key::Backspace => "Backspace".to_string(),
            Key::Delete => "Delete".to_string(),
            Key::ArrowUp => "ArrowUp".to_string(),
            Key::ArrowDown => "ArrowDown".to_string(),
            Key::ArrowLeft => "ArrowLeft".to_string(),
            Key::ArrowRight => "ArrowRight".to_string(),
            Key::Home => "Home".to_string(),
            Key::End => "End".to_string(),
            Key::Space => "Space".to_string(),
            Key::Char(c) => c.to_string(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Key {
    type Err = String;

    /// Parse a key name. Accepts the DOM-style names and a few short aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s {
            "Enter" | "Return" => Key::Enter,
            "Escape" | "Esc" => Key::Escape,
            "Tab" => Key::Tab,
            "Backspace" => Key::Backspace,
            "Delete" | "Del" => Key::Delete,
            "ArrowUp" | "Up" => Key::ArrowUp,
            "ArrowDown" | "Down" => Key::ArrowDown,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            "Home" => Key::Home,
            "End" => Key::End,
            "Space" | " " => Key::Space,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return Err(format!("unknown key: {other}")),
                }
            }
        };
        Ok(key)
    }
}

/// A key press delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct KeyEvent {
    pub key: Key,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyEvent {
    /// A key press with no modifiers.
    pub fn new(key: Key) -> Self {
        Self {
            key,
            shift: false,
            ctrl: false,
            alt: false,
            meta: false,
        }
    }

    pub fn shift(key: Key) -> Self {
        Self {
            shift: true,
            ..Self::new(key)
        }
    }

    pub fn ctrl(key: Key) -> Self {
        Self {
            ctrl: true,
            ..Self::new(key)
        }
    }

    /// Whether any modifier is held.
    pub fn has_modifiers(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// A key handler. Returning `true` suppresses the host's default handling.
pub type KeyHandler<K> = Box<dyn FnMut(&mut SuggestContext<'_, K>) -> bool>;

/// Key handlers of one matcher.
pub struct KeyBindings<K> {
    bindings: HashMap<Key, KeyHandler<K>>,
}

impl<K> Default for KeyBindings<K> {
    fn default() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }
}

impl<K> KeyBindings<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `key`, replacing any earlier binding.
    pub fn bind(
        mut self,
        key: Key,
        handler: impl FnMut(&mut SuggestContext<'_, K>) -> bool + 'static,
    ) -> Self {
        self.bindings.insert(key, Box::new(handler));
        self
    }

    pub fn get_mut(&mut self, key: &Key) -> Option<&mut KeyHandler<K>> {
        self.bindings.get_mut(key)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.bindings.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<K> fmt::Debug for KeyBindings<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.bindings.keys().map(Key::name).collect();
        keys.sort();
        f.debug_struct("KeyBindings").field("keys", &keys).finish()
    }
}
