//! User handlers registered per matcher.

use std::fmt;

use crate::command::{AnnotationOverrides, CommandOutcome, CommandRunner, SuggestCommand};
use crate::host::MarkEditor;
use crate::keys::{Key, KeyBindings, KeyEvent};
use crate::reason::ReasonedMatch;

/// Handler for the change and exit channels.
pub type SuggestHandler<K> = Box<dyn FnMut(&mut SuggestContext<'_, K>)>;

/// Handler for typed text while a match is visible. `true` consumes the input.
pub type CharacterEntryHandler<K> = Box<dyn FnMut(&CharacterEntry<'_, K>) -> bool>;

/// What a handler sees: the reasoned match, its bound command, and the
/// triggering key for key bindings.
pub struct SuggestContext<'a, K> {
    pub matched: &'a ReasonedMatch<K>,
    pub command: &'a SuggestCommand<K>,
    /// The key press being routed, for key bindings.
    pub key: Option<&'a KeyEvent>,
    runner: CommandRunner<'a>,
    dismissed: bool,
}

impl<'a, K> SuggestContext<'a, K> {
    pub(crate) fn new(
        matched: &'a ReasonedMatch<K>,
        command: &'a SuggestCommand<K>,
        key: Option<&'a KeyEvent>,
        runner: CommandRunner<'a>,
    ) -> Self {
        Self {
            matched,
            command,
            key,
            runner,
            dismissed: false,
        }
    }

    /// Run the bound command with its derived defaults.
    pub fn run(&mut self) -> CommandOutcome {
        self.run_with(&AnnotationOverrides::default())
    }

    /// Run the bound command with caller-supplied attributes.
    pub fn run_with(&mut self, overrides: &AnnotationOverrides) -> CommandOutcome {
        self.runner.run(self.command, overrides)
    }

    /// Stop suggesting for this occurrence until its text is deleted.
    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed
    }

    pub fn editor(&self) -> &dyn MarkEditor {
        self.runner.editor()
    }
}

/// Text typed while a match is visible.
#[derive(Debug)]
pub struct CharacterEntry<'a, K> {
    pub text: &'a str,
    pub from: usize,
    pub to: usize,
    pub matched: &'a ReasonedMatch<K>,
}

/// Handlers of one matcher.
pub struct MatcherHandlers<K> {
    pub(crate) on_change: Option<SuggestHandler<K>>,
    pub(crate) on_exit: Option<SuggestHandler<K>>,
    pub(crate) on_character_entry: Option<CharacterEntryHandler<K>>,
    pub(crate) key_bindings: KeyBindings<K>,
}

impl<K> Default for MatcherHandlers<K> {
    fn default() -> Self {
        Self {
            on_change: None,
            on_exit: None,
            on_character_entry: None,
            key_bindings: KeyBindings::default(),
        }
    }
}

impl<K> MatcherHandlers<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called for `Start` and `Change`.
    pub fn on_change(mut self, handler: impl FnMut(&mut SuggestContext<'_, K>) + 'static) -> Self {
        self.on_change = Some(Box::new(handler));
        self
    }

    /// Called for `Exit`, `Split`, `InvalidSplit` and `Removed`.
    pub fn on_exit(mut self, handler: impl FnMut(&mut SuggestContext<'_, K>) + 'static) -> Self {
        self.on_exit = Some(Box::new(handler));
        self
    }

    pub fn on_character_entry(
        mut self,
        handler: impl FnMut(&CharacterEntry<'_, K>) -> bool + 'static,
    ) -> Self {
        self.on_character_entry = Some(Box::new(handler));
        self
    }

    pub fn key_bindings(mut self, key_bindings: KeyBindings<K>) -> Self {
        self.key_bindings = key_bindings;
        self
    }

    /// Shorthand for adding one key binding.
    pub fn bind_key(
        mut self,
        key: Key,
        handler: impl FnMut(&mut SuggestContext<'_, K>) -> bool + 'static,
    ) -> Self {
        self.key_bindings = self.key_bindings.bind(key, handler);
        self
    }
}

impl<K> fmt::Debug for MatcherHandlers<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatcherHandlers")
            .field("on_change", &self.on_change.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .field("on_character_entry", &self.on_character_entry.is_some())
            .field("key_bindings", &self.key_bindings)
            .finish()
    }
}
