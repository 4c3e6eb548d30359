//! Suggestion controller.
//!
//! The only stateful component. One controller belongs to one editor
//! instance; the host calls [`Controller::apply`] once per edit cycle and then
//! [`Controller::dispatch`] to fire the handlers that cycle produced.
//!
//! # Example
//!
//! ```
//! use impress_suggest::{Controller, MatcherHandlers, MatcherSpec, MemoryDocument};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum Trigger {
//!     Mention,
//! }
//!
//! let mut controller = Controller::new();
//! controller
//!     .register(MatcherSpec::new("at", "@").build(Trigger::Mention).unwrap(), MatcherHandlers::new())
//!     .unwrap();
//!
//! let mut doc = MemoryDocument::new("");
//! let before = doc.clone();
//! let edit = doc.type_text("@al");
//! controller.apply(&edit, &before, &doc);
//!
//! let highlight = controller.decoration().unwrap();
//! assert_eq!((highlight.from, highlight.to), (0, 3));
//! ```

use std::fmt;

use tracing::{debug, trace};

use crate::command::{AnnotationOverrides, CommandFlags, CommandOutcome, CommandRunner, SuggestCommand};
use crate::config::MatcherConfig;
use crate::decoration::Highlight;
use crate::error::{Result, SuggestError};
use crate::handlers::{CharacterEntry, MatcherHandlers, SuggestContext};
use crate::host::{Assoc, Edit, MarkEditor, SuggestDocument};
use crate::keys::KeyEvent;
use crate::reason::{classify, ChangeEvidence, HandlerKind, PendingHandlers, Reason, ReasonedMatch};
use crate::scanner::{scan, scan_at};
use crate::suggestion::Match;

/// What one call to [`Controller::apply`] decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome<K> {
    /// Handlers due this cycle.
    pub handlers: PendingHandlers<K>,
    /// Cycle-level transition, `None` for no-op cycles.
    pub transition: Option<Reason>,
    /// A removal command ran since the last cycle; pending state was reset.
    pub should_force_reset: bool,
}

struct Registered<K> {
    config: MatcherConfig<K>,
    handlers: MatcherHandlers<K>,
}

/// A dismissed occurrence, skipped by the scanner until its text goes away.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IgnoredMatch<K> {
    from: usize,
    matcher: K,
}

impl<K: PartialEq> IgnoredMatch<K> {
    /// Add the occurrence to `ignored` unless it is already there.
    fn insert(ignored: &mut Vec<Self>, from: usize, matcher: K) {
        if !ignored.iter().any(|i| i.from == from && i.matcher == matcher) {
            ignored.push(Self { from, matcher });
        }
    }
}

/// Orchestrates scanning, classification and handler dispatch.
pub struct Controller<K> {
    matchers: Vec<Registered<K>>,
    previous: Option<Match<K>>,
    next: Option<Match<K>>,
    active_reason: Option<Reason>,
    pending: PendingHandlers<K>,
    dispatched: bool,
    flags: CommandFlags,
    ignored: Vec<IgnoredMatch<K>>,
    ignore_next_exit: bool,
    needs_rescan: bool,
}

impl<K> Default for Controller<K> {
    fn default() -> Self {
        Self {
            matchers: Vec::new(),
            previous: None,
            next: None,
            active_reason: None,
            pending: PendingHandlers::default(),
            dispatched: true,
            flags: CommandFlags::default(),
            ignored: Vec::new(),
            ignore_next_exit: false,
            needs_rescan: false,
        }
    }
}

impl<K: Clone + PartialEq + fmt::Debug> Controller<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a matcher with its handlers.
    ///
    /// Matchers scan in descending priority; equal priorities keep
    /// registration order.
    pub fn register(&mut self, config: MatcherConfig<K>, handlers: MatcherHandlers<K>) -> Result<()> {
        let duplicate = self
            .matchers
            .iter()
            .any(|r| r.config.key() == config.key() || r.config.name() == config.name());
        if duplicate {
            return Err(SuggestError::DuplicateMatcher(config.name().to_string()));
        }

        let index = self
            .matchers
            .iter()
            .position(|r| r.config.priority() < config.priority())
            .unwrap_or(self.matchers.len());
        debug!(matcher = config.name(), priority = config.priority(), index, "registered matcher");
        self.matchers.insert(index, Registered { config, handlers });
        Ok(())
    }

    /// Builder form of [`Controller::register`].
    pub fn with_matcher(mut self, config: MatcherConfig<K>, handlers: MatcherHandlers<K>) -> Result<Self> {
        self.register(config, handlers)?;
        Ok(self)
    }

    /// Registered matchers in scan order.
    pub fn matchers(&self) -> impl Iterator<Item = &MatcherConfig<K>> {
        self.matchers.iter().map(|r| &r.config)
    }

    pub fn config(&self, key: &K) -> Option<&MatcherConfig<K>> {
        self.registered(key).map(|r| &r.config)
    }

    pub fn previous(&self) -> Option<&Match<K>> {
        self.previous.as_ref()
    }

    /// The active match, if any.
    pub fn next(&self) -> Option<&Match<K>> {
        self.next.as_ref()
    }

    pub fn pending(&self) -> &PendingHandlers<K> {
        &self.pending
    }

    /// Run one edit cycle: scan, classify and cache the handlers due.
    pub fn apply<E, D>(&mut self, edit: &E, old: &D, new: &D) -> CycleOutcome<K>
    where
        E: Edit + ?Sized,
        D: SuggestDocument + ?Sized,
    {
        let flags = std::mem::take(&mut self.flags);
        let should_force_reset = flags.removed;
        if should_force_reset || self.pending.exit.is_some() {
            self.pending.clear();
        }
        if should_force_reset {
            debug!("removal ran since last cycle, pending handlers reset");
        }

        self.map_ignored(edit, new);

        let rescan = std::mem::take(&mut self.needs_rescan);
        if !edit.doc_changed() && !edit.selection_set() && !should_force_reset && !rescan {
            trace!("no-op edit, nothing to classify");
            self.pending.clear();
            return CycleOutcome {
                handlers: PendingHandlers::default(),
                transition: None,
                should_force_reset: false,
            };
        }

        let previous = self.next.take();
        let next = self.scan_next(new);
        let evidence = previous
            .as_ref()
            .map(|previous| self.evidence(previous, edit, old, new));
        let mut classification = classify(previous.as_ref().zip(evidence.as_ref()), next.as_ref());

        if flags.written {
            if let Some(exit) = classification.handlers.exit.take() {
                debug!(matcher = %exit.matched.name, reason = ?exit.reason, "exit caused by annotation write");
            }
        } else if self.ignore_next_exit {
            if let Some(exit) = classification.handlers.exit.take() {
                debug!(matcher = %exit.matched.name, reason = ?exit.reason, "exit suppressed");
                self.ignore_next_exit = false;
            }
        }

        if let Some(transition) = classification.transition {
            debug!(
                ?transition,
                change = ?classification.handlers.change.as_ref().map(|m| m.reason),
                exit = ?classification.handlers.exit.as_ref().map(|m| m.reason),
                "suggest cycle"
            );
        }

        self.previous = previous;
        self.next = next.or(classification.promoted);
        self.active_reason = classification.active_reason;
        self.pending = classification.handlers;
        self.dispatched = self.pending.is_empty();

        CycleOutcome {
            handlers: self.pending.clone(),
            transition: classification.transition,
            should_force_reset,
        }
    }

    /// Fire the handlers cached by the last [`Controller::apply`], once.
    ///
    /// Returns the number of handlers invoked.
    pub fn dispatch(&mut self, editor: &mut dyn MarkEditor) -> usize {
        if self.dispatched {
            return 0;
        }
        self.dispatched = true;

        let pending = self.pending.clone();
        let mut fired = 0;
        for (kind, matched) in pending.firing_order() {
            let Some(index) = self.index_of(&matched.matched.matcher) else {
                continue;
            };
            let Self {
                matchers,
                flags,
                ignored,
                needs_rescan,
                ..
            } = self;
            let registered = &mut matchers[index];
            let handler = match kind {
                HandlerKind::Change => registered.handlers.on_change.as_mut(),
                HandlerKind::Exit => registered.handlers.on_exit.as_mut(),
            };
            let Some(handler) = handler else {
                continue;
            };

            let command = SuggestCommand::new(matched.clone(), &registered.config);
            let mut context = SuggestContext::new(matched, &command, None, CommandRunner::new(&mut *editor, flags));
            handler(&mut context);
            if context.is_dismissed() {
                IgnoredMatch::insert(ignored, matched.matched.range.from, matched.matched.matcher.clone());
                *needs_rescan = true;
            }
            fired += 1;
        }
        fired
    }

    /// The match the host should currently show.
    ///
    /// Prefers the active match; falls back to the exiting match until its
    /// exit handler has been dispatched.
    pub fn visible_match(&self) -> Option<ReasonedMatch<K>> {
        if let Some(next) = &self.next {
            let reason = self.active_reason.unwrap_or(Reason::Change);
            return Some(ReasonedMatch::new(next.clone(), reason));
        }
        if self.dispatched {
            return None;
        }
        self.pending.exit.clone()
    }

    /// Highlight for the visible match.
    pub fn decoration(&self) -> Option<Highlight> {
        self.visible_match().map(|visible| Highlight::for_match(&visible.matched))
    }

    /// Route a key press to the visible matcher's bindings.
    ///
    /// Returns `true` when a handler consumed the key.
    pub fn handle_key_down(&mut self, event: &KeyEvent, editor: &mut dyn MarkEditor) -> bool {
        let Some(visible) = self.visible_match() else {
            return false;
        };
        let Some(index) = self.index_of(&visible.matched.matcher) else {
            return false;
        };

        let Self {
            matchers,
            flags,
            ignored,
            needs_rescan,
            ..
        } = self;
        let registered = &mut matchers[index];
        let Some(handler) = registered.handlers.key_bindings.get_mut(&event.key) else {
            return false;
        };

        let command = SuggestCommand::new(visible.clone(), &registered.config);
        let mut context = SuggestContext::new(&visible, &command, Some(event), CommandRunner::new(editor, flags));
        let handled = handler(&mut context);
        trace!(key = %event.key, matcher = %visible.matched.name, handled, "key routed");
        if context.is_dismissed() {
            IgnoredMatch::insert(ignored, visible.matched.range.from, visible.matched.matcher.clone());
            *needs_rescan = true;
        }
        handled
    }

    /// Forward typed text to the visible matcher's character-entry handler.
    pub fn handle_text_input(&mut self, text: &str, from: usize, to: usize) -> bool {
        let Some(visible) = self.visible_match() else {
            return false;
        };
        let Some(index) = self.index_of(&visible.matched.matcher) else {
            return false;
        };
        let Some(handler) = self.matchers[index].handlers.on_character_entry.as_mut() else {
            return false;
        };
        handler(&CharacterEntry {
            text,
            from,
            to,
            matched: &visible,
        })
    }

    /// Command for the visible match of one matcher.
    ///
    /// `key` may be omitted only when a single matcher is registered.
    /// Returns `Ok(None)` when that matcher has no visible match.
    pub fn command(&self, key: Option<&K>) -> Result<Option<SuggestCommand<K>>> {
        let registered = match key {
            Some(key) => self
                .registered(key)
                .ok_or_else(|| SuggestError::UnknownMatcher(format!("{key:?}")))?,
            None => match self.matchers.as_slice() {
                [only] => only,
                [] => return Err(SuggestError::UnknownMatcher("no matchers registered".to_string())),
                many => return Err(SuggestError::AmbiguousMatcher(many.len())),
            },
        };

        Ok(self
            .visible_match()
            .filter(|visible| visible.matched.matcher == *registered.config.key())
            .map(|visible| SuggestCommand::new(visible, &registered.config)))
    }

    /// Run a command outside of a handler.
    pub fn run_command(
        &mut self,
        command: &SuggestCommand<K>,
        editor: &mut dyn MarkEditor,
        overrides: &AnnotationOverrides,
    ) -> CommandOutcome {
        CommandRunner::new(editor, &mut self.flags).run(command, overrides)
    }

    /// Whether a removal ran since the last cycle.
    pub fn is_reset_pending(&self) -> bool {
        self.flags.removed
    }

    /// Whether the next cycle must run even if the edit changed nothing.
    pub fn needs_cycle(&self) -> bool {
        self.flags.removed || self.needs_rescan
    }

    /// Suppress the occurrence of `matcher` starting at `from`.
    pub fn ignore_match(&mut self, from: usize, matcher: K) {
        IgnoredMatch::insert(&mut self.ignored, from, matcher);
        self.needs_rescan = true;
    }

    /// Forget every dismissed occurrence.
    pub fn clear_ignored(&mut self) {
        self.ignored.clear();
        self.needs_rescan = true;
    }

    /// Swallow the next exit handler.
    pub fn ignore_next_exit(&mut self) {
        self.ignore_next_exit = true;
    }

    /// Drop all cycle state, keeping registrations.
    pub fn reset(&mut self) {
        self.previous = None;
        self.next = None;
        self.active_reason = None;
        self.pending.clear();
        self.dispatched = true;
        self.flags = CommandFlags::default();
        self.ignore_next_exit = false;
        self.needs_rescan = false;
    }

    fn registered(&self, key: &K) -> Option<&Registered<K>> {
        self.matchers.iter().find(|r| r.config.key() == key)
    }

    fn index_of(&self, key: &K) -> Option<usize> {
        self.matchers.iter().position(|r| r.config.key() == key)
    }

    fn is_ignored(&self, found: &Match<K>) -> bool {
        self.ignored
            .iter()
            .any(|i| i.from == found.range.from && i.matcher == found.matcher)
    }

    fn scan_next<D: SuggestDocument + ?Sized>(&self, doc: &D) -> Option<Match<K>> {
        let selection = doc.selection();
        let cursor = selection.head;
        let block = doc.resolve_block(cursor)?;

        for registered in &self.matchers {
            if !selection.is_empty() && registered.config.empty_selections_only() {
                continue;
            }
            if let Some(found) = scan(&registered.config, &block, cursor) {
                if self.is_ignored(&found) {
                    trace!(matcher = registered.config.name(), from = found.range.from, "ignored match");
                    continue;
                }
                return Some(found);
            }
        }
        None
    }

    fn evidence<E, D>(&self, previous: &Match<K>, edit: &E, old: &D, new: &D) -> ChangeEvidence<K>
    where
        E: Edit + ?Sized,
        D: SuggestDocument + ?Sized,
    {
        if !edit.doc_changed() {
            return ChangeEvidence::unchanged(previous);
        }

        let range = previous.range;
        let mapped = edit.map_position(range.from, Assoc::After);
        let config = self.config(&previous.matcher);

        let mark_removed = config.is_some_and(|config| {
            old.is_mark_active(range.from..range.end, config.mark_kind())
                && new.mark_range_at(mapped.pos, config.mark_kind()).is_none()
        });

        let recheck = match config {
            Some(config) if !mapped.deleted => {
                let cursor = edit.map_position(range.to, Assoc::Before).pos;
                new.resolve_block(mapped.pos)
                    .and_then(|block| scan_at(config, &block, mapped.pos, cursor))
            }
            _ => None,
        };

        let edit_inside = edit
            .changed_ranges()
            .iter()
            .any(|changed| range.strictly_contains(changed.start));

        ChangeEvidence {
            doc_changed: true,
            mapped_from: mapped.pos,
            mark_removed,
            recheck,
            edit_inside,
        }
    }

    fn map_ignored<E, D>(&mut self, edit: &E, new: &D)
    where
        E: Edit + ?Sized,
        D: SuggestDocument + ?Sized,
    {
        if self.ignored.is_empty() || !edit.doc_changed() {
            return;
        }

        let ignored = std::mem::take(&mut self.ignored);
        self.ignored = ignored
            .into_iter()
            .filter_map(|mut item| {
                let mapped = edit.map_position(item.from, Assoc::After);
                if mapped.deleted {
                    return None;
                }
                item.from = mapped.pos;
                let config = self.config(&item.matcher)?;
                let block = new.resolve_block(item.from)?;
                scan_at(config, &block, item.from, item.from).map(|_| item)
            })
            .collect();
    }
}

impl<K: fmt::Debug> fmt::Debug for Controller<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.matchers.iter().map(|r| r.config.name()).collect();
        f.debug_struct("Controller")
            .field("matchers", &names)
            .field("previous", &self.previous)
            .field("next", &self.next)
            .field("pending", &self.pending)
            .field("flags", &self.flags)
            .finish()
    }
}
