//! Session driver.
//!
//! Couples a [`MemoryDocument`] with a [`Controller`] and runs the full edit
//! loop a host editor would: apply the edit, dispatch handlers, and feed any
//! edits the handlers' commands made back through the controller until the
//! document settles.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::controller::{Controller, CycleOutcome};
use crate::decoration::Highlight;
use crate::keys::{Key, KeyEvent};
use crate::memory::{MemoryDocument, MemoryEdit};
use crate::reason::{HandlerKind, ReasonedMatch};

/// Upper bound on apply/dispatch rounds for one user action.
pub const MAX_ROUNDS: usize = 8;

/// Something observable that happened during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent<K> {
    /// A change handler was due.
    Change(ReasonedMatch<K>),
    /// An exit handler was due.
    Exit(ReasonedMatch<K>),
    /// A removal ran and the controller reset its pending handlers.
    Reset,
    /// A key press was offered to the visible matcher.
    Key { key: Key, handled: bool },
    /// Typed text was consumed by a character-entry handler.
    TextConsumed { text: String },
}

/// A document and its controller, driven together.
pub struct Session<K> {
    doc: MemoryDocument,
    controller: Controller<K>,
    events: Vec<SessionEvent<K>>,
}

impl<K: Clone + PartialEq + fmt::Debug> Session<K> {
    pub fn new(doc: MemoryDocument, controller: Controller<K>) -> Self {
        Self {
            doc,
            controller,
            events: Vec::new(),
        }
    }

    pub fn doc(&self) -> &MemoryDocument {
        &self.doc
    }

    pub fn controller(&self) -> &Controller<K> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut Controller<K> {
        &mut self.controller
    }

    pub fn events(&self) -> &[SessionEvent<K>] {
        &self.events
    }

    /// Drain the recorded events.
    pub fn take_events(&mut self) -> Vec<SessionEvent<K>> {
        std::mem::take(&mut self.events)
    }

    pub fn decoration(&self) -> Option<Highlight> {
        self.controller.decoration()
    }

    /// Type `text` one character at a time.
    pub fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            let typed = c.to_string();
            let selection = self.doc.selection_range();
            if self
                .controller
                .handle_text_input(&typed, selection.start, selection.end)
            {
                self.events.push(SessionEvent::TextConsumed { text: typed });
                continue;
            }
            let before = self.doc.clone();
            let edit = self.doc.type_text(&typed);
            self.settle(edit, before);
        }
    }

    pub fn backspace(&mut self) {
        let before = self.doc.clone();
        let edit = self.doc.backspace();
        self.settle(edit, before);
    }

    /// Move the cursor by `delta` characters.
    pub fn move_cursor(&mut self, delta: isize) {
        let before = self.doc.clone();
        let edit = self.doc.move_cursor(delta);
        self.settle(edit, before);
    }

    /// Put the cursor at the byte offset `pos`.
    pub fn set_cursor(&mut self, pos: usize) {
        let before = self.doc.clone();
        let edit = self.doc.set_cursor(pos);
        self.settle(edit, before);
    }

    pub fn select(&mut self, anchor: usize, head: usize) {
        let before = self.doc.clone();
        let edit = self.doc.select(anchor, head);
        self.settle(edit, before);
    }

    /// Offer a key press to the visible matcher, falling back to the default
    /// editing action when no binding handles it.
    ///
    /// Returns whether a binding handled the key.
    pub fn press_key(&mut self, event: KeyEvent) -> bool {
        let before = self.doc.clone();
        let handled = self.controller.handle_key_down(&event, &mut self.doc);
        self.events.push(SessionEvent::Key {
            key: event.key,
            handled,
        });
        let edit = self.doc.take_journal();
        self.settle(edit, before);

        if !handled {
            match event.key {
                Key::Backspace => self.backspace(),
                Key::ArrowLeft => self.move_cursor(-1),
                Key::ArrowRight => self.move_cursor(1),
                Key::Home => {
                    let start = self.doc.block_start();
                    self.set_cursor(start);
                }
                Key::End => {
                    let end = self.doc.block_end();
                    self.set_cursor(end);
                }
                Key::Enter => self.type_text("\n"),
                Key::Space => self.type_text(" "),
                Key::Char(c) if !event.ctrl && !event.meta => self.type_text(&c.to_string()),
                _ => {}
            }
        }
        handled
    }

    /// Run cycles until neither handlers nor the controller ask for more.
    fn settle(&mut self, mut edit: MemoryEdit, mut before: MemoryDocument) {
        for round in 0..MAX_ROUNDS {
            let outcome = self.controller.apply(&edit, &before, &self.doc);
            self.record(&outcome);

            before = self.doc.clone();
            self.controller.dispatch(&mut self.doc);
            edit = self.doc.take_journal();

            if edit.is_empty() && !self.controller.needs_cycle() {
                if round > 0 {
                    debug!(rounds = round + 1, "session settled");
                }
                return;
            }
        }
        warn!(rounds = MAX_ROUNDS, "session did not settle, dropping remaining edits");
    }

    fn record(&mut self, outcome: &CycleOutcome<K>) {
        if outcome.should_force_reset {
            self.events.push(SessionEvent::Reset);
        }
        for (kind, matched) in outcome.handlers.firing_order() {
            self.events.push(match kind {
                HandlerKind::Change => SessionEvent::Change(matched.clone()),
                HandlerKind::Exit => SessionEvent::Exit(matched.clone()),
            });
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for Session<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("doc", &self.doc)
            .field("controller", &self.controller)
            .field("events", &self.events.len())
            .finish()
    }
}
