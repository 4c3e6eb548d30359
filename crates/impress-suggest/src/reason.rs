//! Reason classifier.
//!
//! Diffs the previous cycle's match against the freshly scanned one and
//! decides which user handlers are due.
//!
//! # Decision table
//!
//! Evaluated top to bottom, first hit wins:
//!
//! | previous | next | outcome |
//! |----------|------|---------|
//! | none | none | nothing |
//! | none | some | `change = Start(next)` |
//! | some | none | `exit = Removed / InvalidSplit / Split / Exit` |
//! | some | some, same occurrence | `change = Change(next)` or a silent `Move` |
//! | some | some, other occurrence | `Jump`: `exit = Exit(previous)`, `change = Start(next)` |
//!
//! The exit reasons are checked in the order listed: a removed backing mark
//! can also look like an invalid split. A `Split` fragment is reported on the
//! exit channel and also stays active as the next match.

use serde::Serialize;

use crate::suggestion::Match;

/// Lifecycle transition between two cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// A match appeared where there was none.
    Start,
    /// The query text of the active match changed.
    Change,
    /// The cursor moved inside unchanged text.
    Move,
    /// One edit left one match and entered another.
    Jump,
    /// An edit inside the match cut it in two.
    Split,
    /// The matched text is no longer valid (trigger deleted, space after trigger).
    InvalidSplit,
    /// The backing annotation mark was removed.
    Removed,
    /// The cursor left otherwise valid text.
    Exit,
}

impl Reason {
    /// Reasons delivered through the exit channel.
    pub fn is_exit(&self) -> bool {
        matches!(
            self,
            Reason::Split | Reason::InvalidSplit | Reason::Removed | Reason::Exit
        )
    }

    /// Reasons whose command removes the annotation instead of writing it.
    pub fn is_removal(&self) -> bool {
        matches!(self, Reason::InvalidSplit | Reason::Removed)
    }
}

/// A match tagged with the reason it is being reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReasonedMatch<K> {
    #[serde(flatten)]
    pub matched: Match<K>,
    pub reason: Reason,
}

impl<K> ReasonedMatch<K> {
    pub fn new(matched: Match<K>, reason: Reason) -> Self {
        Self { matched, reason }
    }
}

/// The handler channel a reasoned match is delivered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    Change,
    Exit,
}

/// Handlers due for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingHandlers<K> {
    pub change: Option<ReasonedMatch<K>>,
    pub exit: Option<ReasonedMatch<K>>,
}

impl<K> Default for PendingHandlers<K> {
    fn default() -> Self {
        Self {
            change: None,
            exit: None,
        }
    }
}

impl<K> PendingHandlers<K> {
    pub fn is_empty(&self) -> bool {
        self.change.is_none() && self.exit.is_none()
    }

    pub fn clear(&mut self) {
        self.change = None;
        self.exit = None;
    }

    /// Handlers in the order they must fire.
    ///
    /// The match with the larger `from` fires last so that a document change
    /// made by the first handler cannot shift the offsets the second relies on.
    pub fn firing_order(&self) -> Vec<(HandlerKind, &ReasonedMatch<K>)> {
        match (&self.change, &self.exit) {
            (Some(change), Some(exit)) => {
                if change.matched.range.from < exit.matched.range.from {
                    vec![(HandlerKind::Change, change), (HandlerKind::Exit, exit)]
                } else {
                    vec![(HandlerKind::Exit, exit), (HandlerKind::Change, change)]
                }
            }
            (Some(change), None) => vec![(HandlerKind::Change, change)],
            (None, Some(exit)) => vec![(HandlerKind::Exit, exit)],
            (None, None) => Vec::new(),
        }
    }
}

/// What the edit did to the previous match, gathered by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvidence<K> {
    /// Whether the edit changed document content.
    pub doc_changed: bool,
    /// Start of the previous match mapped into the new document.
    pub mapped_from: usize,
    /// The previous match was backed by an annotation mark that is now gone.
    pub mark_removed: bool,
    /// The occurrence that still starts at `mapped_from`, if any.
    pub recheck: Option<Match<K>>,
    /// An edit landed strictly inside the previous range.
    pub edit_inside: bool,
}

impl<K> ChangeEvidence<K> {
    /// Evidence for a cycle that only moved the selection.
    pub fn unchanged(previous: &Match<K>) -> Self {
        Self {
            doc_changed: false,
            mapped_from: previous.range.from,
            mark_removed: false,
            recheck: None,
            edit_inside: false,
        }
    }
}

/// Result of classifying one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification<K> {
    pub handlers: PendingHandlers<K>,
    /// Cycle-level transition, `None` when nothing happened.
    pub transition: Option<Reason>,
    /// Reason attached to the match that stays active, if any.
    pub active_reason: Option<Reason>,
    /// Split fragment that becomes the active match although the cursor
    /// no longer sits inside it.
    pub promoted: Option<Match<K>>,
}

impl<K> Classification<K> {
    fn none() -> Self {
        Self {
            handlers: PendingHandlers::default(),
            transition: None,
            active_reason: None,
            promoted: None,
        }
    }
}

/// Classify the transition from `previous` to `next`.
pub fn classify<K: Clone + PartialEq>(
    previous: Option<(&Match<K>, &ChangeEvidence<K>)>,
    next: Option<&Match<K>>,
) -> Classification<K> {
    match (previous, next) {
        (None, None) => Classification::none(),

        (None, Some(next)) => Classification {
            handlers: PendingHandlers {
                change: Some(ReasonedMatch::new(next.clone(), Reason::Start)),
                exit: None,
            },
            transition: Some(Reason::Start),
            active_reason: Some(Reason::Start),
            promoted: None,
        },

        (Some((previous, evidence)), None) => {
            let exit = exit_reason(previous, evidence);
            let promoted = (exit.reason == Reason::Split).then(|| exit.matched.clone());
            Classification {
                transition: Some(exit.reason),
                active_reason: promoted.as_ref().map(|_| Reason::Split),
                promoted,
                handlers: PendingHandlers {
                    change: None,
                    exit: Some(exit),
                },
            }
        }

        (Some((previous, evidence)), Some(next)) => {
            if previous.is_same_occurrence(next, evidence.mapped_from) {
                if previous.query.full != next.query.full {
                    Classification {
                        handlers: PendingHandlers {
                            change: Some(ReasonedMatch::new(next.clone(), Reason::Change)),
                            exit: None,
                        },
                        transition: Some(Reason::Change),
                        active_reason: Some(Reason::Change),
                        promoted: None,
                    }
                } else {
                    Classification {
                        handlers: PendingHandlers::default(),
                        transition: Some(Reason::Move),
                        active_reason: Some(Reason::Move),
                        promoted: None,
                    }
                }
            } else {
                Classification {
                    handlers: PendingHandlers {
                        change: Some(ReasonedMatch::new(next.clone(), Reason::Start)),
                        exit: Some(ReasonedMatch::new(previous.clone(), Reason::Exit)),
                    },
                    transition: Some(Reason::Jump),
                    active_reason: Some(Reason::Start),
                    promoted: None,
                }
            }
        }
    }
}

fn exit_reason<K: Clone>(previous: &Match<K>, evidence: &ChangeEvidence<K>) -> ReasonedMatch<K> {
    if !evidence.doc_changed {
        return ReasonedMatch::new(previous.clone(), Reason::Exit);
    }
    if evidence.mark_removed {
        return ReasonedMatch::new(previous.clone(), Reason::Removed);
    }
    match &evidence.recheck {
        None => ReasonedMatch::new(previous.clone(), Reason::InvalidSplit),
        Some(fragment)
            if evidence.edit_inside && fragment.text.full.len() < previous.text.full.len() =>
        {
            ReasonedMatch::new(fragment.clone(), Reason::Split)
        }
        Some(_) => ReasonedMatch::new(previous.clone(), Reason::Exit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggestion::{MatchRange, MatchText};

    fn found(matcher: &'static str, from: usize, text: &str) -> Match<&'static str> {
        let end = from + text.len();
        Match {
            matcher,
            name: matcher.to_string(),
            char: "@".to_string(),
            range: MatchRange { from, to: end, end },
            query: MatchText {
                partial: text[1..].to_string(),
                full: text[1..].to_string(),
            },
            text: MatchText {
                partial: text.to_string(),
                full: text.to_string(),
            },
        }
    }

    fn changed(previous: &Match<&'static str>) -> ChangeEvidence<&'static str> {
        ChangeEvidence {
            doc_changed: true,
            mapped_from: previous.range.from,
            mark_removed: false,
            recheck: Some(previous.clone()),
            edit_inside: false,
        }
    }

    #[test]
    fn nothing_to_nothing() {
        let result = classify::<&str>(None, None);
        assert!(result.handlers.is_empty());
        assert_eq!(result.transition, None);
    }

    #[test]
    fn start() {
        let next = found("at", 0, "@a");
        let result = classify(None, Some(&next));
        assert_eq!(result.handlers.change.unwrap().reason, Reason::Start);
        assert!(result.handlers.exit.is_none());
    }

    #[test]
    fn change_and_move() {
        let previous = found("at", 0, "@a");
        let evidence = changed(&previous);
        let next = found("at", 0, "@ab");
        let result = classify(Some((&previous, &evidence)), Some(&next));
        assert_eq!(result.handlers.change.unwrap().reason, Reason::Change);

        let mut moved = previous.clone();
        moved.range.to = 1;
        let result = classify(Some((&previous, &ChangeEvidence::unchanged(&previous))), Some(&moved));
        assert!(result.handlers.is_empty());
        assert_eq!(result.transition, Some(Reason::Move));
    }

    #[test]
    fn jump_between_matchers() {
        let previous = found("at", 0, "@a");
        let next = found("tag", 0, "#a");
        let result = classify(Some((&previous, &ChangeEvidence::unchanged(&previous))), Some(&next));
        assert_eq!(result.transition, Some(Reason::Jump));
        assert_eq!(result.handlers.exit.as_ref().unwrap().reason, Reason::Exit);
        assert_eq!(result.handlers.change.as_ref().unwrap().reason, Reason::Start);
    }

    #[test]
    fn exit_priority() {
        let previous = found("at", 4, "@alice");

        let mut evidence = changed(&previous);
        evidence.mark_removed = true;
        evidence.recheck = None;
        assert_eq!(exit_reason(&previous, &evidence).reason, Reason::Removed);

        evidence.mark_removed = false;
        assert_eq!(exit_reason(&previous, &evidence).reason, Reason::InvalidSplit);

        evidence.recheck = Some(found("at", 4, "@al"));
        evidence.edit_inside = true;
        let split = exit_reason(&previous, &evidence);
        assert_eq!(split.reason, Reason::Split);
        assert_eq!(split.matched.text.full, "@al");

        evidence.edit_inside = false;
        assert_eq!(exit_reason(&previous, &evidence).reason, Reason::Exit);

        let evidence = ChangeEvidence::unchanged(&previous);
        assert_eq!(exit_reason(&previous, &evidence).reason, Reason::Exit);
    }

    #[test]
    fn split_fragment_stays_active() {
        let previous = found("at", 0, "@alice");
        let mut evidence = changed(&previous);
        evidence.recheck = Some(found("at", 0, "@al"));
        evidence.edit_inside = true;

        let result = classify(Some((&previous, &evidence)), None);
        assert_eq!(result.transition, Some(Reason::Split));
        assert_eq!(result.active_reason, Some(Reason::Split));
        assert_eq!(result.promoted.unwrap().text.full, "@al");
        assert_eq!(result.handlers.exit.unwrap().reason, Reason::Split);

        evidence.edit_inside = false;
        let result = classify(Some((&previous, &evidence)), None);
        assert_eq!(result.transition, Some(Reason::Exit));
        assert!(result.promoted.is_none());
        assert!(result.active_reason.is_none());
    }

    #[test]
    fn firing_order_follows_offsets() {
        let handlers = PendingHandlers {
            exit: Some(ReasonedMatch::new(found("at", 10, "@a"), Reason::Exit)),
            change: Some(ReasonedMatch::new(found("at", 20, "@b"), Reason::Start)),
        };
        let order: Vec<_> = handlers.firing_order().into_iter().map(|(kind, _)| kind).collect();
        assert_eq!(order, vec![HandlerKind::Exit, HandlerKind::Change]);

        let handlers = PendingHandlers {
            exit: Some(ReasonedMatch::new(found("at", 20, "@a"), Reason::Exit)),
            change: Some(ReasonedMatch::new(found("at", 10, "@b"), Reason::Start)),
        };
        let order: Vec<_> = handlers.firing_order().into_iter().map(|(kind, _)| kind).collect();
        assert_eq!(order, vec![HandlerKind::Change, HandlerKind::Exit]);
    }
}
