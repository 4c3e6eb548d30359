//! Scan results.

use serde::Serialize;

/// Absolute document offsets of a match.
///
/// `from..to` covers the text up to the cursor, `from..end` the whole
/// occurrence. `to <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MatchRange {
    pub from: usize,
    pub to: usize,
    pub end: usize,
}

impl MatchRange {
    /// Whether `pos` lies in `from..=end`.
    pub fn contains(&self, pos: usize) -> bool {
        self.from <= pos && pos <= self.end
    }

    /// Whether two ranges share at least one position (edges included).
    pub fn overlaps(&self, other: &MatchRange) -> bool {
        self.from <= other.end && other.from <= self.end
    }

    /// Whether `pos` lies strictly between `from` and `end`.
    pub fn strictly_contains(&self, pos: usize) -> bool {
        self.from < pos && pos < self.end
    }
}

/// Text of a match up to the cursor (`partial`) and to its natural end (`full`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct MatchText {
    pub partial: String,
    pub full: String,
}

/// A candidate occurrence of a matcher's pattern around the cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match<K> {
    /// Identity of the matcher that produced this match.
    pub matcher: K,
    /// Matcher name, used for styling and diagnostics.
    pub name: String,
    /// The trigger string.
    pub char: String,
    pub range: MatchRange,
    /// Query without the trigger.
    pub query: MatchText,
    /// Matched text including the trigger.
    pub text: MatchText,
}

impl<K: PartialEq> Match<K> {
    /// Whether `other` is the same occurrence, possibly grown or shrunk.
    ///
    /// `from` is the position of `self` after mapping it through the edit
    /// that produced `other`.
    pub fn is_same_occurrence(&self, other: &Match<K>, from: usize) -> bool {
        let mapped = MatchRange {
            from,
            to: from + (self.range.to - self.range.from),
            end: from + (self.range.end - self.range.from),
        };
        self.matcher == other.matcher && mapped.overlaps(&other.range)
    }
}
