//! Transient highlight for the visible match.

use serde::Serialize;

use crate::suggestion::Match;

/// Class applied to every suggestion highlight.
pub const SUGGEST_CLASS: &str = "suggest";

/// An inline highlight for the renderer. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Highlight {
    pub from: usize,
    pub to: usize,
    /// Style identifier, e.g. `suggest suggest-at`.
    pub class: String,
    pub name: String,
}

impl Highlight {
    /// Highlight spanning `from..end` of `matched`.
    pub fn for_match<K>(matched: &Match<K>) -> Self {
        Self {
            from: matched.range.from,
            to: matched.range.end,
            class: style_class(&matched.name),
            name: matched.name.clone(),
        }
    }
}

/// Style identifier for a matcher name.
pub fn style_class(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    format!("{SUGGEST_CLASS} {SUGGEST_CLASS}-{slug}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_from_name() {
        assert_eq!(style_class("at"), "suggest suggest-at");
        assert_eq!(style_class("emoji picker"), "suggest suggest-emoji-picker");
    }
}
