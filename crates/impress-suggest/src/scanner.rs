//! Matcher scanner.
//!
//! Finds the occurrence of a matcher's pattern that the cursor is currently
//! composing inside one text block.

use tracing::trace;

use crate::config::MatcherConfig;
use crate::host::TextBlock;
use crate::suggestion::{Match, MatchRange, MatchText};

/// Scan `block` for the occurrence of `config` under the absolute `cursor`.
///
/// An occurrence is a candidate when its preceding character passes the
/// prefix rules and `from < cursor <= end`. The candidate whose start is
/// closest to the cursor wins.
pub fn scan<K: Clone>(config: &MatcherConfig<K>, block: &TextBlock<'_>, cursor: usize) -> Option<Match<K>> {
    let local = cursor.checked_sub(block.start)?;
    if local > block.text.len() {
        return None;
    }

    let mut best: Option<Match<K>> = None;
    for occurrence in config.pattern().find_iter(block.text) {
        let (start, end) = (occurrence.start(), occurrence.end());
        if !(start < local && local <= end) {
            continue;
        }

        let prefix = prefix_before(block.text, start);
        if !config.is_prefix_valid(prefix) {
            trace!(matcher = config.name(), prefix, start, "rejected occurrence prefix");
            continue;
        }

        let Some(candidate) = build_match(config, block, start, end, local) else {
            continue;
        };

        let closer = best
            .as_ref()
            .map_or(true, |current| cursor - candidate.range.from < cursor - current.range.from);
        if closer {
            best = Some(candidate);
        }
    }
    best
}

/// Re-check the occurrence that starts exactly at the absolute offset `from`.
///
/// `cursor` is clamped into the occurrence to produce the partial texts.
/// Returns `None` when no valid occurrence begins at `from` any more.
pub fn scan_at<K: Clone>(
    config: &MatcherConfig<K>,
    block: &TextBlock<'_>,
    from: usize,
    cursor: usize,
) -> Option<Match<K>> {
    let start = from.checked_sub(block.start)?;
    let occurrence = config
        .pattern()
        .find_iter(block.text)
        .find(|occurrence| occurrence.start() >= start)?;
    if occurrence.start() != start || !config.is_prefix_valid(prefix_before(block.text, start)) {
        return None;
    }

    let local = cursor
        .saturating_sub(block.start)
        .clamp(occurrence.start(), occurrence.end());
    build_match(config, block, occurrence.start(), occurrence.end(), local)
}

/// The single character before `index`, or `""` at block start.
fn prefix_before(text: &str, index: usize) -> &str {
    match text[..index].char_indices().next_back() {
        Some((offset, _)) => &text[offset..index],
        None => "",
    }
}

fn build_match<K: Clone>(
    config: &MatcherConfig<K>,
    block: &TextBlock<'_>,
    start: usize,
    end: usize,
    local: usize,
) -> Option<Match<K>> {
    let trigger_len = config.char().len();
    let full = block.text.get(start..end)?;
    let partial = block.text.get(start..local)?;
    let query_full = full.get(trigger_len..).unwrap_or("");
    let query_partial = partial.get(trigger_len..).unwrap_or("");

    if query_full.chars().count() < config.match_offset() {
        return None;
    }

    Some(Match {
        matcher: config.key().clone(),
        name: config.name().to_string(),
        char: config.char().to_string(),
        range: MatchRange {
            from: block.start + start,
            to: block.start + local,
            end: block.start + end,
        },
        query: MatchText {
            partial: query_partial.to_string(),
            full: query_full.to_string(),
        },
        text: MatchText {
            partial: partial.to_string(),
            full: full.to_string(),
        },
    })
}
