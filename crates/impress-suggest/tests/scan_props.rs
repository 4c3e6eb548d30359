//! Property tests for the matcher scanner

use impress_suggest::{scan, MatcherConfig, MatcherSpec, TextBlock};
use proptest::prelude::*;

fn at() -> MatcherConfig<()> {
    MatcherSpec::new("at", "@").build(()).unwrap()
}

fn block(text: &str, start: usize) -> TextBlock<'_> {
    TextBlock {
        text,
        start,
        end: start + text.len(),
    }
}

proptest! {
    #[test]
    fn test_cursor_inside_word_finds_it(
        lead in "([a-z]{1,6} ){0,3}",
        word in "[a-z0-9_]{1,10}",
        tail in "( [a-z]{1,6}){0,3}",
        offset in 0usize..100,
        block_start in 0usize..50,
    ) {
        let text = format!("{lead}@{word}{tail}");
        let from = lead.len();
        let end = from + 1 + word.len();
        let local = from + 1 + offset % (word.len() + 1);

        let found = scan(&at(), &block(&text, block_start), block_start + local);
        prop_assert!(found.is_some(), "no match in {:?} at {}", text, local);
        let found = found.unwrap();
        prop_assert_eq!(found.range.from, block_start + from);
        prop_assert_eq!(found.range.to, block_start + local);
        prop_assert_eq!(found.range.end, block_start + end);
        prop_assert_eq!(&found.query.full, &word);
        prop_assert_eq!(&found.query.partial, &word[..local - from - 1]);
    }

    #[test]
    fn test_match_always_contains_cursor(
        text in "[a-z@ ]{0,24}",
        cursor in 0usize..30,
    ) {
        let cursor = cursor.min(text.len());
        if let Some(found) = scan(&at(), &block(&text, 0), cursor) {
            prop_assert!(found.range.from < cursor && cursor <= found.range.end);
            prop_assert!(found.range.to <= found.range.end);
            prop_assert_eq!(&text[found.range.from..found.range.end], found.text.full.as_str());
            prop_assert!(found.text.full.starts_with('@'));
            prop_assert!(!found.query.full.is_empty());
        }
    }

    #[test]
    fn test_cursor_before_trigger_never_matches(word in "[a-z]{1,8}") {
        let text = format!("@{word}");
        prop_assert!(scan(&at(), &block(&text, 0), 0).is_none());
    }
}
