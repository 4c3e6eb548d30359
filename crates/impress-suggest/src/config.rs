//! Matcher configuration.
//!
//! A [`MatcherSpec`] is the plain, serializable description of a trigger
//! (what a TOML file or a host integration writes). [`MatcherSpec::build`]
//! compiles it into an immutable [`MatcherConfig`] bound to a caller-chosen
//! matcher key.
//!
//! ```toml
//! [[matcher]]
//! name = "at"
//! char = "@"
//! supported_characters = '[\w.]+'
//! append_text = " "
//!
//! [[matcher]]
//! name = "tag"
//! char = "#"
//! mark_kind = "tag"
//! match_offset = 1
//! ```

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SuggestError};

/// Default body pattern for a query.
pub const DEFAULT_SUPPORTED_CHARACTERS: &str = r"\w+";

/// Default rule for the character preceding a trigger: block start, whitespace or NUL.
pub const DEFAULT_VALID_PREFIX_CHARACTERS: &str = r"^[\s\x00]?$";

/// Default annotation mark backing a matcher.
pub const DEFAULT_MARK_KIND: &str = "mention";

/// Default scan priority.
pub const DEFAULT_PRIORITY: i32 = 50;

lazy_static! {
    static ref DEFAULT_VALID_PREFIX: Regex = Regex::new(DEFAULT_VALID_PREFIX_CHARACTERS).unwrap();
}

/// How much of the matched text a command replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplacementType {
    /// Replace the whole occurrence, including text past the cursor.
    #[default]
    Full,
    /// Replace only up to the cursor.
    Partial,
}

/// Serializable matcher description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherSpec {
    pub name: String,
    pub char: String,
    pub supported_characters: String,
    pub start_of_line: bool,
    pub valid_prefix_characters: String,
    pub invalid_prefix_characters: Option<String>,
    pub match_offset: usize,
    pub append_text: String,
    pub replacement_type: ReplacementType,
    pub priority: i32,
    pub case_insensitive: bool,
    pub empty_selections_only: bool,
    pub mark_kind: String,
}

impl Default for MatcherSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            char: "@".to_string(),
            supported_characters: DEFAULT_SUPPORTED_CHARACTERS.to_string(),
            start_of_line: false,
            valid_prefix_characters: DEFAULT_VALID_PREFIX_CHARACTERS.to_string(),
            invalid_prefix_characters: None,
            match_offset: 0,
            append_text: String::new(),
            replacement_type: ReplacementType::Full,
            priority: DEFAULT_PRIORITY,
            case_insensitive: false,
            empty_selections_only: false,
            mark_kind: DEFAULT_MARK_KIND.to_string(),
        }
    }
}

impl MatcherSpec {
    /// Create a spec with default settings for the given trigger.
    pub fn new(name: impl Into<String>, char: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            char: char.into(),
            ..Self::default()
        }
    }

    pub fn supported_characters(mut self, pattern: impl Into<String>) -> Self {
        self.supported_characters = pattern.into();
        self
    }

    pub fn start_of_line(mut self, start_of_line: bool) -> Self {
        self.start_of_line = start_of_line;
        self
    }

    pub fn valid_prefix_characters(mut self, pattern: impl Into<String>) -> Self {
        self.valid_prefix_characters = pattern.into();
        self
    }

    pub fn invalid_prefix_characters(mut self, pattern: impl Into<String>) -> Self {
        self.invalid_prefix_characters = Some(pattern.into());
        self
    }

    pub fn match_offset(mut self, match_offset: usize) -> Self {
        self.match_offset = match_offset;
        self
    }

    pub fn append_text(mut self, text: impl Into<String>) -> Self {
        self.append_text = text.into();
        self
    }

    pub fn replacement_type(mut self, replacement_type: ReplacementType) -> Self {
        self.replacement_type = replacement_type;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn empty_selections_only(mut self, empty_selections_only: bool) -> Self {
        self.empty_selections_only = empty_selections_only;
        self
    }

    pub fn mark_kind(mut self, kind: impl Into<String>) -> Self {
        self.mark_kind = kind.into();
        self
    }

    /// Compile the spec into a config identified by `key`.
    pub fn build<K>(self, key: K) -> Result<MatcherConfig<K>> {
        if self.char.is_empty() {
            return Err(SuggestError::EmptyTrigger(self.name));
        }

        let compile = |source: &str| {
            Regex::new(source).map_err(|source| SuggestError::InvalidPattern {
                name: self.name.clone(),
                source,
            })
        };

        let mut pattern = String::new();
        if self.case_insensitive {
            pattern.push_str("(?i)");
        }
        if self.start_of_line {
            pattern.push('^');
        }
        pattern.push_str(&regex::escape(&self.char));
        pattern.push_str("(?:");
        pattern.push_str(&self.supported_characters);
        pattern.push(')');

        let pattern = compile(&pattern)?;
        let valid_prefix = if self.valid_prefix_characters == DEFAULT_VALID_PREFIX_CHARACTERS {
            DEFAULT_VALID_PREFIX.clone()
        } else {
            compile(&self.valid_prefix_characters)?
        };
        let invalid_prefix = self
            .invalid_prefix_characters
            .as_deref()
            .map(compile)
            .transpose()?;

        Ok(MatcherConfig {
            key,
            pattern,
            valid_prefix,
            invalid_prefix,
            spec: self,
        })
    }
}

/// Compiled, immutable matcher configuration.
#[derive(Debug, Clone)]
pub struct MatcherConfig<K> {
    key: K,
    spec: MatcherSpec,
    pattern: Regex,
    valid_prefix: Regex,
    invalid_prefix: Option<Regex>,
}

impl<K> MatcherConfig<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// The trigger string.
    pub fn char(&self) -> &str {
        &self.spec.char
    }

    pub fn start_of_line(&self) -> bool {
        self.spec.start_of_line
    }

    pub fn match_offset(&self) -> usize {
        self.spec.match_offset
    }

    pub fn append_text(&self) -> &str {
        &self.spec.append_text
    }

    pub fn replacement_type(&self) -> ReplacementType {
        self.spec.replacement_type
    }

    pub fn priority(&self) -> i32 {
        self.spec.priority
    }

    pub fn empty_selections_only(&self) -> bool {
        self.spec.empty_selections_only
    }

    pub fn mark_kind(&self) -> &str {
        &self.spec.mark_kind
    }

    /// The source spec this config was built from.
    pub fn spec(&self) -> &MatcherSpec {
        &self.spec
    }

    /// Scanning pattern: `(^)?<char>(?:<supported_characters>)`.
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Check the text immediately before a trigger occurrence.
    ///
    /// `prefix` is empty at block start, otherwise the single preceding character.
    pub fn is_prefix_valid(&self, prefix: &str) -> bool {
        let allowed = prefix.chars().all(char::is_whitespace) || self.valid_prefix.is_match(prefix);
        let forbidden = self
            .invalid_prefix
            .as_ref()
            .is_some_and(|invalid| invalid.is_match(prefix));
        allowed && !forbidden
    }
}

/// A set of matcher specs, typically loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestConfig {
    #[serde(rename = "matcher", default)]
    pub matchers: Vec<MatcherSpec>,
}

impl SuggestConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Read and parse a TOML config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Build every spec, keyed by its position in the file.
    pub fn build_indexed(self) -> Result<Vec<MatcherConfig<usize>>> {
        self.matchers
            .into_iter()
            .enumerate()
            .map(|(index, spec)| spec.build(index))
            .collect()
    }
}
