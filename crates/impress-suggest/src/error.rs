//! Error types for impress-suggest

use thiserror::Error;

/// Result type alias for suggestion configuration and command requests
pub type Result<T> = std::result::Result<T, SuggestError>;

/// Errors surfaced to the host integration.
///
/// These all indicate a programming or configuration mistake on the host side
/// and are returned synchronously, never swallowed.
#[derive(Error, Debug)]
pub enum SuggestError {
    /// A matcher regular expression failed to compile
    #[error("Invalid pattern for matcher {name}: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    /// A matcher with the same key or name is already registered
    #[error("Duplicate matcher: {0}")]
    DuplicateMatcher(String),

    /// No matcher is registered under the requested key
    #[error("Unknown matcher: {0}")]
    UnknownMatcher(String),

    /// A command was requested without a key while several matchers exist
    #[error("Ambiguous matcher: {0} matchers configured, a key is required")]
    AmbiguousMatcher(usize),

    /// The trigger string of a matcher is empty
    #[error("Matcher {0} has an empty trigger character")]
    EmptyTrigger(String),

    /// Matcher configuration could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),
}

/// Errors reported by the host's mark-mutation collaborator.
///
/// The command factory treats these as expected races and ignores them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkError {
    /// The range lies outside the current document
    #[error("Range {from}..{to} is out of bounds for a document of length {len}")]
    OutOfBounds { from: usize, to: usize, len: usize },

    /// The range does not start or end on a character boundary
    #[error("Range {from}..{to} does not fall on a character boundary")]
    NotCharBoundary { from: usize, to: usize },

    /// There is no annotation to update or remove
    #[error("No annotation of kind {kind} at {from}..{to}")]
    Missing { kind: String, from: usize, to: usize },
}

impl From<std::io::Error> for SuggestError {
    fn from(err: std::io::Error) -> Self {
        SuggestError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for SuggestError {
    fn from(err: toml::de::Error) -> Self {
        SuggestError::Config(err.to_string())
    }
}
