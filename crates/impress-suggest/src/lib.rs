//! impress-suggest: Type-ahead suggestion matching for impress editors.
//!
//! Detects when the cursor is composing a triggered token (`@alice`, `#topic`,
//! `:smile`), tracks that token across edits, and reports lifecycle
//! transitions (start, change, exit, split, removal) to user handlers. Handlers
//! get a command that turns the token into an annotation mark, and key presses
//! are routed to the visible matcher while a suggestion is shown.
//!
//! The engine never owns document text: hosts implement [`SuggestDocument`],
//! [`Edit`] and [`MarkEditor`]. [`MemoryDocument`] is a complete in-memory
//! host and [`Session`] drives the whole loop on top of it.

pub mod command;
pub mod config;
pub mod controller;
pub mod decoration;
pub mod error;
pub mod handlers;
pub mod host;
pub mod keys;
pub mod memory;
pub mod reason;
pub mod scanner;
pub mod session;
pub mod suggestion;

pub use command::{AnnotationOverrides, AnnotationWrite, CommandOutcome, CommandRunner, Stage, SuggestCommand};
pub use config::{MatcherConfig, MatcherSpec, ReplacementType, SuggestConfig};
pub use controller::{Controller, CycleOutcome};
pub use decoration::{style_class, Highlight, SUGGEST_CLASS};
pub use error::{MarkError, Result, SuggestError};
pub use handlers::{CharacterEntry, MatcherHandlers, SuggestContext};
pub use host::{AnnotationAttrs, Assoc, Edit, MappedPosition, MarkEditor, Selection, SuggestDocument, TextBlock};
pub use keys::{Key, KeyBindings, KeyEvent};
pub use memory::{Annotation, MemoryDocument, MemoryEdit};
pub use reason::{classify, ChangeEvidence, HandlerKind, PendingHandlers, Reason, ReasonedMatch};
pub use scanner::{scan, scan_at};
pub use session::{Session, SessionEvent};
pub use suggestion::{Match, MatchRange, MatchText};
