//! Command factory.
//!
//! Turns a reasoned match into a command that writes or removes the
//! annotation mark backing it. Commands are plain values; they run against a
//! [`MarkEditor`] through a [`CommandRunner`], which also tells the
//! controller when an annotation was removed or written.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::Serialize;
use tracing::debug;

use crate::config::{MatcherConfig, ReplacementType};
use crate::host::{AnnotationAttrs, MarkEditor};
use crate::reason::{Reason, ReasonedMatch};

/// Whether the match already carries an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    New,
    Edit,
}

/// What running a command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// The annotation was created (`New`) or rewritten (`Edit`).
    Written { stage: Stage },
    /// Removal was attempted; the loop guard is raised.
    Removed,
    /// The editor rejected the write; ignored.
    Conflict,
}

/// Caller-supplied values that replace the derived defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationOverrides {
    pub id: Option<String>,
    pub label: Option<String>,
    pub replacement_type: Option<ReplacementType>,
    pub append_text: Option<String>,
    pub extra: BTreeMap<String, String>,
}

impl AnnotationOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn replacement_type(mut self, replacement_type: ReplacementType) -> Self {
        self.replacement_type = Some(replacement_type);
        self
    }

    pub fn append_text(mut self, text: impl Into<String>) -> Self {
        self.append_text = Some(text.into());
        self
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// A fully resolved annotation write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationWrite {
    pub range: Range<usize>,
    /// Text replacing `range`: label followed by the append text.
    pub text: String,
    pub attrs: AnnotationAttrs,
}

/// Command bound to one reasoned match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestCommand<K> {
    matched: ReasonedMatch<K>,
    mark_kind: String,
    append_text: String,
    replacement_type: ReplacementType,
}

impl<K> SuggestCommand<K> {
    /// Build the command for `matched` using its matcher's settings.
    pub fn new(matched: ReasonedMatch<K>, config: &MatcherConfig<K>) -> Self {
        let replacement_type = match matched.reason {
            Reason::Split => ReplacementType::Partial,
            _ => config.replacement_type(),
        };
        Self {
            matched,
            mark_kind: config.mark_kind().to_string(),
            append_text: config.append_text().to_string(),
            replacement_type,
        }
    }

    pub fn matched(&self) -> &ReasonedMatch<K> {
        &self.matched
    }

    /// Kind of the annotation mark this command writes.
    pub fn mark_kind(&self) -> &str {
        &self.mark_kind
    }

    /// Replacement used when the caller does not override it.
    pub fn default_replacement(&self) -> ReplacementType {
        self.replacement_type
    }

    /// Whether running the command removes the annotation.
    pub fn is_removal(&self) -> bool {
        self.matched.reason.is_removal()
    }

    /// Resolve the write this command performs, applying `overrides`.
    pub fn resolve(&self, overrides: &AnnotationOverrides) -> AnnotationWrite {
        let matched = &self.matched.matched;
        let replacement = overrides.replacement_type.unwrap_or(self.replacement_type);
        let (range, id, label) = match replacement {
            ReplacementType::Full => (
                matched.range.from..matched.range.end,
                &matched.query.full,
                &matched.text.full,
            ),
            ReplacementType::Partial => (
                matched.range.from..matched.range.to,
                &matched.query.partial,
                &matched.text.partial,
            ),
        };

        let label = overrides.label.clone().unwrap_or_else(|| label.clone());
        let append = overrides.append_text.as_deref().unwrap_or(&self.append_text);
        AnnotationWrite {
            range,
            text: format!("{label}{append}"),
            attrs: AnnotationAttrs {
                id: overrides.id.clone().unwrap_or_else(|| id.clone()),
                label,
                name: matched.name.clone(),
                extra: overrides.extra.clone(),
            },
        }
    }

    fn execute(&self, editor: &mut dyn MarkEditor, overrides: &AnnotationOverrides) -> CommandOutcome {
        let matched = &self.matched.matched;

        if self.is_removal() {
            let range = matched.range.from..matched.range.end;
            if let Err(err) = editor.remove_annotation(range, &self.mark_kind) {
                debug!(matcher = %matched.name, %err, "annotation already gone, ignoring");
            }
            return CommandOutcome::Removed;
        }

        let stage = if editor.has_annotation(matched.range.from..matched.range.end, &self.mark_kind) {
            Stage::Edit
        } else {
            Stage::New
        };
        let write = self.resolve(overrides);
        let result = match stage {
            Stage::New => editor.create_annotation(write.range, &write.text, &self.mark_kind, &write.attrs),
            Stage::Edit => editor.update_annotation(write.range, &write.text, &self.mark_kind, &write.attrs),
        };

        match result {
            Ok(()) => CommandOutcome::Written { stage },
            Err(err) => {
                debug!(matcher = %matched.name, ?stage, %err, "annotation write conflicted, ignoring");
                CommandOutcome::Conflict
            }
        }
    }
}

/// What commands did since the controller last looked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CommandFlags {
    /// A removal ran; the next cycle resets pending handlers.
    pub(crate) removed: bool,
    /// An annotation was written; the exit it causes is not reported.
    pub(crate) written: bool,
}

/// Runs commands against the host editor on behalf of the controller.
pub struct CommandRunner<'a> {
    editor: &'a mut dyn MarkEditor,
    flags: &'a mut CommandFlags,
}

impl<'a> CommandRunner<'a> {
    pub(crate) fn new(editor: &'a mut dyn MarkEditor, flags: &'a mut CommandFlags) -> Self {
        Self { editor, flags }
    }

    /// Run `command`, raising the loop guard on removal.
    pub fn run<K>(&mut self, command: &SuggestCommand<K>, overrides: &AnnotationOverrides) -> CommandOutcome {
        let outcome = command.execute(&mut *self.editor, overrides);
        match outcome {
            CommandOutcome::Removed => self.flags.removed = true,
            CommandOutcome::Written { .. } => self.flags.written = true,
            CommandOutcome::Conflict => {}
        }
        outcome
    }

    /// Read access to the editor, e.g. to check for existing annotations.
    pub fn editor(&self) -> &dyn MarkEditor {
        &*self.editor
    }
}
