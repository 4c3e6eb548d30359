//! Collaborator interfaces supplied by the host editor.
//!
//! The suggestion engine never owns document text. It reads a snapshot
//! through [`SuggestDocument`], learns what an edit did through [`Edit`], and
//! mutates annotations only through [`MarkEditor`].

use std::collections::BTreeMap;
use std::ops::Range;

use serde::Serialize;

use crate::error::MarkError;

/// The text block enclosing a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBlock<'a> {
    /// Text content of the block (no block separators).
    pub text: &'a str,
    /// Absolute offset of the first byte of `text`.
    pub start: usize,
    /// Absolute offset just past the last byte of `text`.
    pub end: usize,
}

/// A text selection. `anchor == head` is a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn cursor(pos: usize) -> Self {
        Self { anchor: pos, head: pos }
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }
}

/// Which side a position sticks to when text is inserted exactly at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Before,
    After,
}

/// Result of mapping an old position through an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedPosition {
    pub pos: usize,
    /// The text around the old position was deleted.
    pub deleted: bool,
}

/// Read access to one document snapshot.
pub trait SuggestDocument {
    /// Current selection.
    fn selection(&self) -> Selection;

    /// Enclosing text block of `offset`, if it lies inside one.
    fn resolve_block(&self, offset: usize) -> Option<TextBlock<'_>>;

    /// Whether an annotation mark of `kind` covers any part of `range`.
    fn is_mark_active(&self, range: Range<usize>, kind: &str) -> bool;

    /// Extent of the annotation mark of `kind` touching `pos`.
    fn mark_range_at(&self, pos: usize, kind: &str) -> Option<Range<usize>>;
}

/// What one edit cycle did.
pub trait Edit {
    /// Whether document content changed.
    fn doc_changed(&self) -> bool;

    /// Whether the selection was explicitly set.
    fn selection_set(&self) -> bool;

    /// Map an offset in the old document to the new one.
    fn map_position(&self, pos: usize, assoc: Assoc) -> MappedPosition;

    /// Ranges of the old document touched by the edit.
    ///
    /// Insertions are reported as empty ranges at the insertion point.
    fn changed_ranges(&self) -> Vec<Range<usize>>;
}

/// Attributes written on an annotation mark.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AnnotationAttrs {
    pub id: String,
    pub label: String,
    /// Name of the matcher that created the annotation.
    pub name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

/// Mutation access to annotation marks.
pub trait MarkEditor {
    /// Whether an annotation of `kind` already covers part of `range`.
    fn has_annotation(&self, range: Range<usize>, kind: &str) -> bool;

    /// Replace `range` with `text` and mark the inserted label.
    fn create_annotation(
        &mut self,
        range: Range<usize>,
        text: &str,
        kind: &str,
        attrs: &AnnotationAttrs,
    ) -> Result<(), MarkError>;

    /// Replace `range` with `text` and rewrite the existing annotation.
    fn update_annotation(
        &mut self,
        range: Range<usize>,
        text: &str,
        kind: &str,
        attrs: &AnnotationAttrs,
    ) -> Result<(), MarkError>;

    /// Remove annotations of `kind` from `range`, keeping the text.
    fn remove_annotation(&mut self, range: Range<usize>, kind: &str) -> Result<(), MarkError>;
}
