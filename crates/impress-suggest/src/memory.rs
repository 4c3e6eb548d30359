//! In-memory host.
//!
//! [`MemoryDocument`] is a plain-text document split into paragraphs by
//! `'\n'`, with a byte-offset selection and annotation marks. It implements
//! every host trait, so the engine can run without a real editor: in the CLI,
//! in tests, and as a reference for host integrations.
//!
//! Every mutation returns a [`MemoryEdit`] describing what changed. Mutations
//! made through [`MarkEditor`] (i.e. by commands) are journaled instead and
//! collected with [`MemoryDocument::take_journal`].

use std::ops::Range;

use serde::Serialize;

use crate::error::MarkError;
use crate::host::{AnnotationAttrs, Assoc, Edit, MappedPosition, MarkEditor, Selection, SuggestDocument, TextBlock};

/// An annotation mark over a byte range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub range: Range<usize>,
    pub kind: String,
    pub attrs: AnnotationAttrs,
}

/// One replacement: `from..to` (in the document as it was before this step)
/// was replaced by `inserted` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Step {
    pub from: usize,
    pub to: usize,
    pub inserted: usize,
}

impl Step {
    fn removed(&self) -> usize {
        self.to - self.from
    }

    /// Map `pos` across this step. The flag is set when the text right after
    /// `pos` was deleted.
    fn map(&self, pos: usize, assoc: Assoc) -> (usize, bool) {
        let removed = self.removed();
        if pos < self.from {
            return (pos, false);
        }
        if pos > self.to || (pos == self.to && removed > 0) {
            return (pos - removed + self.inserted, false);
        }
        let shift = if assoc == Assoc::After { self.inserted } else { 0 };
        (self.from + shift, removed > 0)
    }

    /// Map a position after this step back to the document before it.
    fn unmap(&self, pos: usize) -> usize {
        if pos <= self.from {
            pos
        } else if pos >= self.from + self.inserted {
            pos - self.inserted + self.removed()
        } else {
            self.from
        }
    }
}

/// What a batch of [`MemoryDocument`] mutations did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemoryEdit {
    steps: Vec<Step>,
    marks_changed: bool,
    selection_set: bool,
}

impl MemoryEdit {
    /// An edit that did nothing.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && !self.marks_changed && !self.selection_set
    }

    /// Append `other`, which happened after `self`.
    pub fn merge(&mut self, other: MemoryEdit) {
        self.steps.extend(other.steps);
        self.marks_changed |= other.marks_changed;
        self.selection_set |= other.selection_set;
    }
}

impl Edit for MemoryEdit {
    fn doc_changed(&self) -> bool {
        !self.steps.is_empty() || self.marks_changed
    }

    fn selection_set(&self) -> bool {
        self.selection_set
    }

    fn map_position(&self, pos: usize, assoc: Assoc) -> MappedPosition {
        let mut deleted = false;
        let pos = self.steps.iter().fold(pos, |pos, step| {
            let (mapped, gone) = step.map(pos, assoc);
            deleted |= gone;
            mapped
        });
        MappedPosition { pos, deleted }
    }

    fn changed_ranges(&self) -> Vec<Range<usize>> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let earlier = &self.steps[..index];
                let unmap = |pos| earlier.iter().rev().fold(pos, |pos, s: &Step| s.unmap(pos));
                unmap(step.from)..unmap(step.to)
            })
            .collect()
    }
}

/// A plain-text document with annotation marks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemoryDocument {
    text: String,
    selection: Selection,
    annotations: Vec<Annotation>,
    #[serde(skip)]
    journal: MemoryEdit,
}

impl MemoryDocument {
    /// A document holding `text` with the cursor at its end.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let selection = Selection::cursor(text.len());
        Self {
            text,
            selection,
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn cursor(&self) -> usize {
        self.selection.head
    }

    /// The selection as an ordered byte range.
    pub fn selection_range(&self) -> Range<usize> {
        self.selection.from()..self.selection.to()
    }

    /// Start of the paragraph holding the cursor.
    pub fn block_start(&self) -> usize {
        self.resolve_block(self.cursor()).map_or(0, |block| block.start)
    }

    /// End of the paragraph holding the cursor.
    pub fn block_end(&self) -> usize {
        self.resolve_block(self.cursor())
            .map_or(self.text.len(), |block| block.end)
    }

    /// Replace the selection with `text` and put the cursor after it.
    pub fn type_text(&mut self, text: &str) -> MemoryEdit {
        self.replace(self.selection_range(), text)
    }

    /// Delete the selection, or the character before the cursor.
    pub fn backspace(&mut self) -> MemoryEdit {
        if !self.selection.is_empty() {
            return self.type_text("");
        }
        let cursor = self.selection.head;
        let previous = self.text[..cursor].char_indices().next_back().map(|(i, _)| i);
        match previous {
            Some(start) => self.replace(start..cursor, ""),
            None => MemoryEdit::none(),
        }
    }

    /// Delete `range`, clamped to the document.
    pub fn delete(&mut self, range: Range<usize>) -> MemoryEdit {
        self.replace(range, "")
    }

    /// Replace `range` (clamped to the document and to character boundaries)
    /// with `text`, leaving the cursor after the insertion.
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> MemoryEdit {
        let from = self.floor(range.start);
        let to = self.floor(range.end).max(from);
        let step = self.apply_step(from, to, text);
        self.selection = Selection::cursor(from + text.len());
        MemoryEdit {
            steps: vec![step],
            marks_changed: false,
            selection_set: true,
        }
    }

    /// Put the cursor at `pos`.
    pub fn set_cursor(&mut self, pos: usize) -> MemoryEdit {
        self.select(pos, pos)
    }

    /// Select from `anchor` to `head`.
    pub fn select(&mut self, anchor: usize, head: usize) -> MemoryEdit {
        self.selection = Selection {
            anchor: self.floor(anchor),
            head: self.floor(head),
        };
        MemoryEdit {
            selection_set: true,
            ..MemoryEdit::none()
        }
    }

    /// Move the cursor by `delta` characters, collapsing any selection.
    pub fn move_cursor(&mut self, delta: isize) -> MemoryEdit {
        let mut pos = self.selection.head;
        for _ in 0..delta.unsigned_abs() {
            let next = if delta < 0 {
                self.text[..pos].char_indices().next_back().map(|(i, _)| i)
            } else {
                self.text[pos..].chars().next().map(|c| pos + c.len_utf8())
            };
            match next {
                Some(next) => pos = next,
                None => break,
            }
        }
        self.set_cursor(pos)
    }

    /// Changes made through [`MarkEditor`] since the last call.
    pub fn take_journal(&mut self) -> MemoryEdit {
        std::mem::take(&mut self.journal)
    }

    fn floor(&self, pos: usize) -> usize {
        let mut pos = pos.min(self.text.len());
        while !self.text.is_char_boundary(pos) {
            pos -= 1;
        }
        pos
    }

    fn apply_step(&mut self, from: usize, to: usize, text: &str) -> Step {
        let step = Step {
            from,
            to,
            inserted: text.len(),
        };
        self.text.replace_range(from..to, text);
        self.annotations.retain_mut(|annotation| {
            let (start, _) = step.map(annotation.range.start, Assoc::After);
            let (end, _) = step.map(annotation.range.end, Assoc::Before);
            annotation.range = start..end.max(start);
            !annotation.range.is_empty()
        });
        step
    }

    fn check_range(&self, range: &Range<usize>) -> Result<(), MarkError> {
        if range.start > range.end || range.end > self.text.len() {
            return Err(MarkError::OutOfBounds {
                from: range.start,
                to: range.end,
                len: self.text.len(),
            });
        }
        if !self.text.is_char_boundary(range.start) || !self.text.is_char_boundary(range.end) {
            return Err(MarkError::NotCharBoundary {
                from: range.start,
                to: range.end,
            });
        }
        Ok(())
    }

    fn overlapping(annotation: &Annotation, range: &Range<usize>, kind: &str) -> bool {
        annotation.kind == kind
            && annotation.range.start < range.end.max(range.start + 1)
            && range.start < annotation.range.end
    }

    fn write_annotation(&mut self, range: Range<usize>, text: &str, kind: &str, attrs: &AnnotationAttrs) {
        self.annotations
            .retain(|annotation| !Self::overlapping(annotation, &range, kind));

        // Keep the unchanged head of the range so positions inside it survive.
        let prefix: usize = self.text[range.clone()]
            .chars()
            .zip(text.chars())
            .take_while(|(old, new)| old == new)
            .map(|(old, _)| old.len_utf8())
            .sum();
        let step = self.apply_step(range.start + prefix, range.end, &text[prefix..]);

        let marked = if text.starts_with(attrs.label.as_str()) && !attrs.label.is_empty() {
            attrs.label.len()
        } else {
            text.len()
        };
        if marked > 0 {
            self.annotations.push(Annotation {
                range: range.start..range.start + marked,
                kind: kind.to_string(),
                attrs: attrs.clone(),
            });
            self.annotations.sort_by_key(|annotation| annotation.range.start);
        }

        self.selection = Selection::cursor(range.start + text.len());
        self.journal.merge(MemoryEdit {
            steps: vec![step],
            marks_changed: true,
            selection_set: true,
        });
    }
}

impl SuggestDocument for MemoryDocument {
    fn selection(&self) -> Selection {
        self.selection
    }

    fn resolve_block(&self, offset: usize) -> Option<TextBlock<'_>> {
        if !self.text.is_char_boundary(offset) {
            return None;
        }
        let start = self.text[..offset].rfind('\n').map_or(0, |i| i + 1);
        let end = self.text[offset..]
            .find('\n')
            .map_or(self.text.len(), |i| offset + i);
        Some(TextBlock {
            text: &self.text[start..end],
            start,
            end,
        })
    }

    fn is_mark_active(&self, range: Range<usize>, kind: &str) -> bool {
        self.annotations
            .iter()
            .any(|annotation| Self::overlapping(annotation, &range, kind))
    }

    fn mark_range_at(&self, pos: usize, kind: &str) -> Option<Range<usize>> {
        self.annotations
            .iter()
            .find(|annotation| annotation.kind == kind && annotation.range.start <= pos && pos < annotation.range.end)
            .map(|annotation| annotation.range.clone())
    }
}

impl MarkEditor for MemoryDocument {
    fn has_annotation(&self, range: Range<usize>, kind: &str) -> bool {
        self.is_mark_active(range, kind)
    }

    fn create_annotation(
        &mut self,
        range: Range<usize>,
        text: &str,
        kind: &str,
        attrs: &AnnotationAttrs,
    ) -> Result<(), MarkError> {
        self.check_range(&range)?;
        self.write_annotation(range, text, kind, attrs);
        Ok(())
    }

    fn update_annotation(
        &mut self,
        range: Range<usize>,
        text: &str,
        kind: &str,
        attrs: &AnnotationAttrs,
    ) -> Result<(), MarkError> {
        self.check_range(&range)?;
        if !self.has_annotation(range.clone(), kind) {
            return Err(MarkError::Missing {
                kind: kind.to_string(),
                from: range.start,
                to: range.end,
            });
        }
        self.write_annotation(range, text, kind, attrs);
        Ok(())
    }

    fn remove_annotation(&mut self, range: Range<usize>, kind: &str) -> Result<(), MarkError> {
        self.check_range(&range)?;
        let before = self.annotations.len();
        self.annotations
            .retain(|annotation| !Self::overlapping(annotation, &range, kind));
        if self.annotations.len() == before {
            return Err(MarkError::Missing {
                kind: kind.to_string(),
                from: range.start,
                to: range.end,
            });
        }
        self.journal.merge(MemoryEdit {
            marks_changed: true,
            ..MemoryEdit::none()
        });
        Ok(())
    }
}
