//! Parse-time semantic validation.
//!
//! These are hard errors, distinct from the softer rule-validator issues:
//! any violation aborts loading entirely and the caller never receives a
//! partially-valid form.

use std::collections::{HashMap, HashSet};

use crate::error::{LineIndex, ParseError, ParseErrorKind};
use crate::model::{IdEntry, NodeKind, ParsedForm};

use super::builder::BuiltForm;

/// Builds the global structural-ID index, rejecting duplicates as they are
/// inserted. Options are intentionally excluded: their IDs are field-scoped.
pub struct IndexBuilder {
    order: Vec<String>,
    map: HashMap<String, IdEntry>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            map: HashMap::new(),
        }
    }

    pub fn insert(
        &mut self,
        id: &str,
        node: NodeKind,
        parent: Option<String>,
        offset: usize,
        lines: &LineIndex,
    ) -> Result<(), ParseError> {
        if self.map.contains_key(id) {
            return Err(ParseError::new(
                lines.pos(offset),
                ParseErrorKind::DuplicateId { id: id.to_string() },
            ));
        }
        self.order.push(id.to_string());
        self.map.insert(id.to_string(), IdEntry { node, parent });
        Ok(())
    }

    pub fn finish(self) -> (Vec<String>, HashMap<String, IdEntry>) {
        (self.order, self.map)
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Post-build checks: doc `(ref, tag)` uniqueness, note ID uniqueness, and
/// reference resolution for docs and notes.
pub fn validate(built: BuiltForm, lines: &LineIndex) -> Result<ParsedForm, ParseError> {
    let BuiltForm {
        form,
        doc_offsets,
        note_offsets,
    } = built;

    let mut seen_docs = HashSet::new();
    for (doc, offset) in form.docs.iter().zip(&doc_offsets) {
        if !seen_docs.insert((doc.target.clone(), doc.tag)) {
            return Err(ParseError::new(
                lines.pos(*offset),
                ParseErrorKind::DuplicateDoc {
                    target: doc.target.clone(),
                    tag: doc.tag.as_str().to_string(),
                },
            ));
        }
        if !form.resolve_ref(&doc.target) {
            return Err(ParseError::new(
                lines.pos(*offset),
                ParseErrorKind::UnresolvedRef {
                    target: doc.target.clone(),
                },
            ));
        }
    }

    let mut seen_notes = HashSet::new();
    for (note, offset) in form.notes.iter().zip(&note_offsets) {
        if !seen_notes.insert(note.id.clone()) {
            return Err(ParseError::new(
                lines.pos(*offset),
                ParseErrorKind::DuplicateId {
                    id: note.id.clone(),
                },
            ));
        }
        if !form.resolve_ref(&note.target) {
            return Err(ParseError::new(
                lines.pos(*offset),
                ParseErrorKind::UnresolvedRef {
                    target: note.target.clone(),
                },
            ));
        }
    }

    Ok(form)
}
