use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// 1-based line/column position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourcePos {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Precomputed newline offsets for byte-offset → line/column conversion.
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    pub fn pos(&self, offset: usize) -> SourcePos {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        SourcePos {
            line: line + 1,
            column: offset - self.line_starts[line] + 1,
        }
    }
}

/// Fatal load failure: the caller never receives a partially-valid form.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{pos}: {kind}")]
pub struct ParseError {
    pub pos: SourcePos,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(pos: SourcePos, kind: ParseErrorKind) -> Self {
        Self { pos, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("missing metadata block")]
    MissingMetadata,
    #[error("metadata block is missing the `formdown` version marker")]
    MissingVersionMarker,
    #[error("unsupported formdown version {0}")]
    UnsupportedVersion(u32),
    #[error("invalid metadata block: {0}")]
    InvalidMetadata(String),
    #[error("no form tag found")]
    MissingFormTag,
    #[error("`{tag}` tag was never closed")]
    UnclosedTag { tag: String },
    #[error("malformed `{tag}` tag: {message}")]
    MalformedTag { tag: String, message: String },
    #[error("unknown attribute `{attr}` on `{tag}` tag")]
    UnknownAttribute { tag: String, attr: String },
    #[error("field `{inner}` is nested inside field `{outer}`")]
    NestedField { outer: String, inner: String },
    #[error("duplicate ID `{id}`")]
    DuplicateId { id: String },
    #[error("duplicate option ID `{option}` in field `{field}`")]
    DuplicateOptionId { field: String, option: String },
    #[error("option in field `{field}` has no ID annotation")]
    OptionMissingId { field: String },
    #[error("duplicate documentation block ({target}, {tag})")]
    DuplicateDoc { target: String, tag: String },
    #[error("reference `{target}` does not resolve to any form element")]
    UnresolvedRef { target: String },
    #[error("field `{field}` has no label")]
    MissingLabel { field: String },
    #[error("explicit-mode checkboxes field `{field}` cannot be optional")]
    ExplicitModeOptional { field: String },
    #[error("attribute `{attr}` is not allowed on `{kind}` field `{field}`")]
    AttributeNotAllowed {
        field: String,
        kind: String,
        attr: String,
    },
    #[error("ID `{id}` is reserved")]
    ReservedId { id: String },
    #[error("bare checkbox items cannot be mixed with explicit field tags")]
    MixedCheckboxes,
    #[error("marker `[{marker}]` is not legal in field `{field}`")]
    IllegalMarker { field: String, marker: char },
    #[error("field `{field}` has more than one value block")]
    MultipleValues { field: String },
    #[error("single-select field `{field}` has more than one selected option")]
    MultipleSelections { field: String },
    #[error("invalid value in field `{field}`: {message}")]
    InvalidValue { field: String, message: String },
}

/// Stable machine code for one rejected patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchErrorCode {
    UnknownField,
    UnknownOption,
    UnknownNote,
    ShapeMismatch,
    SkipRequired,
    IllegalState,
    UnresolvedRef,
}

/// One bad patch in a batch. A batch with any of these is rejected whole;
/// the caller's form is never partially mutated.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("patch {index} ({code:?}): {message}")]
pub struct PatchError {
    /// Position of the offending patch within the submitted batch.
    pub index: usize,
    pub code: PatchErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
}

impl PatchError {
    pub fn new(index: usize, code: PatchErrorCode, message: impl Into<String>) -> Self {
        Self {
            index,
            code,
            message: message.into(),
            field_id: None,
        }
    }

    pub fn for_field(
        index: usize,
        code: PatchErrorCode,
        field_id: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            index,
            code,
            message: message.into(),
            field_id: Some(field_id.to_string()),
        }
    }
}

/// Bad caller-supplied options, e.g. conflicting validator registrations.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("a validator with ID `{0}` is already registered")]
    DuplicateValidator(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_positions() {
        let idx = LineIndex::new("ab\ncd\n\nef");
        assert_eq!(idx.pos(0), SourcePos { line: 1, column: 1 });
        assert_eq!(idx.pos(1), SourcePos { line: 1, column: 2 });
        assert_eq!(idx.pos(3), SourcePos { line: 2, column: 1 });
        assert_eq!(idx.pos(6), SourcePos { line: 3, column: 1 });
        assert_eq!(idx.pos(7), SourcePos { line: 4, column: 1 });
    }

    #[test]
    fn test_parse_error_carries_position() {
        let err = ParseError::new(
            SourcePos { line: 3, column: 5 },
            ParseErrorKind::DuplicateId { id: "x".into() },
        );
        assert_eq!(err.to_string(), "line 3, column 5: duplicate ID `x`");
    }
}
