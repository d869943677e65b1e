//! Core engine for formdown documents: plain-text forms that humans and
//! automated agents fill in together.
//!
//! The format is a superset of Markdown: structural tags mark the form,
//! its groups, and its fields; checkbox-style list markers carry selection
//! and checklist state; fenced blocks carry scalar values. This crate owns
//! the four portable layers — syntax, data model, validation & patching,
//! and the inspect/apply/export tool contract — as pure, synchronous
//! transformations over an immutable [`ParsedForm`] value.

pub mod error;
pub mod export;
pub mod io;
pub mod model;
pub mod parsing;
pub mod patch;
pub mod serialize;
pub mod summary;
pub mod validate;

// Re-export the tool contract for easier usage
pub use error::{OptionsError, ParseError, PatchError, SourcePos};
pub use export::{ExportedForm, ExportedValue, export_friendly, export_json};
pub use model::{
    AnswerState, CheckState, CheckboxMode, Field, FieldGroup, FieldKind, FieldOption,
    FieldResponse, FieldValue, FormSchema, Note, ParsedForm, Priority,
};
pub use parsing::parse_form;
pub use patch::{ApplyResult, ApplyStatus, Patch, apply_patches};
pub use serialize::serialize;
pub use summary::{
    InspectOptions, InspectResult, ProgressState, ProgressSummary, StructureSummary, inspect,
    inspect_with,
};
pub use validate::{
    ExternalValidator, Issue, IssueCode, Severity, ValidatorRegistry, validate, validate_with,
};
