pub mod annotations;
pub mod form;
pub mod response;
pub mod schema;

pub use annotations::{DocTag, DocumentationBlock, Note, NoteState};
pub use form::{FormMetadata, IdEntry, NodeKind, ParsedForm};
pub use response::{
    AnswerState, CellValue, CheckState, FieldResponse, FieldValue, TableRow,
};
pub use schema::{
    CheckboxMode, Column, ColumnType, DateConstraints, Field, FieldGroup, FieldKind,
    FieldOption, FormSchema, ListConstraints, NumberConstraints, Priority, TableSpec,
    TextConstraints, YearConstraints, IMPLICIT_CHECKBOXES_ID, IMPLICIT_GROUP_ID,
};
