//! Patch engine.
//!
//! Applies an ordered batch of atomic mutations to a form in two phases:
//! structural validation over the whole batch first (any failure rejects the
//! batch atomically and the caller's form is untouched), then application
//! plus an advisory rule-validation pass. Later patches to the same field
//! win over earlier ones.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PatchError, PatchErrorCode};
use crate::model::{
    AnswerState, CellValue, CheckState, Field, FieldKind, FieldResponse, FieldValue, Note,
    NoteState, ParsedForm, TableRow,
};
use crate::validate::{self, Issue};

/// The wire-level patch vocabulary. Operation names are stable; external
/// tools depend on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Patch {
    SetString {
        field_id: String,
        value: Option<String>,
    },
    SetNumber {
        field_id: String,
        value: Option<f64>,
    },
    SetDate {
        field_id: String,
        value: Option<String>,
    },
    SetYear {
        field_id: String,
        value: Option<i32>,
    },
    SetUrl {
        field_id: String,
        value: Option<String>,
    },
    SetStringList {
        field_id: String,
        value: Option<Vec<String>>,
    },
    SetUrlList {
        field_id: String,
        value: Option<Vec<String>>,
    },
    SetSingleSelect {
        field_id: String,
        value: Option<String>,
    },
    SetMultiSelect {
        field_id: String,
        value: Option<Vec<String>>,
    },
    /// Partial update: given option states merge into the current ones.
    SetCheckboxes {
        field_id: String,
        value: Option<BTreeMap<String, CheckState>>,
    },
    SetTable {
        field_id: String,
        value: Option<Vec<Vec<serde_json::Value>>>,
    },
    ClearField {
        field_id: String,
    },
    SkipField {
        field_id: String,
        role: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    AbortField {
        field_id: String,
        role: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    AddNote {
        #[serde(rename = "ref")]
        target: String,
        role: String,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        state: Option<NoteState>,
    },
    RemoveNote {
        note_id: String,
    },
}

impl Patch {
    fn field_id(&self) -> Option<&str> {
        match self {
            Patch::SetString { field_id, .. }
            | Patch::SetNumber { field_id, .. }
            | Patch::SetDate { field_id, .. }
            | Patch::SetYear { field_id, .. }
            | Patch::SetUrl { field_id, .. }
            | Patch::SetStringList { field_id, .. }
            | Patch::SetUrlList { field_id, .. }
            | Patch::SetSingleSelect { field_id, .. }
            | Patch::SetMultiSelect { field_id, .. }
            | Patch::SetCheckboxes { field_id, .. }
            | Patch::SetTable { field_id, .. }
            | Patch::ClearField { field_id }
            | Patch::SkipField { field_id, .. }
            | Patch::AbortField { field_id, .. } => Some(field_id.as_str()),
            Patch::AddNote { .. } | Patch::RemoveNote { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyStatus {
    Applied,
    Rejected,
}

/// Outcome of one batch. On rejection `form` is the caller's input,
/// unchanged, and `errors` says why; on success `issues` carries the
/// advisory post-apply validation results.
#[derive(Debug)]
pub struct ApplyResult {
    pub status: ApplyStatus,
    pub form: ParsedForm,
    pub issues: Vec<Issue>,
    pub errors: Vec<PatchError>,
}

/// Apply a patch batch to `form`, returning the new form state.
///
/// The input is never mutated; interleaving concerns are the caller's
/// (sequential batches are the only supported access pattern).
pub fn apply_patches(form: &ParsedForm, patches: &[Patch]) -> ApplyResult {
    let errors: Vec<PatchError> = patches
        .iter()
        .enumerate()
        .filter_map(|(index, patch)| check_patch(form, patch, index).err())
        .collect();
    if !errors.is_empty() {
        tracing::debug!(patches = patches.len(), errors = errors.len(), "batch rejected");
        return ApplyResult {
            status: ApplyStatus::Rejected,
            form: form.clone(),
            issues: Vec::new(),
            errors,
        };
    }

    let mut next = form.clone();
    for patch in patches {
        apply_one(&mut next, patch);
    }
    let issues = validate::validate(&next);
    tracing::debug!(patches = patches.len(), issues = issues.len(), "batch applied");
    ApplyResult {
        status: ApplyStatus::Applied,
        form: next,
        issues,
        errors: Vec::new(),
    }
}

/// Phase 1: structural validation against the input form. Unknown fields,
/// unknown options, and shape mismatches are hard errors here — never
/// silently dropped.
fn check_patch(form: &ParsedForm, patch: &Patch, index: usize) -> Result<(), PatchError> {
    let field = match patch.field_id() {
        Some(field_id) => match form.field(field_id) {
            Some(field) => Some(field),
            None => {
                return Err(PatchError::for_field(
                    index,
                    PatchErrorCode::UnknownField,
                    field_id,
                    format!("no field with ID `{field_id}`"),
                ));
            }
        },
        None => None,
    };

    let shape_mismatch = |op: &str, field: &Field| {
        PatchError::for_field(
            index,
            PatchErrorCode::ShapeMismatch,
            &field.id,
            format!("`{op}` cannot target a `{}` field", field.kind.name()),
        )
    };

    match patch {
        Patch::SetString { value, .. } => {
            let field = field.unwrap();
            if !matches!(field.kind, FieldKind::Text(_)) {
                return Err(shape_mismatch("set_string", field));
            }
            check_not_sentinel(field, value.as_deref(), index)?;
        }
        Patch::SetNumber { .. } => {
            let field = field.unwrap();
            if !matches!(field.kind, FieldKind::Number(_)) {
                return Err(shape_mismatch("set_number", field));
            }
        }
        Patch::SetDate { value, .. } => {
            let field = field.unwrap();
            if !matches!(field.kind, FieldKind::Date(_)) {
                return Err(shape_mismatch("set_date", field));
            }
            check_not_sentinel(field, value.as_deref(), index)?;
        }
        Patch::SetYear { .. } => {
            let field = field.unwrap();
            if !matches!(field.kind, FieldKind::Year(_)) {
                return Err(shape_mismatch("set_year", field));
            }
        }
        Patch::SetUrl { value, .. } => {
            let field = field.unwrap();
            if !matches!(field.kind, FieldKind::Url(_)) {
                return Err(shape_mismatch("set_url", field));
            }
            check_not_sentinel(field, value.as_deref(), index)?;
        }
        Patch::SetStringList { value, .. } => {
            let field = field.unwrap();
            if !matches!(field.kind, FieldKind::TextList(_)) {
                return Err(shape_mismatch("set_string_list", field));
            }
            check_list_items(field, value.as_deref(), index)?;
        }
        Patch::SetUrlList { value, .. } => {
            let field = field.unwrap();
            if !matches!(field.kind, FieldKind::UrlList(_)) {
                return Err(shape_mismatch("set_url_list", field));
            }
            check_list_items(field, value.as_deref(), index)?;
        }
        Patch::SetSingleSelect { value, .. } => {
            let field = field.unwrap();
            if !matches!(field.kind, FieldKind::SingleSelect { .. }) {
                return Err(shape_mismatch("set_single_select", field));
            }
            if let Some(option_id) = value {
                check_option(field, option_id, index)?;
            }
        }
        Patch::SetMultiSelect { value, .. } => {
            let field = field.unwrap();
            if !matches!(field.kind, FieldKind::MultiSelect { .. }) {
                return Err(shape_mismatch("set_multi_select", field));
            }
            if let Some(selected) = value {
                for option_id in selected {
                    check_option(field, option_id, index)?;
                }
            }
        }
        Patch::SetCheckboxes { value, .. } => {
            let field = field.unwrap();
            let FieldKind::Checkboxes { mode, .. } = &field.kind else {
                return Err(shape_mismatch("set_checkboxes", field));
            };
            if let Some(states) = value {
                for (option_id, state) in states {
                    check_option(field, option_id, index)?;
                    if !state.legal_for(*mode) {
                        return Err(PatchError::for_field(
                            index,
                            PatchErrorCode::IllegalState,
                            &field.id,
                            format!(
                                "state `{}` is not legal in `{}` mode",
                                state.as_str(),
                                mode.as_str()
                            ),
                        ));
                    }
                }
            }
        }
        Patch::SetTable { value, .. } => {
            let field = field.unwrap();
            let FieldKind::Table(spec) = &field.kind else {
                return Err(shape_mismatch("set_table", field));
            };
            if let Some(rows) = value {
                for (row_index, row) in rows.iter().enumerate() {
                    if row.len() != spec.columns.len() {
                        return Err(PatchError::for_field(
                            index,
                            PatchErrorCode::ShapeMismatch,
                            &field.id,
                            format!(
                                "row {} has {} cells but {} columns are declared",
                                row_index + 1,
                                row.len(),
                                spec.columns.len()
                            ),
                        ));
                    }
                    for (cell, column) in row.iter().zip(&spec.columns) {
                        if cell_from_json(cell, column.column_type).is_none() {
                            return Err(PatchError::for_field(
                                index,
                                PatchErrorCode::ShapeMismatch,
                                &field.id,
                                format!(
                                    "row {}, column `{}`: wrong cell type",
                                    row_index + 1,
                                    column.id
                                ),
                            ));
                        }
                    }
                }
            }
        }
        Patch::ClearField { .. } => {}
        Patch::AbortField { reason, .. } => {
            check_reason(reason.as_deref(), index)?;
        }
        Patch::SkipField { reason, .. } => {
            let field = field.unwrap();
            if field.required {
                return Err(PatchError::for_field(
                    index,
                    PatchErrorCode::SkipRequired,
                    &field.id,
                    format!("required field `{}` cannot be skipped", field.id),
                ));
            }
            check_reason(reason.as_deref(), index)?;
        }
        Patch::AddNote { target, .. } => {
            if !form.resolve_ref(target) {
                return Err(PatchError::new(
                    index,
                    PatchErrorCode::UnresolvedRef,
                    format!("note ref `{target}` does not resolve"),
                ));
            }
        }
        Patch::RemoveNote { note_id } => {
            if !form.notes.iter().any(|n| &n.id == note_id) {
                return Err(PatchError::new(
                    index,
                    PatchErrorCode::UnknownNote,
                    format!("no note with ID `{note_id}`"),
                ));
            }
        }
    }
    Ok(())
}

/// Items are stored the way the parser reads them back: one trimmed line
/// per item.
fn trim_items(items: &[String]) -> Vec<String> {
    items.iter().map(|i| i.trim().to_string()).collect()
}

/// `[skipped]`/`[aborted]` lines are reserved: a literal value that spells a
/// sentinel would come back as a state change on the next parse.
fn check_not_sentinel(
    field: &Field,
    value: Option<&str>,
    index: usize,
) -> Result<(), PatchError> {
    if value.is_some_and(|v| crate::model::response::parse_sentinel(v).is_some()) {
        return Err(PatchError::for_field(
            index,
            PatchErrorCode::ShapeMismatch,
            &field.id,
            "skip/abort sentinels are reserved; use skip_field/abort_field",
        ));
    }
    Ok(())
}

/// List items live one-per-line in the persisted text, so embedded newlines
/// would change the item count on the next parse.
fn check_list_items(
    field: &Field,
    items: Option<&[String]>,
    index: usize,
) -> Result<(), PatchError> {
    let Some(items) = items else {
        return Ok(());
    };
    for item in items {
        if item.contains('\n') {
            return Err(PatchError::for_field(
                index,
                PatchErrorCode::ShapeMismatch,
                &field.id,
                "list items cannot contain newlines",
            ));
        }
    }
    if let [only] = items {
        check_not_sentinel(field, Some(only.as_str()), index)?;
    }
    Ok(())
}

/// Skip/abort reasons are persisted on a single sentinel line.
fn check_reason(reason: Option<&str>, index: usize) -> Result<(), PatchError> {
    if reason.is_some_and(|r| r.contains('\n')) {
        return Err(PatchError::new(
            index,
            PatchErrorCode::ShapeMismatch,
            "skip/abort reasons cannot contain newlines",
        ));
    }
    Ok(())
}

fn check_option(field: &Field, option_id: &str, index: usize) -> Result<(), PatchError> {
    if field.kind.option(option_id).is_none() {
        return Err(PatchError::for_field(
            index,
            PatchErrorCode::UnknownOption,
            &field.id,
            format!(
                "option `{option_id}` is not defined in field `{}`",
                field.id
            ),
        ));
    }
    Ok(())
}

/// Phase 2: apply one already-validated patch.
fn apply_one(form: &mut ParsedForm, patch: &Patch) {
    match patch {
        Patch::SetString { field_id, value } => {
            set_value(form, field_id, value.clone().map(FieldValue::Text));
        }
        Patch::SetNumber { field_id, value } => {
            set_value(form, field_id, value.map(FieldValue::Number));
        }
        Patch::SetDate { field_id, value } => {
            set_value(form, field_id, value.clone().map(FieldValue::Date));
        }
        Patch::SetYear { field_id, value } => {
            set_value(form, field_id, value.map(FieldValue::Year));
        }
        Patch::SetUrl { field_id, value } => {
            set_value(form, field_id, value.clone().map(FieldValue::Url));
        }
        Patch::SetStringList { field_id, value } => {
            let items = value.as_ref().map(|v| trim_items(v));
            set_value(form, field_id, items.map(FieldValue::TextList));
        }
        Patch::SetUrlList { field_id, value } => {
            let items = value.as_ref().map(|v| trim_items(v));
            set_value(form, field_id, items.map(FieldValue::UrlList));
        }
        Patch::SetSingleSelect { field_id, value } => {
            set_value(form, field_id, value.clone().map(FieldValue::SingleSelect));
        }
        Patch::SetMultiSelect { field_id, value } => {
            set_value(form, field_id, value.clone().map(FieldValue::MultiSelect));
        }
        Patch::SetCheckboxes { field_id, value } => {
            let merged = value.as_ref().filter(|v| !v.is_empty()).map(|updates| {
                let field = form.field(field_id).expect("checked in phase 1");
                let FieldKind::Checkboxes { options, mode, .. } = &field.kind else {
                    unreachable!("checked in phase 1");
                };
                // Materialize every option, then fold the update in.
                let mut states: BTreeMap<String, CheckState> = options
                    .iter()
                    .map(|o| (o.id.clone(), CheckState::default_for(*mode)))
                    .collect();
                if let Some(FieldValue::Checkboxes(current)) =
                    form.response(field_id).and_then(|r| r.value.as_ref())
                {
                    for (id, state) in current {
                        states.insert(id.clone(), *state);
                    }
                }
                for (id, state) in updates {
                    states.insert(id.clone(), *state);
                }
                FieldValue::Checkboxes(states)
            });
            set_value(form, field_id, merged);
        }
        Patch::SetTable { field_id, value } => {
            let rows = value.as_ref().map(|rows| {
                let field = form.field(field_id).expect("checked in phase 1");
                let FieldKind::Table(spec) = &field.kind else {
                    unreachable!("checked in phase 1");
                };
                let rows = rows
                    .iter()
                    .map(|row| TableRow {
                        cells: row
                            .iter()
                            .zip(&spec.columns)
                            .map(|(cell, column)| {
                                cell_from_json(cell, column.column_type)
                                    .expect("checked in phase 1")
                            })
                            .collect(),
                    })
                    .collect();
                FieldValue::Table(rows)
            });
            set_value(form, field_id, rows);
        }
        Patch::ClearField { field_id } => {
            set_value(form, field_id, None);
        }
        Patch::SkipField {
            field_id,
            role,
            reason,
        } => {
            form.responses
                .insert(field_id.clone(), FieldResponse::skipped(reason.clone()));
            push_audit_note(form, field_id, role, reason.as_deref(), NoteState::Skipped);
        }
        Patch::AbortField {
            field_id,
            role,
            reason,
        } => {
            form.responses
                .insert(field_id.clone(), FieldResponse::aborted(reason.clone()));
            push_audit_note(form, field_id, role, reason.as_deref(), NoteState::Aborted);
        }
        Patch::AddNote {
            target,
            role,
            text,
            state,
        } => {
            form.notes.push(Note {
                id: Uuid::new_v4().to_string(),
                target: target.clone(),
                role: role.clone(),
                text: text.clone(),
                state: *state,
            });
        }
        Patch::RemoveNote { note_id } => {
            form.notes.retain(|n| &n.id != note_id);
        }
    }
}

/// Set or clear a field's value. An empty value is equivalent to a clear.
/// Leaving a skipped/aborted state drops the notes linked to it.
fn set_value(form: &mut ParsedForm, field_id: &str, value: Option<FieldValue>) {
    let was_terminal = form
        .response(field_id)
        .is_some_and(|r| matches!(r.state, AnswerState::Skipped | AnswerState::Aborted));
    let response = match value {
        Some(value) if !value.is_empty() => FieldResponse::answered(value),
        _ => FieldResponse::unanswered(),
    };
    form.responses.insert(field_id.to_string(), response);
    if was_terminal {
        form.notes
            .retain(|n| !(n.target == field_id && n.state.is_some()));
    }
}

fn push_audit_note(
    form: &mut ParsedForm,
    field_id: &str,
    role: &str,
    reason: Option<&str>,
    state: NoteState,
) {
    let Some(reason) = reason else {
        return;
    };
    form.notes.push(Note {
        id: Uuid::new_v4().to_string(),
        target: field_id.to_string(),
        role: role.to_string(),
        text: reason.to_string(),
        state: Some(state),
    });
}

pub(crate) fn cell_from_json(
    value: &serde_json::Value,
    column_type: crate::model::ColumnType,
) -> Option<CellValue> {
    use crate::model::ColumnType;
    match (column_type, value) {
        (ColumnType::Number, serde_json::Value::Number(n)) => {
            n.as_f64().map(CellValue::Number)
        }
        (ColumnType::Text | ColumnType::Date | ColumnType::Url, serde_json::Value::String(s)) => {
            // Table rows are one line each in the persisted text.
            if s.contains('\n') {
                return None;
            }
            Some(CellValue::Text(s.clone()))
        }
        _ => None,
    }
}
