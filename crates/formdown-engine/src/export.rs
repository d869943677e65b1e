//! JSON export.
//!
//! Two shapes: the structured form (`{state, value?, reason?}` per field,
//! unambiguous) and a friendly form (bare values, with skip/abort encoded as
//! sentinel strings). Both round-trip to the same internal response model.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::{PatchError, PatchErrorCode};
use crate::model::response::{parse_sentinel, sentinel_string};
use crate::model::{
    AnswerState, CellValue, CheckState, Field, FieldKind, FieldResponse, FieldValue, FormSchema,
    ParsedForm, TableRow,
};
use crate::patch::cell_from_json;

/// The structured export: schema plus per-field response records.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedForm {
    pub schema: FormSchema,
    pub values: BTreeMap<String, ExportedValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportedValue {
    pub state: AnswerState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub fn export_json(form: &ParsedForm) -> ExportedForm {
    let values = form
        .responses
        .iter()
        .map(|(id, response)| {
            (
                id.clone(),
                ExportedValue {
                    state: response.state,
                    value: response.value.as_ref().map(value_to_json),
                    reason: response.reason.clone(),
                },
            )
        })
        .collect();
    ExportedForm {
        schema: form.schema.clone(),
        values,
    }
}

/// The friendly export: one bare JSON value per field. Unanswered fields are
/// `null`; skipped/aborted fields are sentinel strings.
pub fn export_friendly(form: &ParsedForm) -> BTreeMap<String, Value> {
    form.responses
        .iter()
        .map(|(id, response)| {
            let value = match response.state {
                AnswerState::Unanswered => Value::Null,
                AnswerState::Answered => response
                    .value
                    .as_ref()
                    .map(value_to_json)
                    .unwrap_or(Value::Null),
                AnswerState::Skipped | AnswerState::Aborted => Value::String(
                    sentinel_string(response.state, response.reason.as_deref())
                        .expect("skip/abort states have sentinels"),
                ),
            };
            (id.clone(), value)
        })
        .collect()
}

pub fn value_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(s) | FieldValue::Date(s) | FieldValue::Url(s) => {
            Value::String(s.clone())
        }
        FieldValue::Number(n) => serde_json::json!(n),
        FieldValue::Year(y) => serde_json::json!(y),
        FieldValue::TextList(items) | FieldValue::UrlList(items) => {
            Value::Array(items.iter().map(|i| Value::String(i.clone())).collect())
        }
        FieldValue::SingleSelect(id) => Value::String(id.clone()),
        FieldValue::MultiSelect(ids) => {
            Value::Array(ids.iter().map(|i| Value::String(i.clone())).collect())
        }
        FieldValue::Checkboxes(states) => Value::Object(
            states
                .iter()
                .map(|(id, state)| (id.clone(), Value::String(state.as_str().to_string())))
                .collect(),
        ),
        FieldValue::Table(rows) => Value::Array(
            rows.iter()
                .map(|row| {
                    Value::Array(
                        row.cells
                            .iter()
                            .map(|cell| match cell {
                                CellValue::Number(n) => serde_json::json!(n),
                                CellValue::Text(s) => Value::String(s.clone()),
                            })
                            .collect(),
                    )
                })
                .collect(),
        ),
    }
}

/// Rebuild a response from a friendly export value. This is the inverse of
/// [`export_friendly`] for a single field.
pub fn response_from_friendly(
    field: &Field,
    value: &Value,
) -> Result<FieldResponse, PatchError> {
    if value.is_null() {
        return Ok(FieldResponse::unanswered());
    }
    if let Value::String(text) = value
        && let Some((state, reason)) = parse_sentinel(text)
    {
        if state == AnswerState::Skipped && field.required {
            return Err(PatchError::for_field(
                0,
                PatchErrorCode::SkipRequired,
                &field.id,
                format!("required field `{}` cannot be skipped", field.id),
            ));
        }
        return Ok(match state {
            AnswerState::Skipped => FieldResponse::skipped(reason),
            _ => FieldResponse::aborted(reason),
        });
    }

    let mismatch = |expected: &str| {
        PatchError::for_field(
            0,
            PatchErrorCode::ShapeMismatch,
            &field.id,
            format!("field `{}` expects {expected}", field.id),
        )
    };

    let parsed = match &field.kind {
        FieldKind::Text(_) => FieldValue::Text(
            value.as_str().ok_or_else(|| mismatch("a string"))?.to_string(),
        ),
        FieldKind::Date(_) => FieldValue::Date(
            value.as_str().ok_or_else(|| mismatch("a date string"))?.to_string(),
        ),
        FieldKind::Url(_) => FieldValue::Url(
            value.as_str().ok_or_else(|| mismatch("a URL string"))?.to_string(),
        ),
        FieldKind::Number(_) => {
            FieldValue::Number(value.as_f64().ok_or_else(|| mismatch("a number"))?)
        }
        FieldKind::Year(_) => {
            let year = value.as_i64().ok_or_else(|| mismatch("a year"))?;
            FieldValue::Year(year as i32)
        }
        FieldKind::TextList(_) | FieldKind::UrlList(_) => {
            let items = string_array(value).ok_or_else(|| mismatch("an array of strings"))?;
            if matches!(field.kind, FieldKind::TextList(_)) {
                FieldValue::TextList(items)
            } else {
                FieldValue::UrlList(items)
            }
        }
        FieldKind::SingleSelect { .. } => {
            let id = value.as_str().ok_or_else(|| mismatch("an option ID"))?;
            check_option(field, id)?;
            FieldValue::SingleSelect(id.to_string())
        }
        FieldKind::MultiSelect { .. } => {
            let ids = string_array(value).ok_or_else(|| mismatch("an array of option IDs"))?;
            for id in &ids {
                check_option(field, id)?;
            }
            FieldValue::MultiSelect(ids)
        }
        FieldKind::Checkboxes { mode, .. } => {
            let map = value
                .as_object()
                .ok_or_else(|| mismatch("an object of option states"))?;
            let mut states = BTreeMap::new();
            for (id, state) in map {
                check_option(field, id)?;
                let state: CheckState = serde_json::from_value(state.clone())
                    .map_err(|_| mismatch("known checkbox states"))?;
                if !state.legal_for(*mode) {
                    return Err(PatchError::for_field(
                        0,
                        PatchErrorCode::IllegalState,
                        &field.id,
                        format!(
                            "state `{}` is not legal in `{}` mode",
                            state.as_str(),
                            mode.as_str()
                        ),
                    ));
                }
                states.insert(id.clone(), state);
            }
            FieldValue::Checkboxes(states)
        }
        FieldKind::Table(spec) => {
            let rows = value
                .as_array()
                .ok_or_else(|| mismatch("an array of rows"))?;
            let mut parsed_rows = Vec::new();
            for row in rows {
                let cells = row
                    .as_array()
                    .ok_or_else(|| mismatch("rows of cell arrays"))?;
                if cells.len() != spec.columns.len() {
                    return Err(mismatch("rows matching the declared columns"));
                }
                let mut parsed_cells = Vec::new();
                for (cell, column) in cells.iter().zip(&spec.columns) {
                    let parsed = cell_from_json(cell, column.column_type)
                        .ok_or_else(|| mismatch("cells matching their column types"))?;
                    parsed_cells.push(parsed);
                }
                parsed_rows.push(TableRow {
                    cells: parsed_cells,
                });
            }
            FieldValue::Table(parsed_rows)
        }
    };

    if parsed.is_empty() {
        Ok(FieldResponse::unanswered())
    } else {
        Ok(FieldResponse::answered(parsed))
    }
}

fn string_array(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    items
        .iter()
        .map(|i| i.as_str().map(|s| s.to_string()))
        .collect()
}

fn check_option(field: &Field, option_id: &str) -> Result<(), PatchError> {
    if field.kind.option(option_id).is_none() {
        return Err(PatchError::for_field(
            0,
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
