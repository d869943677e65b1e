//! Built-in rule validator.
//!
//! A stateless pass over a parsed form, run after parsing and after every
//! patch batch. Everything here is advisory: issues describe what still
//! needs attention, they never stop an operation.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::model::{
    AnswerState, CellValue, CheckState, CheckboxMode, ColumnType, Field, FieldKind,
    FieldOption, FieldResponse, FieldValue, ListConstraints, ParsedForm, TableSpec,
    TextConstraints,
};

use super::issue::{Issue, IssueCode, Severity};

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://\S+$").unwrap());

/// Run every built-in rule against the form.
pub fn validate(form: &ParsedForm) -> Vec<Issue> {
    let mut issues = Vec::new();
    for (field, response) in form.fields_with_responses() {
        check_field(field, response, &mut issues);
    }
    issues
}

fn check_field(field: &Field, response: &FieldResponse, issues: &mut Vec<Issue>) {
    match response.state {
        AnswerState::Aborted => {
            issues.push(Issue::builtin(
                Severity::Warning,
                IssueCode::FieldAborted,
                &field.id,
                match &response.reason {
                    Some(reason) => format!("field was aborted: {reason}"),
                    None => "field was aborted".to_string(),
                },
            ));
        }
        AnswerState::Skipped => {}
        AnswerState::Unanswered => {
            if field.required {
                issues.push(Issue::builtin(
                    Severity::Error,
                    IssueCode::RequiredMissing,
                    &field.id,
                    format!("required field `{}` has no value", field.id),
                ));
            } else {
                issues.push(Issue::builtin(
                    Severity::Info,
                    IssueCode::OptionalUnanswered,
                    &field.id,
                    format!("optional field `{}` has no value", field.id),
                ));
            }
        }
        AnswerState::Answered => {
            let Some(value) = &response.value else {
                return;
            };
            check_value(field, value, issues);
        }
    }
}

fn check_value(field: &Field, value: &FieldValue, issues: &mut Vec<Issue>) {
    match (&field.kind, value) {
        (FieldKind::Text(constraints), FieldValue::Text(text)) => {
            check_text(field, text, constraints, issues);
        }
        (FieldKind::Url(constraints), FieldValue::Url(url)) => {
            check_url_shape(url, &field.id, issues);
            check_text(field, url, constraints, issues);
        }
        (FieldKind::Number(constraints), FieldValue::Number(number)) => {
            if constraints.integer && number.fract() != 0.0 {
                issues.push(Issue::builtin(
                    Severity::Error,
                    IssueCode::NotAnInteger,
                    &field.id,
                    format!("`{number}` is not an integer"),
                ));
            }
            let below = constraints.min.is_some_and(|min| *number < min);
            let above = constraints.max.is_some_and(|max| *number > max);
            if below || above {
                issues.push(out_of_range(&field.id, &format!("{number}")));
            }
        }
        (FieldKind::Year(constraints), FieldValue::Year(year)) => {
            let below = constraints.min.is_some_and(|min| *year < min);
            let above = constraints.max.is_some_and(|max| *year > max);
            if below || above {
                issues.push(out_of_range(&field.id, &format!("{year}")));
            }
        }
        (FieldKind::Date(constraints), FieldValue::Date(date)) => {
            match parse_date(date) {
                None => {
                    issues.push(Issue::builtin(
                        Severity::Error,
                        IssueCode::InvalidDate,
                        &field.id,
                        format!("`{date}` is not a YYYY-MM-DD date"),
                    ));
                }
                Some(parsed) => {
                    let below = constraints
                        .min
                        .as_deref()
                        .and_then(parse_date)
                        .is_some_and(|min| parsed < min);
                    let above = constraints
                        .max
                        .as_deref()
                        .and_then(parse_date)
                        .is_some_and(|max| parsed > max);
                    if below || above {
                        issues.push(out_of_range(&field.id, date));
                    }
                }
            }
        }
        (FieldKind::TextList(constraints), FieldValue::TextList(items)) => {
            check_list(field, items, constraints, false, issues);
        }
        (FieldKind::UrlList(constraints), FieldValue::UrlList(items)) => {
            check_list(field, items, constraints, true, issues);
        }
        (FieldKind::SingleSelect { options }, FieldValue::SingleSelect(selected)) => {
            check_known_options(field, std::slice::from_ref(selected), options, issues);
        }
        (
            FieldKind::MultiSelect {
                options,
                min_selected,
                max_selected,
            },
            FieldValue::MultiSelect(selected),
        ) => {
            check_known_options(field, selected, options, issues);
            let below = min_selected.is_some_and(|min| selected.len() < min);
            let above = max_selected.is_some_and(|max| selected.len() > max);
            if below || above {
                issues.push(Issue::builtin(
                    Severity::Error,
                    IssueCode::SelectionCount,
                    &field.id,
                    format!("{} option(s) selected", selected.len()),
                ));
            }
        }
        (
            FieldKind::Checkboxes {
                options,
                mode,
                min_done,
            },
            FieldValue::Checkboxes(states),
        ) => {
            check_checkboxes(field, options, *mode, *min_done, states, issues);
        }
        (FieldKind::Table(spec), FieldValue::Table(rows)) => {
            check_table(field, spec, rows, issues);
        }
        // Shape mismatches cannot be produced by the parser or the patch
        // engine; nothing to report here.
        _ => {}
    }
}

fn check_text(
    field: &Field,
    text: &str,
    constraints: &TextConstraints,
    issues: &mut Vec<Issue>,
) {
    let length = text.chars().count();
    if constraints.min_length.is_some_and(|min| length < min) {
        issues.push(Issue::builtin(
            Severity::Error,
            IssueCode::TooShort,
            &field.id,
            format!("{length} character(s), minimum is {}", constraints.min_length.unwrap()),
        ));
    }
    if constraints.max_length.is_some_and(|max| length > max) {
        issues.push(Issue::builtin(
            Severity::Error,
            IssueCode::TooLong,
            &field.id,
            format!("{length} character(s), maximum is {}", constraints.max_length.unwrap()),
        ));
    }
    if let Some(pattern) = &constraints.pattern {
        match Regex::new(pattern) {
            Ok(re) => {
                if !re.is_match(text) {
                    issues.push(Issue::builtin(
                        Severity::Error,
                        IssueCode::PatternMismatch,
                        &field.id,
                        format!("value does not match `{pattern}`"),
                    ));
                }
            }
            Err(_) => {
                issues.push(Issue::builtin(
                    Severity::Warning,
                    IssueCode::PatternMismatch,
                    &field.id,
                    format!("pattern `{pattern}` is not a valid regex"),
                ));
            }
        }
    }
}

fn check_url_shape(url: &str, target: &str, issues: &mut Vec<Issue>) {
    if !URL_RE.is_match(url) {
        issues.push(Issue::builtin(
            Severity::Error,
            IssueCode::InvalidUrl,
            target,
            format!("`{url}` is not an http(s) URL"),
        ));
    }
}

fn check_list(
    field: &Field,
    items: &[String],
    constraints: &ListConstraints,
    urls: bool,
    issues: &mut Vec<Issue>,
) {
    if constraints.min_items.is_some_and(|min| items.len() < min) {
        issues.push(Issue::builtin(
            Severity::Error,
            IssueCode::MinItemsNotMet,
            &field.id,
            format!(
                "{} item(s), minimum is {}",
                items.len(),
                constraints.min_items.unwrap()
            ),
        ));
    }
    if constraints.max_items.is_some_and(|max| items.len() > max) {
        issues.push(Issue::builtin(
            Severity::Error,
            IssueCode::MaxItemsExceeded,
            &field.id,
            format!(
                "{} item(s), maximum is {}",
                items.len(),
                constraints.max_items.unwrap()
            ),
        ));
    }
    if let Some(limit) = constraints.item_max_length {
        for (index, item) in items.iter().enumerate() {
            if item.chars().count() > limit {
                issues.push(Issue::builtin(
                    Severity::Error,
                    IssueCode::ItemTooLong,
                    &field.id,
                    format!("item {} exceeds {limit} characters", index + 1),
                ));
            }
        }
    }
    if constraints.unique {
        let mut seen = std::collections::HashSet::new();
        for item in items {
            if !seen.insert(item) {
                issues.push(Issue::builtin(
                    Severity::Error,
                    IssueCode::DuplicateItems,
                    &field.id,
                    format!("`{item}` appears more than once"),
                ));
            }
        }
    }
    if urls {
        for item in items {
            check_url_shape(item, &field.id, issues);
        }
    }
}

fn check_known_options(
    field: &Field,
    selected: &[String],
    options: &[FieldOption],
    issues: &mut Vec<Issue>,
) {
    for id in selected {
        if !options.iter().any(|o| &o.id == id) {
            issues.push(Issue::builtin(
                Severity::Error,
                IssueCode::UnknownOption,
                format!("{}.{id}", field.id),
                format!("option `{id}` is not defined in field `{}`", field.id),
            ));
        }
    }
}

fn check_checkboxes(
    field: &Field,
    options: &[FieldOption],
    mode: CheckboxMode,
    min_done: i32,
    states: &BTreeMap<String, CheckState>,
    issues: &mut Vec<Issue>,
) {
    for (id, state) in states {
        if !options.iter().any(|o| &o.id == id) {
            issues.push(Issue::builtin(
                Severity::Error,
                IssueCode::UnknownOption,
                format!("{}.{id}", field.id),
                format!("option `{id}` is not defined in field `{}`", field.id),
            ));
        }
        if !state.legal_for(mode) {
            issues.push(Issue::builtin(
                Severity::Error,
                IssueCode::IllegalCheckboxState,
                format!("{}.{id}", field.id),
                format!(
                    "state `{}` is not legal in `{}` mode",
                    state.as_str(),
                    mode.as_str()
                ),
            ));
        }
    }

    if !checkbox_complete(mode, min_done, options, states) {
        if mode == CheckboxMode::Explicit {
            let unfilled = options
                .iter()
                .filter(|o| {
                    states.get(&o.id).copied().unwrap_or(CheckState::Unfilled)
                        == CheckState::Unfilled
                })
                .count();
            issues.push(Issue::builtin(
                Severity::Error,
                IssueCode::ExplicitUnfilled,
                &field.id,
                format!("{unfilled} option(s) still unfilled"),
            ));
        } else {
            // Advisory, not an error: an unfinished checklist is the
            // `incomplete` progress state, not an invalid value.
            issues.push(Issue::builtin(
                Severity::Warning,
                IssueCode::CheckboxIncomplete,
                &field.id,
                "checklist is not finished".to_string(),
            ));
        }
    }
}

/// Mode-specific checkbox completion.
///
/// - `simple`: done-count meets `min_done` (`-1` = every option).
/// - `multi`: every option is `done` or `na`.
/// - `explicit`: no option is `unfilled`.
pub fn checkbox_complete(
    mode: CheckboxMode,
    min_done: i32,
    options: &[FieldOption],
    states: &BTreeMap<String, CheckState>,
) -> bool {
    let state_of = |option: &FieldOption| {
        states
            .get(&option.id)
            .copied()
            .unwrap_or_else(|| CheckState::default_for(mode))
    };
    match mode {
        CheckboxMode::Simple => {
            let done = options
                .iter()
                .filter(|o| state_of(o) == CheckState::Done)
                .count();
            let needed = if min_done < 0 {
                options.len()
            } else {
                (min_done as usize).min(options.len())
            };
            done >= needed
        }
        CheckboxMode::Multi => options
            .iter()
            .all(|o| matches!(state_of(o), CheckState::Done | CheckState::Na)),
        CheckboxMode::Explicit => options
            .iter()
            .all(|o| state_of(o) != CheckState::Unfilled),
    }
}

fn check_table(field: &Field, spec: &TableSpec, rows: &[crate::model::TableRow], issues: &mut Vec<Issue>) {
    let below = spec.min_rows.is_some_and(|min| rows.len() < min);
    let above = spec.max_rows.is_some_and(|max| rows.len() > max);
    if below || above {
        issues.push(Issue::builtin(
            Severity::Error,
            IssueCode::RowCountOutOfBounds,
            &field.id,
            format!("{} row(s)", rows.len()),
        ));
    }
    for (row_index, row) in rows.iter().enumerate() {
        for (cell, column) in row.cells.iter().zip(&spec.columns) {
            if let CellValue::Text(text) = cell {
                match column.column_type {
                    ColumnType::Date if parse_date(text).is_none() => {
                        issues.push(Issue::builtin(
                            Severity::Error,
                            IssueCode::InvalidDate,
                            &field.id,
                            format!(
                                "row {}, column `{}`: `{text}` is not a YYYY-MM-DD date",
                                row_index + 1,
                                column.id
                            ),
                        ));
                    }
                    ColumnType::Url if !URL_RE.is_match(text) => {
                        issues.push(Issue::builtin(
                            Severity::Error,
                            IssueCode::InvalidUrl,
                            &field.id,
                            format!(
                                "row {}, column `{}`: `{text}` is not an http(s) URL",
                                row_index + 1,
                                column.id
                            ),
                        ));
                    }
                    _ => {}
                }
            }
        }
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

fn out_of_range(target: &str, value: &str) -> Issue {
    Issue::builtin(
        Severity::Error,
        IssueCode::OutOfRange,
        target,
        format!("`{value}` is out of range"),
    )
}
