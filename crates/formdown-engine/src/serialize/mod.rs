//! Canonical serializer.
//!
//! Deterministic text generation, not a general formatter: attribute order,
//! whitespace, fence selection, and block placement are all fixed so that
//! round-trip stability tests and content-hash comparisons hold. Derived
//! summaries are recomputed on every call and never trusted from input.

pub mod fence;

use std::collections::HashMap;

use crate::model::response::{format_number, sentinel_string};
use crate::model::{
    AnswerState, CellValue, CheckState, DocumentationBlock, Field, FieldKind, FieldOption,
    FieldResponse, FieldValue, Note, ParsedForm,
};
use crate::parsing::frontmatter::{SUMMARY_KEY, VERSION_KEY};
use crate::summary;
use crate::validate;

/// Render a form back to canonical `.form.md` text.
pub fn serialize(form: &ParsedForm) -> String {
    let issues = validate::validate(form);
    let mut blocks: Vec<String> = Vec::new();

    blocks.push(metadata_block(form, &issues));

    let docs_by_target = index_docs(form);

    blocks.push(open_tag(
        "form",
        &[
            ("id", Some(form.schema.id.clone())),
            ("title", form.schema.title.clone()),
        ],
    ));
    if let Some(title) = &form.schema.title {
        blocks.push(format!("# {}", escape_text(title)));
    }
    push_docs(&mut blocks, &docs_by_target, &form.schema.id);

    for group in &form.schema.groups {
        // An implicit checkboxes form canonicalizes back to its bare style;
        // the reserved IDs never appear as explicit tags.
        if group.id == crate::model::IMPLICIT_GROUP_ID {
            for field in &group.fields {
                let response = form
                    .responses
                    .get(&field.id)
                    .expect("every field has a response entry");
                if let Some(options) = field.kind.options() {
                    blocks.push(options_block(field, options, response));
                }
                if matches!(
                    response.state,
                    AnswerState::Skipped | AnswerState::Aborted
                ) {
                    let sentinel =
                        sentinel_string(response.state, response.reason.as_deref())
                            .expect("skip/abort states have sentinels");
                    blocks.push(value_fence(&sentinel));
                }
                push_docs(&mut blocks, &docs_by_target, &field.id);
            }
            continue;
        }

        let validate_attr = if group.validator_refs.is_empty() {
            None
        } else {
            Some(group.validator_refs.join(","))
        };
        blocks.push(open_tag(
            "group",
            &[
                ("id", Some(group.id.clone())),
                ("title", group.title.clone()),
                ("validate", validate_attr),
            ],
        ));
        if let Some(title) = &group.title {
            blocks.push(format!("## {}", escape_text(title)));
        }
        push_docs(&mut blocks, &docs_by_target, &group.id);

        for field in &group.fields {
            let response = form
                .responses
                .get(&field.id)
                .expect("every field has a response entry");
            blocks.push(field_open_tag(field));
            blocks.push(format!("**{}**", escape_text(&field.label)));
            push_docs(&mut blocks, &docs_by_target, &field.id);
            blocks.extend(field_body(field, response));
            blocks.push("<!-- /field -->".to_string());
        }

        blocks.push("<!-- /group -->".to_string());
    }

    for note in &form.notes {
        blocks.push(note_block(note));
    }

    blocks.push("<!-- /form -->".to_string());

    let text = blocks.join("\n\n") + "\n";
    tracing::debug!(form = %form.schema.id, bytes = text.len(), "serialized form");
    text
}

/// Docs grouped by the field/group/form they belong to (option-qualified
/// targets group under their field), each bucket sorted by target then tag.
fn index_docs(form: &ParsedForm) -> HashMap<String, Vec<&DocumentationBlock>> {
    let mut by_target: HashMap<String, Vec<&DocumentationBlock>> = HashMap::new();
    for doc in &form.docs {
        let base = doc
            .target
            .split_once('.')
            .map(|(field, _)| field)
            .unwrap_or(&doc.target);
        by_target.entry(base.to_string()).or_default().push(doc);
    }
    for bucket in by_target.values_mut() {
        bucket.sort_by(|a, b| a.target.cmp(&b.target).then(a.tag.cmp(&b.tag)));
    }
    by_target
}

fn push_docs(
    blocks: &mut Vec<String>,
    docs_by_target: &HashMap<String, Vec<&DocumentationBlock>>,
    target: &str,
) {
    if let Some(bucket) = docs_by_target.get(target) {
        for doc in bucket {
            blocks.push(format!(
                "<!-- doc ref=\"{}\" tag=\"{}\" -->\n{}\n<!-- /doc -->",
                escape_attr(&doc.target),
                doc.tag.as_str(),
                doc.body
            ));
        }
    }
}

fn note_block(note: &Note) -> String {
    let mut attrs = vec![
        ("id", Some(note.id.clone())),
        ("ref", Some(note.target.clone())),
        ("role", Some(note.role.clone())),
        ("state", note.state.map(|s| s.as_str().to_string())),
    ];
    attrs.sort_by(|a, b| a.0.cmp(b.0));
    let rendered = render_attrs(&attrs);
    format!("<!-- note{rendered} -->\n{}\n<!-- /note -->", note.text)
}

/// Render an opening tag with its attributes alphabetized.
fn open_tag(name: &str, attrs: &[(&str, Option<String>)]) -> String {
    let mut attrs: Vec<(&str, Option<String>)> = attrs.to_vec();
    attrs.sort_by(|a, b| a.0.cmp(b.0));
    format!("<!-- {name}{} -->", render_attrs(&attrs))
}

fn render_attrs(attrs: &[(&str, Option<String>)]) -> String {
    let mut out = String::new();
    for (key, value) in attrs {
        if let Some(value) = value {
            out.push_str(&format!(" {key}=\"{}\"", escape_attr(value)));
        }
    }
    out
}

/// Attribute values are escaped only when their literal text could be
/// misparsed as tag syntax.
fn escape_attr(value: &str) -> String {
    if value.contains(['"', '&', '<', '>']) {
        html_escape::encode_safe(value).into_owned()
    } else {
        value.to_string()
    }
}

/// Same rule for label/title text rendered into the Markdown body.
fn escape_text(text: &str) -> String {
    if text.contains(['<', '&']) {
        html_escape::encode_text(text).into_owned()
    } else {
        text.to_string()
    }
}

fn field_open_tag(field: &Field) -> String {
    let mut attrs: Vec<(&str, Option<String>)> = vec![
        ("id", Some(field.id.clone())),
        ("kind", Some(field.kind.name().to_string())),
        ("label", Some(field.label.clone())),
        ("priority", Some(field.priority.as_str().to_string())),
        ("required", Some(field.required.to_string())),
        ("role", field.role.clone()),
        ("placeholder", field.placeholder.clone()),
        (
            "examples",
            if field.examples.is_empty() {
                None
            } else {
                Some(field.examples.join(","))
            },
        ),
    ];

    match &field.kind {
        FieldKind::Text(c) | FieldKind::Url(c) => {
            attrs.push(("min-length", c.min_length.map(|v| v.to_string())));
            attrs.push(("max-length", c.max_length.map(|v| v.to_string())));
            attrs.push(("pattern", c.pattern.clone()));
        }
        FieldKind::Number(c) => {
            attrs.push(("min", c.min.map(format_number)));
            attrs.push(("max", c.max.map(format_number)));
            attrs.push(("integer", c.integer.then(|| "true".to_string())));
        }
        FieldKind::Date(c) => {
            attrs.push(("min", c.min.clone()));
            attrs.push(("max", c.max.clone()));
        }
        FieldKind::Year(c) => {
            attrs.push(("min", c.min.map(|v| v.to_string())));
            attrs.push(("max", c.max.map(|v| v.to_string())));
        }
        FieldKind::TextList(c) | FieldKind::UrlList(c) => {
            attrs.push(("min-items", c.min_items.map(|v| v.to_string())));
            attrs.push(("max-items", c.max_items.map(|v| v.to_string())));
            attrs.push(("item-max-length", c.item_max_length.map(|v| v.to_string())));
            attrs.push(("unique", c.unique.then(|| "true".to_string())));
        }
        FieldKind::SingleSelect { .. } => {}
        FieldKind::MultiSelect {
            min_selected,
            max_selected,
            ..
        } => {
            attrs.push(("min-selected", min_selected.map(|v| v.to_string())));
            attrs.push(("max-selected", max_selected.map(|v| v.to_string())));
        }
        FieldKind::Checkboxes { mode, min_done, .. } => {
            attrs.push(("mode", Some(mode.as_str().to_string())));
            attrs.push((
                "min-done",
                (*min_done >= 0).then(|| min_done.to_string()),
            ));
        }
        FieldKind::Table(spec) => {
            let columns = spec
                .columns
                .iter()
                .map(|c| format!("{}:{}", c.id, c.column_type.as_str()))
                .collect::<Vec<_>>()
                .join(",");
            attrs.push(("columns", Some(columns)));
            attrs.push(("min-rows", spec.min_rows.map(|v| v.to_string())));
            attrs.push(("max-rows", spec.max_rows.map(|v| v.to_string())));
        }
    }

    attrs.sort_by(|a, b| a.0.cmp(b.0));
    format!("<!-- field{} -->", render_attrs(&attrs))
}

/// The field's body blocks: option list, table, and/or value fence.
fn field_body(field: &Field, response: &FieldResponse) -> Vec<String> {
    let mut blocks = Vec::new();

    if let Some(options) = field.kind.options() {
        blocks.push(options_block(field, options, response));
    }
    if let FieldKind::Table(spec) = &field.kind {
        blocks.push(table_block(spec, response));
    }

    match response.state {
        AnswerState::Skipped | AnswerState::Aborted => {
            let sentinel = sentinel_string(response.state, response.reason.as_deref())
                .expect("skip/abort states have sentinels");
            blocks.push(value_fence(&sentinel));
        }
        AnswerState::Answered => {
            if let Some(text) = scalar_value_text(response) {
                blocks.push(value_fence(&text));
            }
        }
        AnswerState::Unanswered => {}
    }

    blocks
}

/// Fenced representation of an answered scalar/list value; `None` for kinds
/// whose value lives in markers or table rows.
fn scalar_value_text(response: &FieldResponse) -> Option<String> {
    match response.value.as_ref()? {
        FieldValue::Text(s) | FieldValue::Date(s) | FieldValue::Url(s) => Some(s.clone()),
        FieldValue::Number(n) => Some(format_number(*n)),
        FieldValue::Year(y) => Some(y.to_string()),
        FieldValue::TextList(items) | FieldValue::UrlList(items) => Some(items.join("\n")),
        FieldValue::SingleSelect(_)
        | FieldValue::MultiSelect(_)
        | FieldValue::Checkboxes(_)
        | FieldValue::Table(_) => None,
    }
}

fn value_fence(content: &str) -> String {
    let fence = fence::select_fence(content);
    format!("{fence}value\n{content}\n{fence}")
}

fn options_block(field: &Field, options: &[FieldOption], response: &FieldResponse) -> String {
    let lines: Vec<String> = options
        .iter()
        .map(|option| {
            let marker = option_marker(field, option, response);
            let meta = match &option.metadata {
                Some(meta) => format!(" meta=\"{}\"", escape_attr(meta)),
                None => String::new(),
            };
            format!(
                "- [{marker}] {} <!-- #{}{meta} -->",
                escape_text(&option.label),
                option.id
            )
        })
        .collect();
    lines.join("\n")
}

fn option_marker(field: &Field, option: &FieldOption, response: &FieldResponse) -> char {
    match &field.kind {
        FieldKind::SingleSelect { .. } => match &response.value {
            Some(FieldValue::SingleSelect(selected)) if *selected == option.id => 'x',
            _ => ' ',
        },
        FieldKind::MultiSelect { .. } => match &response.value {
            Some(FieldValue::MultiSelect(selected)) if selected.contains(&option.id) => 'x',
            _ => ' ',
        },
        FieldKind::Checkboxes { mode, .. } => {
            let state = match &response.value {
                Some(FieldValue::Checkboxes(states)) => states
                    .get(&option.id)
                    .copied()
                    .unwrap_or_else(|| CheckState::default_for(*mode)),
                _ => CheckState::default_for(*mode),
            };
            state.marker()
        }
        _ => ' ',
    }
}

fn table_block(spec: &crate::model::TableSpec, response: &FieldResponse) -> String {
    let mut lines = Vec::new();
    let header: Vec<String> = spec
        .columns
        .iter()
        .map(|c| escape_cell(&c.label))
        .collect();
    lines.push(format!("| {} |", header.join(" | ")));
    lines.push(format!(
        "| {} |",
        spec.columns.iter().map(|_| "---").collect::<Vec<_>>().join(" | ")
    ));
    if let Some(FieldValue::Table(rows)) = &response.value {
        for row in rows {
            let cells: Vec<String> = row
                .cells
                .iter()
                .map(|cell| match cell {
                    CellValue::Number(n) => format_number(*n),
                    CellValue::Text(s) => escape_cell(s),
                })
                .collect();
            lines.push(format!("| {} |", cells.join(" | ")));
        }
    }
    lines.join("\n")
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// The metadata block, with the engine-owned summary injected fresh.
fn metadata_block(form: &ParsedForm, issues: &[validate::Issue]) -> String {
    let progress = summary::progress_summary(form, issues);
    let complete = summary::is_complete(form, issues, None);

    let mut mapping = serde_yaml::Mapping::new();
    mapping.insert(
        serde_yaml::Value::String(VERSION_KEY.to_string()),
        serde_yaml::Value::Number((form.metadata.version as u64).into()),
    );
    for (key, value) in &form.metadata.extra {
        mapping.insert(key.clone(), value.clone());
    }

    let mut summary_map = serde_yaml::Mapping::new();
    let mut put = |key: &str, value: serde_yaml::Value| {
        summary_map.insert(serde_yaml::Value::String(key.to_string()), value);
    };
    put("fields", (progress.total as u64).into());
    put("answered", (progress.answered as u64).into());
    put("skipped", (progress.skipped as u64).into());
    put("aborted", (progress.aborted as u64).into());
    put("invalid", (progress.invalid as u64).into());
    put("issues", (issues.len() as u64).into());
    put("complete", complete.into());
    mapping.insert(
        serde_yaml::Value::String(SUMMARY_KEY.to_string()),
        serde_yaml::Value::Mapping(summary_map),
    );

    let yaml = serde_yaml::to_string(&mapping).expect("metadata mapping serializes");
    format!("---\n{yaml}---")
}
