//! Schema & Response Builder.
//!
//! Consumes the extractor's flat entry list and produces the typed schema,
//! the per-field response map, and the two lookup indexes. All defaults are
//! materialized here (`required=false`, `priority=medium`, `mode=multi`,
//! `min_done=-1`) so nothing downstream needs optional-default handling.

use std::collections::BTreeMap;

use crate::error::{LineIndex, ParseError, ParseErrorKind};
use crate::model::response::parse_sentinel;
use crate::model::{
    AnswerState, CellValue, CheckState, CheckboxMode, Column, ColumnType, DateConstraints,
    DocumentationBlock, Field, FieldGroup, FieldKind, FieldOption, FieldResponse, FieldValue,
    FormMetadata, FormSchema, ListConstraints, Note, NumberConstraints, ParsedForm, Priority,
    TableRow, TableSpec, TextConstraints, YearConstraints, IMPLICIT_CHECKBOXES_ID,
    IMPLICIT_GROUP_ID,
};

use super::extract::{RawEntry, RawOption};
use super::lexer::{RawTag, TagName};
use super::semantic;

/// Intermediate build output handed to the parse-time semantic validator.
pub struct BuiltForm {
    pub form: ParsedForm,
    pub doc_offsets: Vec<usize>,
    pub note_offsets: Vec<usize>,
}

pub fn build_form(
    entries: Vec<RawEntry>,
    metadata: FormMetadata,
    lines: &LineIndex,
) -> Result<BuiltForm, ParseError> {
    let mut builder = Builder::new(metadata, lines);
    for entry in entries {
        builder.push(entry)?;
    }
    builder.finish()
}

struct Builder<'a> {
    lines: &'a LineIndex,
    metadata: FormMetadata,
    form: Option<(String, Option<String>)>,
    groups: Vec<FieldGroup>,
    current_group: Option<FieldGroup>,
    current_field: Option<FieldBuild>,
    responses: BTreeMap<String, FieldResponse>,
    docs: Vec<(DocumentationBlock, usize)>,
    notes: Vec<(Note, usize)>,
    bare_options: Vec<RawOption>,
    /// Value fence outside any field; only meaningful as the skip/abort
    /// sentinel of an implicit checkboxes form.
    bare_value: Option<String>,
    saw_field_tag: bool,
    index: semantic::IndexBuilder,
}

struct FieldBuild {
    offset: usize,
    id: String,
    label: Option<String>,
    required: bool,
    priority: Priority,
    role: Option<String>,
    placeholder: Option<String>,
    examples: Vec<String>,
    kind: KindBuild,
    value: Option<(String, usize)>,
    options: Vec<FieldOption>,
    markers: Vec<char>,
    table_head: Option<Vec<String>>,
    table_rows: Vec<(Vec<String>, usize)>,
}

enum KindBuild {
    Text(TextConstraints),
    Number(NumberConstraints),
    Date(DateConstraints),
    Year(YearConstraints),
    Url(TextConstraints),
    TextList(ListConstraints),
    UrlList(ListConstraints),
    SingleSelect,
    MultiSelect {
        min_selected: Option<usize>,
        max_selected: Option<usize>,
    },
    Checkboxes {
        mode: CheckboxMode,
        min_done: i32,
    },
    Table(TableSpec),
}

impl KindBuild {
    fn name(&self) -> &'static str {
        match self {
            KindBuild::Text(_) => "string",
            KindBuild::Number(_) => "number",
            KindBuild::Date(_) => "date",
            KindBuild::Year(_) => "year",
            KindBuild::Url(_) => "url",
            KindBuild::TextList(_) => "string_list",
            KindBuild::UrlList(_) => "url_list",
            KindBuild::SingleSelect => "single_select",
            KindBuild::MultiSelect { .. } => "multi_select",
            KindBuild::Checkboxes { .. } => "checkboxes",
            KindBuild::Table(_) => "table",
        }
    }

    fn is_chooser(&self) -> bool {
        matches!(
            self,
            KindBuild::SingleSelect | KindBuild::MultiSelect { .. } | KindBuild::Checkboxes { .. }
        )
    }
}

impl<'a> Builder<'a> {
    fn new(metadata: FormMetadata, lines: &'a LineIndex) -> Self {
        Self {
            lines,
            metadata,
            form: None,
            groups: Vec::new(),
            current_group: None,
            current_field: None,
            responses: BTreeMap::new(),
            docs: Vec::new(),
            notes: Vec::new(),
            bare_options: Vec::new(),
            bare_value: None,
            saw_field_tag: false,
            index: semantic::IndexBuilder::new(),
        }
    }

    fn err(&self, offset: usize, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.lines.pos(offset), kind)
    }

    fn malformed(&self, offset: usize, tag: &str, message: impl Into<String>) -> ParseError {
        self.err(
            offset,
            ParseErrorKind::MalformedTag {
                tag: tag.to_string(),
                message: message.into(),
            },
        )
    }

    fn push(&mut self, entry: RawEntry) -> Result<(), ParseError> {
        match entry {
            RawEntry::Open(tag) => match tag.name {
                TagName::Form => self.open_form(tag),
                TagName::Group => self.open_group(tag),
                TagName::Field => self.open_field(tag),
                TagName::Doc | TagName::Note => unreachable!("handled by the extractor"),
            },
            RawEntry::Close { name, offset } => self.close(name, offset),
            RawEntry::Option(option) => self.push_option(option),
            RawEntry::Value { text, offset } => self.push_value(text, offset),
            RawEntry::TableHead { cells, offset } => self.push_table_head(cells, offset),
            RawEntry::TableRow { cells, offset } => self.push_table_row(cells, offset),
            RawEntry::Doc { doc, offset } => {
                self.docs.push((doc, offset));
                Ok(())
            }
            RawEntry::Note { note, offset } => {
                self.notes.push((note, offset));
                Ok(())
            }
        }
    }

    fn open_form(&mut self, tag: RawTag) -> Result<(), ParseError> {
        let mut id = None;
        let mut title = None;
        for (key, value) in &tag.attrs {
            match key.as_str() {
                "id" => id = Some(value.clone()),
                "title" => title = Some(value.clone()),
                other => {
                    return Err(self.err(
                        tag.offset,
                        ParseErrorKind::UnknownAttribute {
                            tag: "form".to_string(),
                            attr: other.to_string(),
                        },
                    ));
                }
            }
        }
        let Some(id) = id else {
            return Err(self.malformed(tag.offset, "form", "missing `id`"));
        };
        self.check_reserved(&id, tag.offset)?;
        self.index
            .insert(&id, crate::model::NodeKind::Form, None, tag.offset, self.lines)?;
        self.form = Some((id, title));
        Ok(())
    }

    fn open_group(&mut self, tag: RawTag) -> Result<(), ParseError> {
        if self.current_field.is_some() {
            return Err(self.malformed(tag.offset, "group", "cannot open a group inside a field"));
        }
        if self.current_group.is_some() {
            return Err(self.malformed(tag.offset, "group", "group tags cannot nest"));
        }
        let mut id = None;
        let mut title = None;
        let mut validator_refs = Vec::new();
        for (key, value) in &tag.attrs {
            match key.as_str() {
                "id" => id = Some(value.clone()),
                "title" => title = Some(value.clone()),
                "validate" => {
                    validator_refs = value
                        .split(',')
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty())
                        .collect();
                }
                other => {
                    return Err(self.err(
                        tag.offset,
                        ParseErrorKind::UnknownAttribute {
                            tag: "group".to_string(),
                            attr: other.to_string(),
                        },
                    ));
                }
            }
        }
        let Some(id) = id else {
            return Err(self.malformed(tag.offset, "group", "missing `id`"));
        };
        self.check_reserved(&id, tag.offset)?;
        let parent = self.form.as_ref().map(|(id, _)| id.clone());
        self.index.insert(
            &id,
            crate::model::NodeKind::Group,
            parent,
            tag.offset,
            self.lines,
        )?;
        self.current_group = Some(FieldGroup {
            id,
            title,
            validator_refs,
            fields: Vec::new(),
        });
        Ok(())
    }

    fn open_field(&mut self, tag: RawTag) -> Result<(), ParseError> {
        if let Some(outer) = &self.current_field {
            let inner = tag.attr("id").unwrap_or("?").to_string();
            return Err(self.err(
                tag.offset,
                ParseErrorKind::NestedField {
                    outer: outer.id.clone(),
                    inner,
                },
            ));
        }
        if self.current_group.is_none() {
            return Err(self.malformed(tag.offset, "field", "fields must be inside a group"));
        }
        let build = self.parse_field_attrs(&tag)?;
        self.saw_field_tag = true;
        self.current_field = Some(build);
        Ok(())
    }

    /// Two passes over the attribute list: `kind` first (it decides which
    /// other attributes are legal), then everything else.
    fn parse_field_attrs(&mut self, tag: &RawTag) -> Result<FieldBuild, ParseError> {
        let offset = tag.offset;
        let Some(kind_name) = tag.attr("kind") else {
            return Err(self.malformed(offset, "field", "missing `kind`"));
        };
        let mut kind = match kind_name {
            "string" => KindBuild::Text(TextConstraints::default()),
            "number" => KindBuild::Number(NumberConstraints::default()),
            "date" => KindBuild::Date(DateConstraints::default()),
            "year" => KindBuild::Year(YearConstraints::default()),
            "url" => KindBuild::Url(TextConstraints::default()),
            "string_list" => KindBuild::TextList(ListConstraints::default()),
            "url_list" => KindBuild::UrlList(ListConstraints::default()),
            "single_select" => KindBuild::SingleSelect,
            "multi_select" => KindBuild::MultiSelect {
                min_selected: None,
                max_selected: None,
            },
            "checkboxes" => KindBuild::Checkboxes {
                mode: CheckboxMode::Multi,
                min_done: -1,
            },
            "table" => KindBuild::Table(TableSpec {
                columns: Vec::new(),
                min_rows: None,
                max_rows: None,
            }),
            other => {
                return Err(self.malformed(offset, "field", format!("unknown kind `{other}`")));
            }
        };

        let mut id = None;
        let mut label = None;
        let mut required = false;
        let mut priority = Priority::Medium;
        let mut role = None;
        let mut placeholder = None;
        let mut examples = Vec::new();
        let mut column_labels: Option<Vec<String>> = None;

        for (key, value) in &tag.attrs {
            match key.as_str() {
                "kind" => {}
                "id" => id = Some(value.clone()),
                "label" => label = Some(value.clone()),
                "required" => required = self.attr_bool(value, offset)?,
                "priority" => {
                    priority = Priority::from_str(value).ok_or_else(|| {
                        self.malformed(offset, "field", format!("unknown priority `{value}`"))
                    })?;
                }
                "role" => role = Some(value.clone()),
                "placeholder" => placeholder = Some(value.clone()),
                "examples" => {
                    examples = value
                        .split(',')
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty())
                        .collect();
                }
                _ => {
                    self.parse_kind_attr(&mut kind, key, value, offset, &mut column_labels)?;
                }
            }
        }

        let Some(id) = id else {
            return Err(self.malformed(offset, "field", "missing `id`"));
        };
        self.check_reserved(&id, offset)?;
        let Some(label) = label else {
            return Err(self.err(offset, ParseErrorKind::MissingLabel { field: id }));
        };

        if kind.is_chooser() {
            if placeholder.is_some() {
                return Err(self.err(
                    offset,
                    ParseErrorKind::AttributeNotAllowed {
                        field: id,
                        kind: kind.name().to_string(),
                        attr: "placeholder".to_string(),
                    },
                ));
            }
            if !examples.is_empty() {
                return Err(self.err(
                    offset,
                    ParseErrorKind::AttributeNotAllowed {
                        field: id,
                        kind: kind.name().to_string(),
                        attr: "examples".to_string(),
                    },
                ));
            }
        }
        if let KindBuild::Checkboxes { mode, .. } = &kind
            && *mode == CheckboxMode::Explicit
            && !required
        {
            return Err(self.err(offset, ParseErrorKind::ExplicitModeOptional { field: id }));
        }
        if let KindBuild::Table(spec) = &mut kind {
            if spec.columns.is_empty() {
                return Err(self.malformed(offset, "field", "table fields need `columns`"));
            }
            if let Some(labels) = column_labels {
                if labels.len() != spec.columns.len() {
                    return Err(self.malformed(
                        offset,
                        "field",
                        "`column-labels` count does not match `columns`",
                    ));
                }
                for (column, label) in spec.columns.iter_mut().zip(labels) {
                    column.label = label;
                }
            }
        }

        let parent = self.current_group.as_ref().map(|g| g.id.clone());
        self.index
            .insert(&id, crate::model::NodeKind::Field, parent, offset, self.lines)?;

        Ok(FieldBuild {
            offset,
            id,
            label: Some(label),
            required,
            priority,
            role,
            placeholder,
            examples,
            kind,
            value: None,
            options: Vec::new(),
            markers: Vec::new(),
            table_head: None,
            table_rows: Vec::new(),
        })
    }

    fn parse_kind_attr(
        &self,
        kind: &mut KindBuild,
        key: &str,
        value: &str,
        offset: usize,
        column_labels: &mut Option<Vec<String>>,
    ) -> Result<(), ParseError> {
        let unknown = || {
            Err::<(), ParseError>(self.err(
                offset,
                ParseErrorKind::UnknownAttribute {
                    tag: "field".to_string(),
                    attr: key.to_string(),
                },
            ))
        };
        match kind {
            KindBuild::Text(c) | KindBuild::Url(c) => match key {
                "min-length" => c.min_length = Some(self.attr_usize(value, offset)?),
                "max-length" => c.max_length = Some(self.attr_usize(value, offset)?),
                "pattern" => c.pattern = Some(value.to_string()),
                _ => return unknown(),
            },
            KindBuild::Number(c) => match key {
                "min" => c.min = Some(self.attr_f64(value, offset)?),
                "max" => c.max = Some(self.attr_f64(value, offset)?),
                "integer" => c.integer = self.attr_bool(value, offset)?,
                _ => return unknown(),
            },
            KindBuild::Date(c) => match key {
                "min" => c.min = Some(value.to_string()),
                "max" => c.max = Some(value.to_string()),
                _ => return unknown(),
            },
            KindBuild::Year(c) => match key {
                "min" => c.min = Some(self.attr_i32(value, offset)?),
                "max" => c.max = Some(self.attr_i32(value, offset)?),
                _ => return unknown(),
            },
            KindBuild::TextList(c) | KindBuild::UrlList(c) => match key {
                "min-items" => c.min_items = Some(self.attr_usize(value, offset)?),
                "max-items" => c.max_items = Some(self.attr_usize(value, offset)?),
                "item-max-length" => c.item_max_length = Some(self.attr_usize(value, offset)?),
                "unique" => c.unique = self.attr_bool(value, offset)?,
                _ => return unknown(),
            },
            KindBuild::SingleSelect => return unknown(),
            KindBuild::MultiSelect {
                min_selected,
                max_selected,
            } => match key {
                "min-selected" => *min_selected = Some(self.attr_usize(value, offset)?),
                "max-selected" => *max_selected = Some(self.attr_usize(value, offset)?),
                _ => return unknown(),
            },
            KindBuild::Checkboxes { mode, min_done } => match key {
                "mode" => {
                    *mode = CheckboxMode::from_str(value).ok_or_else(|| {
                        self.malformed(
                            offset,
                            "field",
                            format!("unknown checkbox mode `{value}`"),
                        )
                    })?;
                }
                "min-done" => *min_done = self.attr_i32(value, offset)?,
                _ => return unknown(),
            },
            KindBuild::Table(spec) => match key {
                "columns" => {
                    spec.columns = self.parse_columns(value, offset)?;
                }
                "column-labels" => {
                    *column_labels =
                        Some(value.split(',').map(|v| v.trim().to_string()).collect());
                }
                "min-rows" => spec.min_rows = Some(self.attr_usize(value, offset)?),
                "max-rows" => spec.max_rows = Some(self.attr_usize(value, offset)?),
                _ => return unknown(),
            },
        }
        Ok(())
    }

    fn parse_columns(&self, value: &str, offset: usize) -> Result<Vec<Column>, ParseError> {
        let mut columns = Vec::new();
        for part in value.split(',') {
            let part = part.trim();
            let Some((id, ty)) = part.split_once(':') else {
                return Err(self.malformed(
                    offset,
                    "field",
                    format!("bad column spec `{part}` (expected `id:type`)"),
                ));
            };
            let Some(column_type) = ColumnType::from_str(ty.trim()) else {
                return Err(self.malformed(offset, "field", format!("unknown column type `{ty}`")));
            };
            columns.push(Column {
                id: id.trim().to_string(),
                label: id.trim().to_string(),
                column_type,
            });
        }
        Ok(columns)
    }

    fn attr_bool(&self, value: &str, offset: usize) -> Result<bool, ParseError> {
        match value {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(self.malformed(
                offset,
                "field",
                format!("expected \"true\" or \"false\", got `{other}`"),
            )),
        }
    }

    fn attr_usize(&self, value: &str, offset: usize) -> Result<usize, ParseError> {
        value
            .parse()
            .map_err(|_| self.malformed(offset, "field", format!("bad number `{value}`")))
    }

    fn attr_i32(&self, value: &str, offset: usize) -> Result<i32, ParseError> {
        value
            .parse()
            .map_err(|_| self.malformed(offset, "field", format!("bad number `{value}`")))
    }

    fn attr_f64(&self, value: &str, offset: usize) -> Result<f64, ParseError> {
        value
            .parse()
            .map_err(|_| self.malformed(offset, "field", format!("bad number `{value}`")))
    }

    fn push_option(&mut self, option: RawOption) -> Result<(), ParseError> {
        let Some(field) = &mut self.current_field else {
            // ID-annotated bare items feed the implicit-checkboxes lift;
            // unannotated ones are ordinary prose.
            if option.id.is_some() {
                self.bare_options.push(option);
            }
            return Ok(());
        };
        if option.depth > 1 {
            return Err(ParseError::new(
                self.lines.pos(option.offset),
                ParseErrorKind::InvalidValue {
                    field: field.id.clone(),
                    message: "nested option lists are not supported".to_string(),
                },
            ));
        }
        if !field.kind.is_chooser() {
            return Err(ParseError::new(
                self.lines.pos(option.offset),
                ParseErrorKind::InvalidValue {
                    field: field.id.clone(),
                    message: format!(
                        "checkbox items are not allowed in a `{}` field",
                        field.kind.name()
                    ),
                },
            ));
        }
        let Some(id) = option.id else {
            return Err(ParseError::new(
                self.lines.pos(option.offset),
                ParseErrorKind::OptionMissingId {
                    field: field.id.clone(),
                },
            ));
        };
        if id == IMPLICIT_CHECKBOXES_ID {
            return Err(self.err(option.offset, ParseErrorKind::ReservedId { id }));
        }
        if field.options.iter().any(|o| o.id == id) {
            return Err(ParseError::new(
                self.lines.pos(option.offset),
                ParseErrorKind::DuplicateOptionId {
                    field: field.id.clone(),
                    option: id,
                },
            ));
        }
        let legal = match &field.kind {
            KindBuild::SingleSelect | KindBuild::MultiSelect { .. } => {
                matches!(option.marker, ' ' | 'x')
            }
            KindBuild::Checkboxes { mode, .. } => {
                CheckState::from_marker(option.marker, *mode).is_some()
            }
            _ => unreachable!("checked above"),
        };
        if !legal {
            return Err(ParseError::new(
                self.lines.pos(option.offset),
                ParseErrorKind::IllegalMarker {
                    field: field.id.clone(),
                    marker: option.marker,
                },
            ));
        }
        field.options.push(FieldOption {
            id,
            label: option.label,
            metadata: option.metadata,
        });
        field.markers.push(option.marker);
        Ok(())
    }

    fn push_value(&mut self, text: String, offset: usize) -> Result<(), ParseError> {
        let Some(field) = &mut self.current_field else {
            // Outside any field a `value` fence is ordinary Markdown, except
            // as the sentinel of an implicit checkboxes form.
            self.bare_value = Some(text);
            return Ok(());
        };
        if field.value.is_some() {
            return Err(ParseError::new(
                self.lines.pos(offset),
                ParseErrorKind::MultipleValues {
                    field: field.id.clone(),
                },
            ));
        }
        field.value = Some((text, offset));
        Ok(())
    }

    fn push_table_head(&mut self, cells: Vec<String>, offset: usize) -> Result<(), ParseError> {
        let Some(field) = &mut self.current_field else {
            return Ok(());
        };
        if !matches!(field.kind, KindBuild::Table(_)) {
            return Ok(());
        }
        if field.table_head.is_some() {
            return Err(ParseError::new(
                self.lines.pos(offset),
                ParseErrorKind::InvalidValue {
                    field: field.id.clone(),
                    message: "more than one table in a table field".to_string(),
                },
            ));
        }
        field.table_head = Some(cells);
        Ok(())
    }

    fn push_table_row(&mut self, cells: Vec<String>, offset: usize) -> Result<(), ParseError> {
        let Some(field) = &mut self.current_field else {
            return Ok(());
        };
        if !matches!(field.kind, KindBuild::Table(_)) {
            return Ok(());
        }
        field.table_rows.push((cells, offset));
        Ok(())
    }

    fn close(&mut self, name: TagName, offset: usize) -> Result<(), ParseError> {
        match name {
            TagName::Field => {
                let Some(build) = self.current_field.take() else {
                    return Err(self.malformed(offset, "field", "close tag without an open field"));
                };
                let (field, response) = self.finish_field(build)?;
                self.responses.insert(field.id.clone(), response);
                self.current_group
                    .as_mut()
                    .expect("field close implies an open group")
                    .fields
                    .push(field);
                Ok(())
            }
            TagName::Group => {
                if let Some(field) = &self.current_field {
                    return Err(self.err(
                        offset,
                        ParseErrorKind::UnclosedTag {
                            tag: format!("field ({})", field.id),
                        },
                    ));
                }
                let Some(group) = self.current_group.take() else {
                    return Err(self.malformed(offset, "group", "close tag without an open group"));
                };
                self.groups.push(group);
                Ok(())
            }
            TagName::Form => {
                if let Some(field) = &self.current_field {
                    return Err(self.err(
                        offset,
                        ParseErrorKind::UnclosedTag {
                            tag: format!("field ({})", field.id),
                        },
                    ));
                }
                if let Some(group) = &self.current_group {
                    return Err(self.err(
                        offset,
                        ParseErrorKind::UnclosedTag {
                            tag: format!("group ({})", group.id),
                        },
                    ));
                }
                Ok(())
            }
            TagName::Doc | TagName::Note => unreachable!("handled by the extractor"),
        }
    }

    /// Assemble the typed field and derive its response from markers and the
    /// value fence.
    fn finish_field(
        &mut self,
        build: FieldBuild,
    ) -> Result<(Field, FieldResponse), ParseError> {
        let FieldBuild {
            offset,
            id,
            label,
            required,
            priority,
            role,
            placeholder,
            examples,
            mut kind,
            value,
            options,
            markers,
            table_head,
            table_rows,
        } = build;

        // Backfill table column labels from the literal header row.
        if let KindBuild::Table(spec) = &mut kind
            && let Some(head) = &table_head
        {
            if head.len() != spec.columns.len() {
                return Err(self.err(
                    offset,
                    ParseErrorKind::InvalidValue {
                        field: id,
                        message: format!(
                            "table header has {} cells but {} columns are declared",
                            head.len(),
                            spec.columns.len()
                        ),
                    },
                ));
            }
            for (column, label) in spec.columns.iter_mut().zip(head) {
                if !label.is_empty() {
                    column.label = label.clone();
                }
            }
        }

        let sentinel = match &value {
            Some((text, value_offset)) => match parse_sentinel(text) {
                Some((state, reason)) => {
                    if state == AnswerState::Skipped && required {
                        return Err(self.err(
                            *value_offset,
                            ParseErrorKind::InvalidValue {
                                field: id,
                                message: "a required field cannot be skipped".to_string(),
                            },
                        ));
                    }
                    Some((state, reason))
                }
                None => None,
            },
            None => None,
        };

        let response = if let Some((state, reason)) = sentinel {
            if matches!(state, AnswerState::Skipped) {
                FieldResponse::skipped(reason)
            } else {
                FieldResponse::aborted(reason)
            }
        } else {
            self.response_from_body(&id, &kind, &value, &options, &markers, &table_rows, offset)?
        };

        let field = Field {
            id,
            label: label.expect("label presence checked at open"),
            required,
            priority,
            role,
            placeholder,
            examples,
            kind: match kind {
                KindBuild::Text(c) => FieldKind::Text(c),
                KindBuild::Number(c) => FieldKind::Number(c),
                KindBuild::Date(c) => FieldKind::Date(c),
                KindBuild::Year(c) => FieldKind::Year(c),
                KindBuild::Url(c) => FieldKind::Url(c),
                KindBuild::TextList(c) => FieldKind::TextList(c),
                KindBuild::UrlList(c) => FieldKind::UrlList(c),
                KindBuild::SingleSelect => FieldKind::SingleSelect { options },
                KindBuild::MultiSelect {
                    min_selected,
                    max_selected,
                } => FieldKind::MultiSelect {
                    options,
                    min_selected,
                    max_selected,
                },
                KindBuild::Checkboxes { mode, min_done } => FieldKind::Checkboxes {
                    options,
                    mode,
                    min_done,
                },
                KindBuild::Table(spec) => FieldKind::Table(spec),
            },
        };
        Ok((field, response))
    }

    #[allow(clippy::too_many_arguments)]
    fn response_from_body(
        &self,
        id: &str,
        kind: &KindBuild,
        value: &Option<(String, usize)>,
        options: &[FieldOption],
        markers: &[char],
        table_rows: &[(Vec<String>, usize)],
        offset: usize,
    ) -> Result<FieldResponse, ParseError> {
        let invalid = |off: usize, message: String| {
            self.err(
                off,
                ParseErrorKind::InvalidValue {
                    field: id.to_string(),
                    message,
                },
            )
        };

        if kind.is_chooser() || matches!(kind, KindBuild::Table(_)) {
            if let Some((_, value_offset)) = value {
                return Err(invalid(
                    *value_offset,
                    format!("value blocks are not allowed in a `{}` field", kind.name()),
                ));
            }
        }

        let response = match kind {
            KindBuild::Text(_) => match value {
                Some((text, _)) if !text.is_empty() => {
                    FieldResponse::answered(FieldValue::Text(text.clone()))
                }
                _ => FieldResponse::unanswered(),
            },
            KindBuild::Url(_) => match value {
                Some((text, _)) if !text.trim().is_empty() => {
                    FieldResponse::answered(FieldValue::Url(text.trim().to_string()))
                }
                _ => FieldResponse::unanswered(),
            },
            KindBuild::Date(_) => match value {
                Some((text, _)) if !text.trim().is_empty() => {
                    FieldResponse::answered(FieldValue::Date(text.trim().to_string()))
                }
                _ => FieldResponse::unanswered(),
            },
            KindBuild::Number(_) => match value {
                Some((text, value_offset)) if !text.trim().is_empty() => {
                    let number = text.trim().parse::<f64>().map_err(|_| {
                        invalid(*value_offset, format!("`{}` is not a number", text.trim()))
                    })?;
                    FieldResponse::answered(FieldValue::Number(number))
                }
                _ => FieldResponse::unanswered(),
            },
            KindBuild::Year(_) => match value {
                Some((text, value_offset)) if !text.trim().is_empty() => {
                    let year = text.trim().parse::<i32>().map_err(|_| {
                        invalid(*value_offset, format!("`{}` is not a year", text.trim()))
                    })?;
                    FieldResponse::answered(FieldValue::Year(year))
                }
                _ => FieldResponse::unanswered(),
            },
            KindBuild::TextList(_) | KindBuild::UrlList(_) => match value {
                Some((text, _)) if !text.is_empty() => {
                    let items: Vec<String> =
                        text.lines().map(|l| l.trim().to_string()).collect();
                    let list = if matches!(kind, KindBuild::TextList(_)) {
                        FieldValue::TextList(items)
                    } else {
                        FieldValue::UrlList(items)
                    };
                    FieldResponse::answered(list)
                }
                _ => FieldResponse::unanswered(),
            },
            KindBuild::SingleSelect => {
                let selected: Vec<&FieldOption> = options
                    .iter()
                    .zip(markers)
                    .filter(|(_, m)| **m == 'x')
                    .map(|(o, _)| o)
                    .collect();
                match selected.as_slice() {
                    [] => FieldResponse::unanswered(),
                    [only] => {
                        FieldResponse::answered(FieldValue::SingleSelect(only.id.clone()))
                    }
                    _ => {
                        return Err(self.err(
                            offset,
                            ParseErrorKind::MultipleSelections {
                                field: id.to_string(),
                            },
                        ));
                    }
                }
            }
            KindBuild::MultiSelect { .. } => {
                let selected: Vec<String> = options
                    .iter()
                    .zip(markers)
                    .filter(|(_, m)| **m == 'x')
                    .map(|(o, _)| o.id.clone())
                    .collect();
                if selected.is_empty() {
                    FieldResponse::unanswered()
                } else {
                    FieldResponse::answered(FieldValue::MultiSelect(selected))
                }
            }
            KindBuild::Checkboxes { mode, .. } => {
                let default = CheckState::default_for(*mode);
                let states: BTreeMap<String, CheckState> = options
                    .iter()
                    .zip(markers)
                    .map(|(o, m)| {
                        let state = CheckState::from_marker(*m, *mode)
                            .expect("marker legality checked on push");
                        (o.id.clone(), state)
                    })
                    .collect();
                if states.values().all(|s| *s == default) {
                    FieldResponse::unanswered()
                } else {
                    FieldResponse::answered(FieldValue::Checkboxes(states))
                }
            }
            KindBuild::Table(spec) => {
                let mut rows = Vec::new();
                for (cells, row_offset) in table_rows {
                    if cells.len() != spec.columns.len() {
                        return Err(invalid(
                            *row_offset,
                            format!(
                                "row has {} cells but {} columns are declared",
                                cells.len(),
                                spec.columns.len()
                            ),
                        ));
                    }
                    let mut row = Vec::new();
                    for (cell, column) in cells.iter().zip(&spec.columns) {
                        let parsed = CellValue::from_cell_text(cell, column.column_type)
                            .ok_or_else(|| {
                                invalid(
                                    *row_offset,
                                    format!(
                                        "`{cell}` is not a {} (column `{}`)",
                                        column.column_type.as_str(),
                                        column.id
                                    ),
                                )
                            })?;
                        row.push(parsed);
                    }
                    rows.push(TableRow { cells: row });
                }
                if rows.is_empty() {
                    FieldResponse::unanswered()
                } else {
                    FieldResponse::answered(FieldValue::Table(rows))
                }
            }
        };
        Ok(response)
    }

    fn check_reserved(&self, id: &str, offset: usize) -> Result<(), ParseError> {
        if id == IMPLICIT_CHECKBOXES_ID || id == IMPLICIT_GROUP_ID {
            return Err(self.err(
                offset,
                ParseErrorKind::ReservedId { id: id.to_string() },
            ));
        }
        Ok(())
    }

    fn finish(mut self) -> Result<BuiltForm, ParseError> {
        let Some((form_id, title)) = self.form.clone() else {
            return Err(self.err(0, ParseErrorKind::MissingFormTag));
        };

        if !self.bare_options.is_empty() {
            if self.saw_field_tag {
                let offset = self.bare_options[0].offset;
                return Err(self.err(offset, ParseErrorKind::MixedCheckboxes));
            }
            self.lift_bare_checkboxes(&form_id)?;
        }

        let schema = FormSchema {
            id: form_id,
            title,
            groups: self.groups,
        };
        let (order_index, id_index) = self.index.finish();
        let docs: Vec<DocumentationBlock> =
            self.docs.iter().map(|(d, _)| d.clone()).collect();
        let notes: Vec<Note> = self.notes.iter().map(|(n, _)| n.clone()).collect();
        let doc_offsets = self.docs.iter().map(|(_, o)| *o).collect();
        let note_offsets = self.notes.iter().map(|(_, o)| *o).collect();

        let form = ParsedForm {
            schema,
            responses: self.responses,
            notes,
            docs,
            order_index,
            id_index,
            metadata: self.metadata,
        };
        Ok(BuiltForm {
            form,
            doc_offsets,
            note_offsets,
        })
    }

    /// Auto-lift bare, ID-annotated checkbox items into the one implicit
    /// `_checkboxes` field.
    fn lift_bare_checkboxes(&mut self, form_id: &str) -> Result<(), ParseError> {
        let bare = std::mem::take(&mut self.bare_options);
        let first_offset = bare[0].offset;
        let mut options = Vec::new();
        let mut states = BTreeMap::new();
        let mut answered = false;
        for option in bare {
            let id = option.id.expect("bare options are ID-annotated");
            if options.iter().any(|o: &FieldOption| o.id == id) {
                return Err(self.err(
                    option.offset,
                    ParseErrorKind::DuplicateOptionId {
                        field: IMPLICIT_CHECKBOXES_ID.to_string(),
                        option: id,
                    },
                ));
            }
            let Some(state) = CheckState::from_marker(option.marker, CheckboxMode::Multi) else {
                return Err(self.err(
                    option.offset,
                    ParseErrorKind::IllegalMarker {
                        field: IMPLICIT_CHECKBOXES_ID.to_string(),
                        marker: option.marker,
                    },
                ));
            };
            if state != CheckState::Todo {
                answered = true;
            }
            states.insert(id.clone(), state);
            options.push(FieldOption {
                id,
                label: option.label,
                metadata: option.metadata,
            });
        }

        self.index.insert(
            IMPLICIT_GROUP_ID,
            crate::model::NodeKind::Group,
            Some(form_id.to_string()),
            first_offset,
            self.lines,
        )?;
        self.index.insert(
            IMPLICIT_CHECKBOXES_ID,
            crate::model::NodeKind::Field,
            Some(IMPLICIT_GROUP_ID.to_string()),
            first_offset,
            self.lines,
        )?;

        let field = Field {
            id: IMPLICIT_CHECKBOXES_ID.to_string(),
            label: "Checklist".to_string(),
            required: false,
            priority: Priority::Medium,
            role: None,
            placeholder: None,
            examples: vec![],
            kind: FieldKind::Checkboxes {
                options,
                mode: CheckboxMode::Multi,
                min_done: -1,
            },
        };
        let sentinel = self
            .bare_value
            .as_deref()
            .and_then(crate::model::response::parse_sentinel);
        let response = match sentinel {
            Some((crate::model::AnswerState::Skipped, reason)) => FieldResponse::skipped(reason),
            Some((_, reason)) => FieldResponse::aborted(reason),
            None if answered => FieldResponse::answered(FieldValue::Checkboxes(states)),
            None => FieldResponse::unanswered(),
        };
        self.responses
            .insert(IMPLICIT_CHECKBOXES_ID.to_string(), response);
        self.groups.push(FieldGroup {
            id: IMPLICIT_GROUP_ID.to_string(),
            title: None,
            validator_refs: vec![],
            fields: vec![field],
        });
        Ok(())
    }
}
