use serde::{Deserialize, Serialize};

/// Root of a parsed form's schema: one form, a flat list of groups.
///
/// Nesting stops at form → group → field; groups never contain groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub groups: Vec<FieldGroup>,
}

impl FormSchema {
    /// Iterate all fields in document order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.groups.iter().flat_map(|g| g.fields.iter())
    }

    /// Look up a field by ID anywhere in the form.
    pub fn field(&self, field_id: &str) -> Option<&Field> {
        self.fields().find(|f| f.id == field_id)
    }

    /// Look up a field and its containing group.
    pub fn field_with_group(&self, field_id: &str) -> Option<(&FieldGroup, &Field)> {
        self.groups.iter().find_map(|g| {
            g.fields
                .iter()
                .find(|f| f.id == field_id)
                .map(|f| (g, f))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldGroup {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// IDs of external validators to run against this group.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validator_refs: Vec<String>,
    pub fields: Vec<Field>,
}

/// Issue-priority weight of a field, always materialized (default `medium`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn weight(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

/// How a checkboxes field interprets its markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckboxMode {
    /// Five workflow states: todo/done/incomplete/active/na.
    Multi,
    /// Two states: todo/done.
    Simple,
    /// Three states: unfilled/yes/no. Always required.
    Explicit,
}

impl CheckboxMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckboxMode::Multi => "multi",
            CheckboxMode::Simple => "simple",
            CheckboxMode::Explicit => "explicit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "multi" => Some(CheckboxMode::Multi),
            "simple" => Some(CheckboxMode::Simple),
            "explicit" => Some(CheckboxMode::Explicit),
            _ => None,
        }
    }
}

/// One choice within a selection or checkbox field.
///
/// The ID is unique only within the containing field; externally an option is
/// addressed as `"{field_id}.{option_id}"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NumberConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default)]
    pub integer: bool,
}

/// Inclusive ISO-8601 date bounds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DateConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct YearConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_max_length: Option<usize>,
    #[serde(default)]
    pub unique: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Number,
    Date,
    Url,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Date => "date",
            ColumnType::Url => "url",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(ColumnType::Text),
            "number" => Some(ColumnType::Number),
            "date" => Some(ColumnType::Date),
            "url" => Some(ColumnType::Url),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    /// Backfilled from the literal header row when not given explicitly.
    pub label: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    pub columns: Vec<Column>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<usize>,
}

/// The closed set of field kinds with their per-kind schema payload.
///
/// Adding a kind is a compile-time-forced update everywhere this is matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum FieldKind {
    #[serde(rename = "string")]
    Text(TextConstraints),
    #[serde(rename = "number")]
    Number(NumberConstraints),
    #[serde(rename = "date")]
    Date(DateConstraints),
    #[serde(rename = "year")]
    Year(YearConstraints),
    #[serde(rename = "url")]
    Url(TextConstraints),
    #[serde(rename = "string_list")]
    TextList(ListConstraints),
    #[serde(rename = "url_list")]
    UrlList(ListConstraints),
    #[serde(rename = "single_select")]
    SingleSelect { options: Vec<FieldOption> },
    #[serde(rename = "multi_select")]
    MultiSelect {
        options: Vec<FieldOption>,
        #[serde(skip_serializing_if = "Option::is_none")]
        min_selected: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_selected: Option<usize>,
    },
    #[serde(rename = "checkboxes")]
    Checkboxes {
        options: Vec<FieldOption>,
        mode: CheckboxMode,
        /// For `simple` mode: minimum `done` count; `-1` means "all".
        min_done: i32,
    },
    #[serde(rename = "table")]
    Table(TableSpec),
}

impl FieldKind {
    /// Stable wire name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text(_) => "string",
            FieldKind::Number(_) => "number",
            FieldKind::Date(_) => "date",
            FieldKind::Year(_) => "year",
            FieldKind::Url(_) => "url",
            FieldKind::TextList(_) => "string_list",
            FieldKind::UrlList(_) => "url_list",
            FieldKind::SingleSelect { .. } => "single_select",
            FieldKind::MultiSelect { .. } => "multi_select",
            FieldKind::Checkboxes { .. } => "checkboxes",
            FieldKind::Table(_) => "table",
        }
    }

    /// Options of a selection/checkbox kind, if any.
    pub fn options(&self) -> Option<&[FieldOption]> {
        match self {
            FieldKind::SingleSelect { options }
            | FieldKind::MultiSelect { options, .. }
            | FieldKind::Checkboxes { options, .. } => Some(options),
            _ => None,
        }
    }

    /// Kinds whose body is an option list rather than a value fence.
    pub fn is_chooser(&self) -> bool {
        matches!(
            self,
            FieldKind::SingleSelect { .. }
                | FieldKind::MultiSelect { .. }
                | FieldKind::Checkboxes { .. }
        )
    }

    /// Find an option by its field-scoped ID.
    pub fn option(&self, option_id: &str) -> Option<&FieldOption> {
        self.options()
            .and_then(|opts| opts.iter().find(|o| o.id == option_id))
    }
}

/// One schema-defined data-entry point.
///
/// `required` and `priority` are always materialized so downstream consumers
/// never need default-fallback logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    pub label: String,
    pub required: bool,
    pub priority: Priority,
    /// Optional audience filter ("human", "agent", ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Text-entry kinds only; a parse error on chooser kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// Reserved ID for the field synthesized from bare checkbox items.
pub const IMPLICIT_CHECKBOXES_ID: &str = "_checkboxes";

/// Group ID used when the implicit checkboxes field is synthesized.
pub const IMPLICIT_GROUP_ID: &str = "_checkboxes_group";
