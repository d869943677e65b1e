use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::schema::{CheckboxMode, ColumnType};

/// Whether and how a field has been acted on, orthogonal to its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerState {
    Unanswered,
    Answered,
    /// Explicit "will not fill" on a non-required field; counts toward
    /// completion without a value.
    Skipped,
    /// Explicit refusal; always blocks form completion.
    Aborted,
}

/// State of one checkbox option. Which states are legal depends on the
/// field's [`CheckboxMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Todo,
    Done,
    Incomplete,
    Active,
    Na,
    Unfilled,
    Yes,
    No,
}

impl CheckState {
    /// The marker character written between `[` and `]`.
    pub fn marker(self) -> char {
        match self {
            CheckState::Todo | CheckState::Unfilled => ' ',
            CheckState::Done => 'x',
            CheckState::Incomplete => '/',
            CheckState::Active => '*',
            CheckState::Na => '-',
            CheckState::Yes => 'y',
            CheckState::No => 'n',
        }
    }

    /// Interpret a marker character under the given mode.
    pub fn from_marker(marker: char, mode: CheckboxMode) -> Option<Self> {
        let state = match (mode, marker) {
            (CheckboxMode::Explicit, ' ') => CheckState::Unfilled,
            (CheckboxMode::Explicit, 'y') => CheckState::Yes,
            (CheckboxMode::Explicit, 'n') => CheckState::No,
            (_, ' ') => CheckState::Todo,
            (_, 'x') => CheckState::Done,
            (CheckboxMode::Multi, '/') => CheckState::Incomplete,
            (CheckboxMode::Multi, '*') => CheckState::Active,
            (CheckboxMode::Multi, '-') => CheckState::Na,
            _ => return None,
        };
        Some(state)
    }

    /// The state every option starts in under the given mode.
    pub fn default_for(mode: CheckboxMode) -> Self {
        match mode {
            CheckboxMode::Multi | CheckboxMode::Simple => CheckState::Todo,
            CheckboxMode::Explicit => CheckState::Unfilled,
        }
    }

    pub fn legal_for(self, mode: CheckboxMode) -> bool {
        match mode {
            CheckboxMode::Multi => matches!(
                self,
                CheckState::Todo
                    | CheckState::Done
                    | CheckState::Incomplete
                    | CheckState::Active
                    | CheckState::Na
            ),
            CheckboxMode::Simple => matches!(self, CheckState::Todo | CheckState::Done),
            CheckboxMode::Explicit => {
                matches!(self, CheckState::Unfilled | CheckState::Yes | CheckState::No)
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CheckState::Todo => "todo",
            CheckState::Done => "done",
            CheckState::Incomplete => "incomplete",
            CheckState::Active => "active",
            CheckState::Na => "na",
            CheckState::Unfilled => "unfilled",
            CheckState::Yes => "yes",
            CheckState::No => "no",
        }
    }
}

/// One cell of a table row, typed by its column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Render the cell the way the canonical serializer writes it.
    pub fn to_cell_text(&self) -> String {
        match self {
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
        }
    }

    /// Parse literal cell text under a column type. Number cells must parse;
    /// everything else is carried as text and left to the rule validator.
    pub fn from_cell_text(text: &str, column_type: ColumnType) -> Option<Self> {
        match column_type {
            ColumnType::Number => text.trim().parse::<f64>().ok().map(CellValue::Number),
            ColumnType::Text | ColumnType::Date | ColumnType::Url => {
                Some(CellValue::Text(text.to_string()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub cells: Vec<CellValue>,
}

/// A field's value, shaped by its kind. Present only on answered fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Year(i32),
    Text(String),
    Date(String),
    Url(String),
    TextList(Vec<String>),
    UrlList(Vec<String>),
    SingleSelect(String),
    MultiSelect(Vec<String>),
    Checkboxes(BTreeMap<String, CheckState>),
    Table(Vec<TableRow>),
}

impl FieldValue {
    /// True for the shapes that `set_*` treats as "no value at all".
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Number(_) | FieldValue::Year(_) => false,
            FieldValue::Text(s) | FieldValue::Date(s) | FieldValue::Url(s) => s.is_empty(),
            FieldValue::TextList(v) | FieldValue::UrlList(v) => v.is_empty(),
            FieldValue::SingleSelect(s) => s.is_empty(),
            FieldValue::MultiSelect(v) => v.is_empty(),
            FieldValue::Checkboxes(m) => m.is_empty(),
            FieldValue::Table(rows) => rows.is_empty(),
        }
    }
}

/// The single source of truth for a field's runtime state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldResponse {
    pub state: AnswerState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FieldResponse {
    pub fn unanswered() -> Self {
        Self {
            state: AnswerState::Unanswered,
            value: None,
            reason: None,
        }
    }

    pub fn answered(value: FieldValue) -> Self {
        Self {
            state: AnswerState::Answered,
            value: Some(value),
            reason: None,
        }
    }

    pub fn skipped(reason: Option<String>) -> Self {
        Self {
            state: AnswerState::Skipped,
            value: None,
            reason,
        }
    }

    pub fn aborted(reason: Option<String>) -> Self {
        Self {
            state: AnswerState::Aborted,
            value: None,
            reason,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.state == AnswerState::Answered
    }
}

/// Render an f64 without a trailing `.0` for whole numbers, so canonical
/// output round-trips integers as written.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

static SENTINEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(skipped|aborted)\](?: \((.*)\))?$").unwrap());

/// Parse a skip/abort sentinel line: `[skipped]`, `[aborted] (reason)`.
///
/// The same grammar is used in persisted value blocks and in the friendly
/// export, so both round-trip to the same response model.
pub fn parse_sentinel(text: &str) -> Option<(AnswerState, Option<String>)> {
    let caps = SENTINEL_RE.captures(text.trim())?;
    let state = match caps.get(1).unwrap().as_str() {
        "skipped" => AnswerState::Skipped,
        _ => AnswerState::Aborted,
    };
    let reason = caps.get(2).map(|m| m.as_str().to_string());
    Some((state, reason))
}

/// Render a skip/abort response as its sentinel line.
pub fn sentinel_string(state: AnswerState, reason: Option<&str>) -> Option<String> {
    let token = match state {
        AnswerState::Skipped => "skipped",
        AnswerState::Aborted => "aborted",
        AnswerState::Unanswered | AnswerState::Answered => return None,
    };
    Some(match reason {
        Some(reason) if !reason.is_empty() => format!("[{token}] ({reason})"),
        _ => format!("[{token}]"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CheckboxMode::Multi, ' ', Some(CheckState::Todo))]
    #[case(CheckboxMode::Multi, 'x', Some(CheckState::Done))]
    #[case(CheckboxMode::Multi, '/', Some(CheckState::Incomplete))]
    #[case(CheckboxMode::Multi, '*', Some(CheckState::Active))]
    #[case(CheckboxMode::Multi, '-', Some(CheckState::Na))]
    #[case(CheckboxMode::Multi, 'y', None)]
    #[case(CheckboxMode::Simple, ' ', Some(CheckState::Todo))]
    #[case(CheckboxMode::Simple, 'x', Some(CheckState::Done))]
    #[case(CheckboxMode::Simple, '/', None)]
    #[case(CheckboxMode::Explicit, ' ', Some(CheckState::Unfilled))]
    #[case(CheckboxMode::Explicit, 'y', Some(CheckState::Yes))]
    #[case(CheckboxMode::Explicit, 'n', Some(CheckState::No))]
    #[case(CheckboxMode::Explicit, 'x', None)]
    fn test_marker_interpretation(
        #[case] mode: CheckboxMode,
        #[case] marker: char,
        #[case] expected: Option<CheckState>,
    ) {
        assert_eq!(CheckState::from_marker(marker, mode), expected);
    }

    #[test]
    fn test_marker_round_trip() {
        for mode in [CheckboxMode::Multi, CheckboxMode::Simple, CheckboxMode::Explicit] {
            for marker in [' ', 'x', '/', '*', '-', 'y', 'n'] {
                if let Some(state) = CheckState::from_marker(marker, mode) {
                    assert_eq!(state.marker(), marker);
                    assert!(state.legal_for(mode));
                }
            }
        }
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(5000.0), "5000");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn test_empty_value_shapes() {
        assert!(FieldValue::Text(String::new()).is_empty());
        assert!(FieldValue::MultiSelect(vec![]).is_empty());
        assert!(!FieldValue::Number(0.0).is_empty());
        assert!(!FieldValue::Text("x".into()).is_empty());
    }

    #[test]
    fn test_sentinel_round_trip() {
        assert_eq!(
            parse_sentinel("[skipped]"),
            Some((AnswerState::Skipped, None))
        );
        assert_eq!(
            parse_sentinel("[aborted] (no public filings)"),
            Some((AnswerState::Aborted, Some("no public filings".to_string())))
        );
        assert_eq!(parse_sentinel("just text"), None);
        assert_eq!(parse_sentinel("[skipped] trailing"), None);

        let rendered = sentinel_string(AnswerState::Skipped, Some("n/a")).unwrap();
        assert_eq!(parse_sentinel(&rendered), Some((AnswerState::Skipped, Some("n/a".to_string()))));
        assert_eq!(sentinel_string(AnswerState::Answered, None), None);
    }
}
