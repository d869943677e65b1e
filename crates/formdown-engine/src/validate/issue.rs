use serde::Serialize;

/// How bad an issue is. The variant order is the sort order: errors first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Where an issue came from. Built-in rules always run first; externally
/// supplied validators merge in after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueSource {
    Builtin,
    ExternalCode,
    ExternalModel,
}

/// Stable machine-readable issue codes; external tools match on these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    RequiredMissing,
    OptionalUnanswered,
    FieldAborted,
    OutOfRange,
    NotAnInteger,
    InvalidDate,
    InvalidYear,
    InvalidUrl,
    TooShort,
    TooLong,
    PatternMismatch,
    MinItemsNotMet,
    MaxItemsExceeded,
    ItemTooLong,
    DuplicateItems,
    SelectionCount,
    UnknownOption,
    CheckboxIncomplete,
    ExplicitUnfilled,
    IllegalCheckboxState,
    RowCountOutOfBounds,
    ValidatorMissing,
    /// Catch-all for externally supplied rules that do not map onto a
    /// built-in code.
    External,
}

/// One advisory finding. Issues are data, never exceptions: they drive the
/// inspect → apply → inspect loop without ever stopping an operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub code: IssueCode,
    /// The form element this issue is about; options use the qualified
    /// `"field_id.option_id"` form.
    #[serde(rename = "ref")]
    pub target: String,
    pub message: String,
    pub source: IssueSource,
}

impl Issue {
    pub fn builtin(
        severity: Severity,
        code: IssueCode,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            target: target.into(),
            message: message.into(),
            source: IssueSource::Builtin,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
