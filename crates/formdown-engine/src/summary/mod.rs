//! Summary & priority engine.
//!
//! Everything here is a pure function of a [`ParsedForm`] (plus its issue
//! list) — derived state is recomputed on demand and never cached, so it can
//! never go stale.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{AnswerState, Field, FieldKind, FieldResponse, FormSchema, ParsedForm};
use crate::validate::{self, Issue, IssueCode, checkbox_complete};

/// Static schema facts; independent of any response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureSummary {
    pub form_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub groups: usize,
    pub fields: usize,
    pub required_fields: usize,
    pub fields_by_kind: BTreeMap<String, usize>,
    /// Group ID → field IDs, in document order.
    pub group_fields: BTreeMap<String, Vec<String>>,
}

/// Where a field stands, derived from its response and issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressState {
    Empty,
    Incomplete,
    Invalid,
    Complete,
}

/// Three orthogonal per-field dimensions, counted over the whole form:
/// answer-state, validity, and value-presence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub total: usize,
    pub unanswered: usize,
    pub answered: usize,
    pub skipped: usize,
    pub aborted: usize,
    pub valid: usize,
    pub invalid: usize,
    pub empty: usize,
    pub filled: usize,
    pub field_states: BTreeMap<String, ProgressState>,
}

/// Priority tier buckets. P1 is the most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum PriorityTier {
    P1,
    P2,
    P3,
    P4,
    P5,
}

impl PriorityTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            5.. => PriorityTier::P1,
            4 => PriorityTier::P2,
            3 => PriorityTier::P3,
            2 => PriorityTier::P4,
            _ => PriorityTier::P5,
        }
    }
}

/// An issue with its computed priority, as handed to external tooling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrioritizedIssue {
    #[serde(flatten)]
    pub issue: Issue,
    pub score: u8,
    pub tier: PriorityTier,
}

/// The full inspect payload of the tool contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectResult {
    pub structure: StructureSummary,
    pub progress: ProgressSummary,
    pub issues: Vec<PrioritizedIssue>,
    pub is_complete: bool,
    pub form_state: ProgressState,
}

/// Caller-supplied inspect filters.
#[derive(Debug, Clone, Default)]
pub struct InspectOptions {
    /// Consider only fields whose `role` is absent or equal to this.
    pub role: Option<String>,
}

pub fn structure_summary(schema: &FormSchema) -> StructureSummary {
    let mut fields_by_kind: BTreeMap<String, usize> = BTreeMap::new();
    let mut group_fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut fields = 0;
    let mut required_fields = 0;
    for group in &schema.groups {
        let ids = group.fields.iter().map(|f| f.id.clone()).collect();
        group_fields.insert(group.id.clone(), ids);
        for field in &group.fields {
            fields += 1;
            if field.required {
                required_fields += 1;
            }
            *fields_by_kind
                .entry(field.kind.name().to_string())
                .or_default() += 1;
        }
    }
    StructureSummary {
        form_id: schema.id.clone(),
        title: schema.title.clone(),
        groups: schema.groups.len(),
        fields,
        required_fields,
        fields_by_kind,
        group_fields,
    }
}

/// Whether this field's own value meets its kind's completion rule.
/// Non-checkbox kinds are complete whenever they are answered.
fn kind_complete(field: &Field, response: &FieldResponse) -> bool {
    match (&field.kind, &response.value) {
        (
            FieldKind::Checkboxes {
                options,
                mode,
                min_done,
            },
            Some(crate::model::FieldValue::Checkboxes(states)),
        ) => checkbox_complete(*mode, *min_done, options, states),
        _ => true,
    }
}

/// Derive one field's progress state from its response and issues.
pub fn field_progress(field: &Field, response: &FieldResponse, issues: &[Issue]) -> ProgressState {
    if response.state != AnswerState::Answered {
        return ProgressState::Empty;
    }
    let has_errors = issues
        .iter()
        .any(|i| i.is_error() && issue_field(i) == field.id);
    if has_errors {
        return ProgressState::Invalid;
    }
    if field.required && !kind_complete(field, response) {
        return ProgressState::Incomplete;
    }
    ProgressState::Complete
}

/// The field an issue belongs to: its target with any option suffix dropped.
fn issue_field(issue: &Issue) -> &str {
    issue
        .target
        .split_once('.')
        .map(|(field, _)| field)
        .unwrap_or(&issue.target)
}

fn field_matches_role(field: &Field, role: Option<&str>) -> bool {
    match (role, &field.role) {
        (Some(wanted), Some(role)) => role == wanted,
        _ => true,
    }
}

pub fn progress_summary(form: &ParsedForm, issues: &[Issue]) -> ProgressSummary {
    progress_summary_filtered(form, issues, None)
}

fn progress_summary_filtered(
    form: &ParsedForm,
    issues: &[Issue],
    role: Option<&str>,
) -> ProgressSummary {
    let mut summary = ProgressSummary {
        total: 0,
        unanswered: 0,
        answered: 0,
        skipped: 0,
        aborted: 0,
        valid: 0,
        invalid: 0,
        empty: 0,
        filled: 0,
        field_states: BTreeMap::new(),
    };
    for (field, response) in form.fields_with_responses() {
        if !field_matches_role(field, role) {
            continue;
        }
        summary.total += 1;
        match response.state {
            AnswerState::Unanswered => summary.unanswered += 1,
            AnswerState::Answered => summary.answered += 1,
            AnswerState::Skipped => summary.skipped += 1,
            AnswerState::Aborted => summary.aborted += 1,
        }
        let has_errors = issues
            .iter()
            .any(|i| i.is_error() && issue_field(i) == field.id);
        if has_errors {
            summary.invalid += 1;
        } else {
            summary.valid += 1;
        }
        if response.value.is_some() {
            summary.filled += 1;
        } else {
            summary.empty += 1;
        }
        summary
            .field_states
            .insert(field.id.clone(), field_progress(field, response, issues));
    }
    summary
}

/// Priority = field weight (high 3, medium 2, low 1) + issue-type score.
pub fn issue_score(issue: &Issue, form: &ParsedForm) -> u8 {
    let field = form.field(issue_field(issue));
    let weight = field.map(|f| f.priority.weight()).unwrap_or(2);
    let type_score = match issue.code {
        IssueCode::RequiredMissing => 3,
        IssueCode::ExplicitUnfilled => 3,
        IssueCode::CheckboxIncomplete => {
            if field.is_some_and(|f| f.required) {
                3
            } else {
                2
            }
        }
        IssueCode::MinItemsNotMet => 2,
        IssueCode::OptionalUnanswered => 1,
        _ => 2,
    };
    weight + type_score
}

/// Attach scores/tiers and sort: tier, then severity, then score (highest
/// first), then ref — fully deterministic.
pub fn prioritize(issues: Vec<Issue>, form: &ParsedForm) -> Vec<PrioritizedIssue> {
    let mut prioritized: Vec<PrioritizedIssue> = issues
        .into_iter()
        .map(|issue| {
            let score = issue_score(&issue, form);
            PrioritizedIssue {
                tier: PriorityTier::from_score(score),
                score,
                issue,
            }
        })
        .collect();
    prioritized.sort_by(|a, b| {
        a.tier
            .cmp(&b.tier)
            .then(a.issue.severity.cmp(&b.issue.severity))
            .then(b.score.cmp(&a.score))
            .then(a.issue.target.cmp(&b.issue.target))
    });
    prioritized
}

/// The completion predicate: every considered field answered-and-complete or
/// skipped, no aborted fields anywhere, and no error-severity issues left.
pub fn is_complete(form: &ParsedForm, issues: &[Issue], role: Option<&str>) -> bool {
    // An abort anywhere blocks completion, role filter or not.
    let any_aborted = form
        .responses
        .values()
        .any(|r| r.state == AnswerState::Aborted);
    if any_aborted {
        return false;
    }

    for (field, response) in form.fields_with_responses() {
        if !field_matches_role(field, role) {
            continue;
        }
        let done = match response.state {
            AnswerState::Skipped => true,
            AnswerState::Answered => {
                field_progress(field, response, issues) == ProgressState::Complete
            }
            AnswerState::Unanswered | AnswerState::Aborted => false,
        };
        if !done {
            return false;
        }
    }

    !issues.iter().any(|i| {
        if !i.is_error() {
            return false;
        }
        match form.field(issue_field(i)) {
            Some(field) => field_matches_role(field, role),
            // Group/form-level errors always block.
            None => true,
        }
    })
}

/// Whole-form progress state.
pub fn form_state(form: &ParsedForm, issues: &[Issue], role: Option<&str>) -> ProgressState {
    let mut any_considered = false;
    let mut any_invalid = false;
    let mut any_touched = false;
    for (field, response) in form.fields_with_responses() {
        if !field_matches_role(field, role) {
            continue;
        }
        any_considered = true;
        match field_progress(field, response, issues) {
            ProgressState::Invalid => any_invalid = true,
            ProgressState::Complete | ProgressState::Incomplete => any_touched = true,
            ProgressState::Empty => {
                if response.state != AnswerState::Unanswered {
                    any_touched = true;
                }
            }
        }
    }
    if any_invalid {
        return ProgressState::Invalid;
    }
    if is_complete(form, issues, role) {
        return ProgressState::Complete;
    }
    if any_touched || !any_considered {
        ProgressState::Incomplete
    } else {
        ProgressState::Empty
    }
}

/// Inspect with built-in validation only.
pub fn inspect(form: &ParsedForm) -> InspectResult {
    inspect_with(form, &InspectOptions::default())
}

pub fn inspect_with(form: &ParsedForm, options: &InspectOptions) -> InspectResult {
    let role = options.role.as_deref();
    let issues: Vec<Issue> = validate::validate(form)
        .into_iter()
        .filter(|i| match form.field(issue_field(i)) {
            Some(field) => field_matches_role(field, role),
            None => true,
        })
        .collect();
    let structure = structure_summary(&form.schema);
    let progress = progress_summary_filtered(form, &issues, role);
    let complete = is_complete(form, &issues, role);
    let state = form_state(form, &issues, role);
    InspectResult {
        structure,
        progress,
        issues: prioritize(issues, form),
        is_complete: complete,
        form_state: state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_form;
    use crate::patch::{Patch, apply_patches};
    use pretty_assertions::assert_eq;

    fn doc(body: &str) -> String {
        format!("---\nformdown: 1\n---\n\n{body}")
    }

    fn two_field_form() -> ParsedForm {
        parse_form(&doc(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"name\" kind=\"string\" label=\"Name\" priority=\"high\" required=\"true\" -->\n\n\
             <!-- /field -->\n\n\
             <!-- field id=\"site\" kind=\"url\" label=\"Site\" priority=\"low\" -->\n\n\
             ```value\nnot a url\n```\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        ))
        .unwrap()
    }

    #[test]
    fn test_structure_summary_counts() {
        let form = two_field_form();
        let structure = structure_summary(&form.schema);
        assert_eq!(structure.groups, 1);
        assert_eq!(structure.fields, 2);
        assert_eq!(structure.required_fields, 1);
        assert_eq!(structure.fields_by_kind["string"], 1);
        assert_eq!(structure.fields_by_kind["url"], 1);
        assert_eq!(structure.group_fields["g"], vec!["name", "site"]);
    }

    #[test]
    fn test_priority_ordering_required_before_low_validation() {
        // high-priority required_missing scores 3+3=6 (P1); the low-priority
        // invalid URL scores 1+2=3 (P3).
        let form = two_field_form();
        let result = inspect(&form);
        assert!(result.issues.len() >= 2);
        assert_eq!(result.issues[0].issue.target, "name");
        assert_eq!(result.issues[0].score, 6);
        assert_eq!(result.issues[0].tier, PriorityTier::P1);
        let url_issue = result
            .issues
            .iter()
            .find(|i| i.issue.target == "site" && i.issue.code == IssueCode::InvalidUrl)
            .unwrap();
        assert_eq!(url_issue.score, 3);
        assert_eq!(url_issue.tier, PriorityTier::P3);
    }

    #[test]
    fn test_progress_dimensions() {
        let form = two_field_form();
        let issues = validate::validate(&form);
        let progress = progress_summary(&form, &issues);
        assert_eq!(progress.total, 2);
        assert_eq!(progress.unanswered, 1);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.invalid, 2); // required_missing + invalid_url
        assert_eq!(progress.filled, 1);
        assert_eq!(progress.field_states["name"], ProgressState::Empty);
        assert_eq!(progress.field_states["site"], ProgressState::Invalid);
    }

    #[test]
    fn test_completion_flow() {
        let form = two_field_form();
        assert!(!inspect(&form).is_complete);

        let fixed = apply_patches(
            &form,
            &[
                Patch::SetString {
                    field_id: "name".to_string(),
                    value: Some("ACME".to_string()),
                },
                Patch::SetUrl {
                    field_id: "site".to_string(),
                    value: Some("https://acme.example".to_string()),
                },
            ],
        )
        .form;
        let result = inspect(&fixed);
        assert!(result.is_complete);
        assert_eq!(result.form_state, ProgressState::Complete);
    }

    #[test]
    fn test_skip_counts_toward_completion_but_abort_blocks() {
        let form = two_field_form();
        let skipped = apply_patches(
            &form,
            &[
                Patch::SetString {
                    field_id: "name".to_string(),
                    value: Some("ACME".to_string()),
                },
                Patch::SkipField {
                    field_id: "site".to_string(),
                    role: "agent".to_string(),
                    reason: None,
                },
            ],
        )
        .form;
        let result = inspect(&skipped);
        assert!(result.is_complete);
        assert_eq!(result.progress.aborted, 0);

        let aborted = apply_patches(
            &skipped,
            &[Patch::AbortField {
                field_id: "site".to_string(),
                role: "agent".to_string(),
                reason: None,
            }],
        )
        .form;
        assert!(!inspect(&aborted).is_complete);
    }

    #[test]
    fn test_required_incomplete_checkbox_is_incomplete_not_invalid() {
        let form = parse_form(&doc(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"cb\" kind=\"checkboxes\" label=\"C\" required=\"true\" -->\n\n\
             - [x] One <!-- #one -->\n\
             - [ ] Two <!-- #two -->\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        ))
        .unwrap();
        let result = inspect(&form);
        assert_eq!(result.progress.field_states["cb"], ProgressState::Incomplete);
        assert!(!result.is_complete);
        // Required + incomplete scores 2+3=5 → P1.
        let incomplete = result
            .issues
            .iter()
            .find(|i| i.issue.code == IssueCode::CheckboxIncomplete)
            .unwrap();
        assert_eq!(incomplete.score, 5);
        assert_eq!(incomplete.tier, PriorityTier::P1);
    }

    #[test]
    fn test_role_filtering() {
        let form = parse_form(&doc(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"auto\" kind=\"string\" label=\"A\" required=\"true\" role=\"agent\" -->\n\n\
             ```value\ndone\n```\n\n\
             <!-- /field -->\n\n\
             <!-- field id=\"manual\" kind=\"string\" label=\"M\" required=\"true\" role=\"human\" -->\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        ))
        .unwrap();
        // Unfiltered: the human field is still missing.
        assert!(!inspect(&form).is_complete);
        // Filtered to the agent's view, everything assigned to it is done.
        let result = inspect_with(
            &form,
            &InspectOptions {
                role: Some("agent".to_string()),
            },
        );
        assert!(result.is_complete);
        assert_eq!(result.progress.total, 1);
    }

    #[test]
    fn test_empty_form_state() {
        let form = two_field_form();
        let cleared = apply_patches(
            &form,
            &[Patch::ClearField {
                field_id: "site".to_string(),
            }],
        )
        .form;
        let result = inspect(&cleared);
        assert_eq!(result.form_state, ProgressState::Empty);
    }
}
