//! End-to-end scenarios for the inspect → apply → inspect loop.

use formdown_engine::summary::PriorityTier;
use formdown_engine::{
    AnswerState, ApplyStatus, CheckState, FieldValue, IssueCode, Patch, apply_patches, inspect,
    parse_form, serialize,
};
use pretty_assertions::assert_eq;

const ONE_FIELD_TEMPLATE: &str = "---\nformdown: 1\n---\n\n\
    <!-- form id=\"intake\" title=\"Intake\" -->\n\n\
    <!-- group id=\"main\" -->\n\n\
    <!-- field id=\"client_name\" kind=\"string\" label=\"Client name\" required=\"true\" -->\n\n\
    <!-- /field -->\n\n\
    <!-- /group -->\n\n\
    <!-- /form -->\n";

#[test]
fn minimal_round_trip() {
    // An empty required field: incomplete, with one P1 required_missing.
    let form = parse_form(ONE_FIELD_TEMPLATE).unwrap();
    let before = inspect(&form);
    assert!(!before.is_complete);
    let missing: Vec<_> = before
        .issues
        .iter()
        .filter(|i| i.issue.code == IssueCode::RequiredMissing)
        .collect();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].tier, PriorityTier::P1);

    // Fill it in.
    let result = apply_patches(
        &form,
        &[Patch::SetString {
            field_id: "client_name".to_string(),
            value: Some("ACME".to_string()),
        }],
    );
    assert_eq!(result.status, ApplyStatus::Applied);
    let after = inspect(&result.form);
    assert!(after.is_complete);
    assert!(!after
        .issues
        .iter()
        .any(|i| i.issue.code == IssueCode::RequiredMissing));

    // Serialize and re-parse: same values.
    let reparsed = parse_form(&serialize(&result.form)).unwrap();
    assert_eq!(
        reparsed.response("client_name").unwrap().value,
        Some(FieldValue::Text("ACME".to_string()))
    );
    assert!(inspect(&reparsed).is_complete);
}

const TWO_CHECKBOX_FIELDS: &str = "---\nformdown: 1\n---\n\n\
    <!-- form id=\"filings\" -->\n\n\
    <!-- group id=\"g\" -->\n\n\
    <!-- field id=\"docs_a\" kind=\"checkboxes\" label=\"Company A\" -->\n\n\
    - [ ] 10-K <!-- #ten_k -->\n\
    - [ ] 10-Q <!-- #ten_q -->\n\n\
    <!-- /field -->\n\n\
    <!-- field id=\"docs_b\" kind=\"checkboxes\" label=\"Company B\" -->\n\n\
    - [ ] 10-K <!-- #ten_k -->\n\n\
    <!-- /field -->\n\n\
    <!-- /group -->\n\n\
    <!-- /form -->\n";

#[test]
fn option_scoping_patch_touches_one_field_only() {
    let form = parse_form(TWO_CHECKBOX_FIELDS).unwrap();
    let result = apply_patches(
        &form,
        &[Patch::SetCheckboxes {
            field_id: "docs_a".to_string(),
            value: Some(
                [("ten_k".to_string(), CheckState::Done)]
                    .into_iter()
                    .collect(),
            ),
        }],
    );
    assert_eq!(result.status, ApplyStatus::Applied);

    let Some(FieldValue::Checkboxes(a)) = &result.form.response("docs_a").unwrap().value else {
        panic!("docs_a should be answered");
    };
    assert_eq!(a["ten_k"], CheckState::Done);
    // docs_b has its own ten_k and stays untouched.
    assert_eq!(
        result.form.response("docs_b").unwrap().state,
        AnswerState::Unanswered
    );

    // The text form shows exactly one checked 10-K.
    let canonical = serialize(&result.form);
    let checked = canonical.matches("- [x] 10-K").count();
    assert_eq!(checked, 1);
}

const SKIP_ABORT_TEMPLATE: &str = "---\nformdown: 1\n---\n\n\
    <!-- form id=\"f\" -->\n\n\
    <!-- group id=\"g\" -->\n\n\
    <!-- field id=\"must\" kind=\"string\" label=\"Must\" required=\"true\" -->\n\n\
    ```value\ndone\n```\n\n\
    <!-- /field -->\n\n\
    <!-- field id=\"extra\" kind=\"string\" label=\"Extra\" -->\n\n\
    <!-- /field -->\n\n\
    <!-- /group -->\n\n\
    <!-- /form -->\n";

#[test]
fn skip_and_abort_semantics() {
    let form = parse_form(SKIP_ABORT_TEMPLATE).unwrap();

    // Skipping the required field is a structural rejection.
    let rejected = apply_patches(
        &form,
        &[Patch::SkipField {
            field_id: "must".to_string(),
            role: "agent".to_string(),
            reason: None,
        }],
    );
    assert_eq!(rejected.status, ApplyStatus::Rejected);

    // Skipping the optional one removes it from the issue list and the form
    // completes with zero aborted fields.
    let skipped = apply_patches(
        &form,
        &[Patch::SkipField {
            field_id: "extra".to_string(),
            role: "agent".to_string(),
            reason: None,
        }],
    )
    .form;
    let result = inspect(&skipped);
    assert!(result.is_complete);
    assert_eq!(result.progress.aborted, 0);
    assert!(!result.issues.iter().any(|i| i.issue.target == "extra"));

    // A subsequent abort anywhere defeats completion.
    let aborted = apply_patches(
        &skipped,
        &[Patch::AbortField {
            field_id: "extra".to_string(),
            role: "agent".to_string(),
            reason: Some("cannot be determined".to_string()),
        }],
    )
    .form;
    let result = inspect(&aborted);
    assert!(!result.is_complete);
    assert_eq!(result.progress.aborted, 1);
}

#[test]
fn patch_atomicity_leaves_responses_untouched() {
    let form = parse_form(SKIP_ABORT_TEMPLATE).unwrap();
    let before = form.responses.clone();
    let result = apply_patches(
        &form,
        &[
            Patch::SetString {
                field_id: "extra".to_string(),
                value: Some("kept?".to_string()),
            },
            Patch::SetString {
                field_id: "nope".to_string(),
                value: Some("boom".to_string()),
            },
        ],
    );
    assert_eq!(result.status, ApplyStatus::Rejected);
    assert_eq!(result.form.responses, before);
    assert_eq!(form.responses, before);
}
