//! Round-trip properties over the fixture corpus: canonicalization is
//! idempotent, and re-parsing canonical output recovers a structurally
//! identical form.

use formdown_engine::{Patch, apply_patches, parse_form, serialize};
use pretty_assertions::assert_eq;

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

fn assert_round_trip(text: &str) {
    let parsed = parse_form(text).expect("fixture parses");
    let canonical = serialize(&parsed);

    let reparsed = parse_form(&canonical).expect("canonical output parses");
    assert_eq!(parsed.schema, reparsed.schema);
    assert_eq!(parsed.responses, reparsed.responses);
    assert_eq!(parsed.docs, reparsed.docs);
    assert_eq!(parsed.notes, reparsed.notes);
    assert_eq!(parsed.order_index, reparsed.order_index);

    // Canonicalization is a fixed point after one pass.
    assert_eq!(serialize(&reparsed), canonical);
}

#[test]
fn fixture_contract_intake() {
    assert_round_trip(&fixture("contract_intake.form.md"));
}

#[test]
fn fixture_weekly_review_bare_checkboxes() {
    assert_round_trip(&fixture("weekly_review.form.md"));
}

#[test]
fn fixture_vendor_check_directive_syntax() {
    assert_round_trip(&fixture("vendor_check.form.md"));
}

#[test]
fn directive_fixture_canonicalizes_to_comment_syntax() {
    let parsed = parse_form(&fixture("vendor_check.form.md")).unwrap();
    let canonical = serialize(&parsed);
    assert!(canonical.contains("<!-- form id=\"vendor_check\""));
    assert!(!canonical.contains("::form"));
}

#[test]
fn fence_safety_for_adversarial_values() {
    let base = parse_form(&fixture("contract_intake.form.md")).unwrap();
    let nasty_values = [
        "```\ninner fence\n```",
        "````~~~\n```value\nfake\n```",
        "~~~~~~\ntildes\n~~~~~~",
        "`` two ticks\n``` three\n~~~ tildes",
        "   ``` indented three spaces still counts",
    ];
    for nasty in nasty_values {
        let patched = apply_patches(
            &base,
            &[Patch::SetString {
                field_id: "client_name".to_string(),
                value: Some(nasty.to_string()),
            }],
        )
        .form;
        let canonical = serialize(&patched);
        let reparsed = parse_form(&canonical).expect("fenced value must survive");
        assert_eq!(
            reparsed.response("client_name").unwrap().value,
            patched.response("client_name").unwrap().value,
            "value corrupted for {nasty:?}"
        );
    }
}

#[test]
fn skip_and_abort_round_trip_through_text() {
    let base = parse_form(&fixture("contract_intake.form.md")).unwrap();
    let patched = apply_patches(
        &base,
        &[
            Patch::SkipField {
                field_id: "website".to_string(),
                role: "agent".to_string(),
                reason: Some("vendor has no site".to_string()),
            },
            Patch::AbortField {
                field_id: "milestones".to_string(),
                role: "human".to_string(),
                reason: None,
            },
        ],
    )
    .form;

    let reparsed = parse_form(&serialize(&patched)).unwrap();
    assert_eq!(patched.responses, reparsed.responses);
    assert_eq!(patched.notes, reparsed.notes);
}

#[test]
fn metadata_extra_keys_survive_round_trip() {
    let parsed = parse_form(&fixture("contract_intake.form.md")).unwrap();
    let reparsed = parse_form(&serialize(&parsed)).unwrap();
    assert_eq!(parsed.metadata.extra, reparsed.metadata.extra);
}
