//! Parsing pipeline: frontmatter split → tag/token extraction → schema &
//! response building → parse-time semantic validation.

pub mod builder;
pub mod extract;
pub mod frontmatter;
pub mod lexer;
pub mod semantic;

use crate::error::{LineIndex, ParseError};
use crate::model::ParsedForm;

/// Parse a `.form.md` document into a [`ParsedForm`].
///
/// Any structural or semantic problem aborts the load with a positioned
/// [`ParseError`]; a returned form is always internally consistent.
pub fn parse_form(text: &str) -> Result<ParsedForm, ParseError> {
    let lines = LineIndex::new(text);
    let (metadata, body, body_offset) = frontmatter::split_frontmatter(text)?;
    let entries = extract::extract_entries(body, body_offset, &lines)?;
    let built = builder::build_form(entries, metadata, &lines)?;
    let form = semantic::validate(built, &lines)?;
    tracing::debug!(
        form = %form.schema.id,
        fields = form.responses.len(),
        "parsed form"
    );
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;
    use crate::model::{
        AnswerState, CheckState, CheckboxMode, FieldKind, FieldValue, NodeKind, Priority,
        IMPLICIT_CHECKBOXES_ID,
    };
    use pretty_assertions::assert_eq;

    fn doc(body: &str) -> String {
        format!("---\nformdown: 1\n---\n\n{body}")
    }

    fn parse(body: &str) -> ParsedForm {
        parse_form(&doc(body)).expect("document should parse")
    }

    fn parse_err(body: &str) -> ParseError {
        parse_form(&doc(body)).expect_err("document should not parse")
    }

    #[test]
    fn test_minimal_string_field() {
        let form = parse(
            "<!-- form id=\"f\" title=\"Form\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"name\" kind=\"string\" label=\"Name\" required=\"true\" -->\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        assert_eq!(form.schema.id, "f");
        assert_eq!(form.schema.title.as_deref(), Some("Form"));
        let field = form.field("name").unwrap();
        assert!(field.required);
        assert_eq!(field.priority, Priority::Medium);
        assert_eq!(
            form.response("name").unwrap().state,
            AnswerState::Unanswered
        );
        assert_eq!(form.order_index, vec!["f", "g", "name"]);
        assert_eq!(form.id_index.get("name").unwrap().node, NodeKind::Field);
        assert_eq!(
            form.id_index.get("name").unwrap().parent.as_deref(),
            Some("g")
        );
    }

    #[test]
    fn test_defaults_are_materialized() {
        let form = parse(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"cb\" kind=\"checkboxes\" label=\"Checks\" -->\n\n\
             - [ ] One <!-- #one -->\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        let field = form.field("cb").unwrap();
        assert!(!field.required);
        assert_eq!(field.priority, Priority::Medium);
        match &field.kind {
            FieldKind::Checkboxes { mode, min_done, .. } => {
                assert_eq!(*mode, CheckboxMode::Multi);
                assert_eq!(*min_done, -1);
            }
            other => panic!("expected checkboxes, got {other:?}"),
        }
    }

    #[test]
    fn test_value_fence_answers_field() {
        let form = parse(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"name\" kind=\"string\" label=\"Name\" -->\n\n\
             ```value\nACME Corp\n```\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        let response = form.response("name").unwrap();
        assert_eq!(response.state, AnswerState::Answered);
        assert_eq!(
            response.value,
            Some(FieldValue::Text("ACME Corp".to_string()))
        );
    }

    #[test]
    fn test_two_syntaxes_parse_identically() {
        let comment = parse(
            "<!-- form id=\"f\" title=\"T\" -->\n\n\
             <!-- group id=\"g\" title=\"G\" -->\n\n\
             <!-- field id=\"pick\" kind=\"single_select\" label=\"Pick\" priority=\"high\" -->\n\n\
             - [x] Alpha <!-- #alpha -->\n\
             - [ ] Beta <!-- #beta -->\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        let directive = parse(
            "::form{id=\"f\" title=\"T\"}\n\n\
             ::group{id=\"g\" title=\"G\"}\n\n\
             ::field{id=\"pick\" kind=\"single_select\" label=\"Pick\" priority=\"high\"}\n\n\
             - [x] Alpha {#alpha}\n\
             - [ ] Beta {#beta}\n\n\
             ::/field\n\n\
             ::/group\n\n\
             ::/form\n",
        );
        assert_eq!(comment.schema, directive.schema);
        assert_eq!(comment.responses, directive.responses);
    }

    #[test]
    fn test_single_select_response() {
        let form = parse(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"pick\" kind=\"single_select\" label=\"Pick\" -->\n\n\
             - [ ] Alpha <!-- #alpha -->\n\
             - [x] Beta <!-- #beta -->\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        assert_eq!(
            form.response("pick").unwrap().value,
            Some(FieldValue::SingleSelect("beta".to_string()))
        );
    }

    #[test]
    fn test_single_select_with_two_selections_fails() {
        let err = parse_err(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"pick\" kind=\"single_select\" label=\"Pick\" -->\n\n\
             - [x] Alpha <!-- #alpha -->\n\
             - [x] Beta <!-- #beta -->\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        assert!(matches!(
            err.kind,
            ParseErrorKind::MultipleSelections { .. }
        ));
    }

    #[test]
    fn test_checkbox_states_parse_by_mode() {
        let form = parse(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"cb\" kind=\"checkboxes\" label=\"Checks\" -->\n\n\
             - [x] Done one <!-- #a -->\n\
             - [/] Part way <!-- #b -->\n\
             - [*] Working <!-- #c -->\n\
             - [-] Not relevant <!-- #d -->\n\
             - [ ] Untouched <!-- #e -->\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        let Some(FieldValue::Checkboxes(states)) = &form.response("cb").unwrap().value else {
            panic!("expected checkbox value");
        };
        assert_eq!(states["a"], CheckState::Done);
        assert_eq!(states["b"], CheckState::Incomplete);
        assert_eq!(states["c"], CheckState::Active);
        assert_eq!(states["d"], CheckState::Na);
        assert_eq!(states["e"], CheckState::Todo);
    }

    #[test]
    fn test_illegal_marker_for_mode_fails() {
        let err = parse_err(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"cb\" kind=\"checkboxes\" mode=\"simple\" label=\"Checks\" -->\n\n\
             - [/] Half <!-- #a -->\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        assert!(matches!(
            err.kind,
            ParseErrorKind::IllegalMarker { marker: '/', .. }
        ));
    }

    #[test]
    fn test_explicit_mode_requires_required() {
        let err = parse_err(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"cb\" kind=\"checkboxes\" mode=\"explicit\" label=\"Checks\" -->\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        assert!(matches!(
            err.kind,
            ParseErrorKind::ExplicitModeOptional { .. }
        ));
    }

    #[test]
    fn test_placeholder_on_chooser_fails() {
        let err = parse_err(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"pick\" kind=\"multi_select\" label=\"Pick\" placeholder=\"choose\" -->\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        assert!(matches!(
            err.kind,
            ParseErrorKind::AttributeNotAllowed { .. }
        ));
    }

    #[test]
    fn test_missing_label_fails() {
        let err = parse_err(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"x\" kind=\"string\" -->\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        assert!(matches!(err.kind, ParseErrorKind::MissingLabel { .. }));
    }

    #[test]
    fn test_duplicate_field_id_fails() {
        let err = parse_err(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"x\" kind=\"string\" label=\"A\" -->\n\n<!-- /field -->\n\n\
             <!-- field id=\"x\" kind=\"string\" label=\"B\" -->\n\n<!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        assert!(matches!(err.kind, ParseErrorKind::DuplicateId { .. }));
        assert!(err.pos.line > 1);
    }

    #[test]
    fn test_option_ids_are_field_scoped() {
        // The same option vocabulary may be reused across fields.
        let form = parse(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"docs_a\" kind=\"checkboxes\" label=\"A\" -->\n\n\
             - [ ] 10-K <!-- #ten_k -->\n\n\
             <!-- /field -->\n\n\
             <!-- field id=\"docs_b\" kind=\"checkboxes\" label=\"B\" -->\n\n\
             - [ ] 10-K <!-- #ten_k -->\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        assert!(form.resolve_ref("docs_a.ten_k"));
        assert!(form.resolve_ref("docs_b.ten_k"));
    }

    #[test]
    fn test_duplicate_option_in_one_field_fails() {
        let err = parse_err(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"docs\" kind=\"checkboxes\" label=\"A\" -->\n\n\
             - [ ] 10-K <!-- #ten_k -->\n\
             - [ ] Also 10-K <!-- #ten_k -->\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        assert!(matches!(err.kind, ParseErrorKind::DuplicateOptionId { .. }));
    }

    #[test]
    fn test_option_without_id_fails() {
        let err = parse_err(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"docs\" kind=\"checkboxes\" label=\"A\" -->\n\n\
             - [ ] Unannotated option\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        assert!(matches!(err.kind, ParseErrorKind::OptionMissingId { .. }));
    }

    #[test]
    fn test_nested_field_names_both_ids() {
        let err = parse_err(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"outer\" kind=\"string\" label=\"O\" -->\n\n\
             <!-- field id=\"inner\" kind=\"string\" label=\"I\" -->\n\n\
             <!-- /field -->\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        match err.kind {
            ParseErrorKind::NestedField { outer, inner } => {
                assert_eq!(outer, "outer");
                assert_eq!(inner, "inner");
            }
            other => panic!("expected nested-field error, got {other:?}"),
        }
    }

    #[test]
    fn test_doc_blocks_attach_and_deduplicate() {
        let body = "<!-- form id=\"f\" -->\n\n\
             <!-- doc ref=\"f\" tag=\"description\" -->\nAbout this form.\n<!-- /doc -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"x\" kind=\"string\" label=\"X\" -->\n\n<!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n";
        let form = parse(body);
        assert_eq!(form.docs.len(), 1);
        assert_eq!(form.docs[0].target, "f");

        let dup = "<!-- form id=\"f\" -->\n\n\
             <!-- doc ref=\"f\" tag=\"description\" -->\nOne.\n<!-- /doc -->\n\n\
             <!-- doc ref=\"f\" tag=\"description\" -->\nTwo.\n<!-- /doc -->\n\n\
             <!-- /form -->\n";
        let err = parse_err(dup);
        assert!(matches!(err.kind, ParseErrorKind::DuplicateDoc { .. }));
    }

    #[test]
    fn test_unresolved_doc_ref_fails() {
        let err = parse_err(
            "<!-- form id=\"f\" -->\n\n\
             <!-- doc ref=\"ghost\" tag=\"notes\" -->\nBody.\n<!-- /doc -->\n\n\
             <!-- /form -->\n",
        );
        assert!(matches!(err.kind, ParseErrorKind::UnresolvedRef { .. }));
    }

    #[test]
    fn test_bare_checkboxes_lift() {
        let form = parse(
            "<!-- form id=\"todo\" -->\n\n\
             - [x] Write the report <!-- #report -->\n\
             - [ ] File it <!-- #file -->\n\n\
             <!-- /form -->\n",
        );
        let field = form.field(IMPLICIT_CHECKBOXES_ID).unwrap();
        assert!(matches!(
            field.kind,
            FieldKind::Checkboxes {
                mode: CheckboxMode::Multi,
                ..
            }
        ));
        let Some(FieldValue::Checkboxes(states)) =
            &form.response(IMPLICIT_CHECKBOXES_ID).unwrap().value
        else {
            panic!("expected checkbox value");
        };
        assert_eq!(states["report"], CheckState::Done);
        assert_eq!(states["file"], CheckState::Todo);
    }

    #[test]
    fn test_mixed_bare_and_explicit_fields_fail() {
        let err = parse_err(
            "<!-- form id=\"f\" -->\n\n\
             - [x] Stray item <!-- #stray -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"x\" kind=\"string\" label=\"X\" -->\n\n<!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        assert!(matches!(err.kind, ParseErrorKind::MixedCheckboxes));
    }

    #[test]
    fn test_reserved_id_rejected() {
        let err = parse_err(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"_checkboxes\" kind=\"string\" label=\"X\" -->\n\n<!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        assert!(matches!(err.kind, ParseErrorKind::ReservedId { .. }));
    }

    #[test]
    fn test_table_backfills_labels_from_header() {
        let form = parse(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"t\" kind=\"table\" label=\"T\" columns=\"name:text,amount:number\" -->\n\n\
             | Full name | Amount (USD) |\n\
             | --- | --- |\n\
             | Alpha | 100 |\n\
             | Beta | 250.5 |\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        let FieldKind::Table(spec) = &form.field("t").unwrap().kind else {
            panic!("expected table field");
        };
        assert_eq!(spec.columns[0].label, "Full name");
        assert_eq!(spec.columns[1].label, "Amount (USD)");
        let Some(FieldValue::Table(rows)) = &form.response("t").unwrap().value else {
            panic!("expected table value");
        };
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_table_cell_type_mismatch_fails() {
        let err = parse_err(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"t\" kind=\"table\" label=\"T\" columns=\"name:text,amount:number\" -->\n\n\
             | Name | Amount |\n\
             | --- | --- |\n\
             | Alpha | not-a-number |\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        assert!(matches!(err.kind, ParseErrorKind::InvalidValue { .. }));
    }

    #[test]
    fn test_sentinel_value_sets_state() {
        let form = parse(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"x\" kind=\"string\" label=\"X\" -->\n\n\
             ```value\n[skipped] (no public data)\n```\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        let response = form.response("x").unwrap();
        assert_eq!(response.state, AnswerState::Skipped);
        assert_eq!(response.reason.as_deref(), Some("no public data"));
    }

    #[test]
    fn test_skipped_required_field_fails_to_parse() {
        let err = parse_err(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"x\" kind=\"string\" label=\"X\" required=\"true\" -->\n\n\
             ```value\n[skipped]\n```\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        assert!(matches!(err.kind, ParseErrorKind::InvalidValue { .. }));
    }

    #[test]
    fn test_notes_parse_and_resolve() {
        let form = parse(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"x\" kind=\"string\" label=\"X\" -->\n\n<!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- note id=\"n1\" ref=\"x\" role=\"agent\" -->\nChecked the registry.\n<!-- /note -->\n\n\
             <!-- /form -->\n",
        );
        assert_eq!(form.notes.len(), 1);
        assert_eq!(form.notes[0].target, "x");
    }

    #[test]
    fn test_field_number_and_year_values() {
        let form = parse(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"n\" kind=\"number\" label=\"N\" -->\n\n\
             ```value\n5000\n```\n\n\
             <!-- /field -->\n\n\
             <!-- field id=\"y\" kind=\"year\" label=\"Y\" -->\n\n\
             ```value\n2021\n```\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        assert_eq!(
            form.response("n").unwrap().value,
            Some(FieldValue::Number(5000.0))
        );
        assert_eq!(
            form.response("y").unwrap().value,
            Some(FieldValue::Year(2021))
        );
    }

    #[test]
    fn test_garbage_number_fails() {
        let err = parse_err(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"n\" kind=\"number\" label=\"N\" -->\n\n\
             ```value\nfive thousand\n```\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        assert!(matches!(err.kind, ParseErrorKind::InvalidValue { .. }));
    }

    #[test]
    fn test_prose_between_tags_is_preserved_semantically_ignored() {
        // Headings, bold labels, and free prose inside the region are not
        // form data and never cause errors.
        let form = parse(
            "<!-- form id=\"f\" title=\"T\" -->\n\n\
             # T\n\nSome intro.\n\n\
             <!-- group id=\"g\" title=\"G\" -->\n\n\
             ## G\n\n\
             <!-- field id=\"x\" kind=\"string\" label=\"X\" -->\n\n\
             **X**\n\n\
             <!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        assert_eq!(form.schema.groups.len(), 1);
        assert_eq!(form.schema.groups[0].fields.len(), 1);
    }

    #[test]
    fn test_error_positions_point_into_the_document() {
        let text = doc(
            "<!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" -->\n\n\
             <!-- field id=\"x\" kind=\"bogus\" label=\"X\" -->\n\n<!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        );
        let err = parse_form(&text).unwrap_err();
        // The field tag sits on line 9 of the assembled document.
        assert_eq!(err.pos.line, 9);
    }
}
