//! Externally supplied validators.
//!
//! The core only defines the calling contract and the merge order; how a
//! host loads validator code (compiled plugin, subprocess, model call) is
//! its own concern. Validators are injected as trait objects keyed by the
//! IDs that groups reference through their `validate` attribute.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::error::OptionsError;
use crate::model::{FieldResponse, FormSchema, ParsedForm};

use super::issue::{Issue, IssueCode, IssueSource, Severity};
use super::rules;

/// Everything an external validator gets to look at.
pub struct ValidatorContext<'a> {
    pub schema: &'a FormSchema,
    pub responses: &'a BTreeMap<String, FieldResponse>,
    /// The group whose `validate` attribute referenced this validator.
    pub target_id: &'a str,
    /// Free-form parameters supplied at registration time.
    pub params: &'a serde_json::Value,
}

/// A rule implemented outside the engine. Implementations may be slow
/// (network or model calls); the engine only requires that their issues
/// merge into the same stream after the built-in pass.
pub trait ExternalValidator {
    /// The ID groups use to reference this validator.
    fn id(&self) -> &str;

    /// Where this validator's issues are reported from. Model-backed
    /// validators should return [`IssueSource::ExternalModel`].
    fn source(&self) -> IssueSource {
        IssueSource::ExternalCode
    }

    fn run(&self, ctx: &ValidatorContext<'_>) -> Vec<Issue>;
}

struct Registration {
    validator: Box<dyn ExternalValidator>,
    params: serde_json::Value,
}

/// Validators keyed by ID.
#[derive(Default)]
pub struct ValidatorRegistry {
    entries: HashMap<String, Registration>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a validator with no parameters.
    pub fn register(&mut self, validator: Box<dyn ExternalValidator>) -> Result<(), OptionsError> {
        self.register_with_params(validator, serde_json::Value::Null)
    }

    pub fn register_with_params(
        &mut self,
        validator: Box<dyn ExternalValidator>,
        params: serde_json::Value,
    ) -> Result<(), OptionsError> {
        let id = validator.id().to_string();
        if self.entries.contains_key(&id) {
            return Err(OptionsError::DuplicateValidator(id));
        }
        self.entries.insert(id, Registration { validator, params });
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Run built-in rules, then every referenced external validator, merging
/// issues in the fixed order builtin → external-code → external-model.
pub fn validate_with(form: &ParsedForm, registry: &ValidatorRegistry) -> Vec<Issue> {
    let mut issues = rules::validate(form);
    let mut code_issues = Vec::new();
    let mut model_issues = Vec::new();

    for group in &form.schema.groups {
        for validator_id in &group.validator_refs {
            let Some(entry) = registry.entries.get(validator_id) else {
                issues.push(Issue::builtin(
                    Severity::Warning,
                    IssueCode::ValidatorMissing,
                    &group.id,
                    format!("validator `{validator_id}` is not registered"),
                ));
                continue;
            };
            let ctx = ValidatorContext {
                schema: &form.schema,
                responses: &form.responses,
                target_id: &group.id,
                params: &entry.params,
            };
            let produced = entry.validator.run(&ctx);
            match entry.validator.source() {
                IssueSource::ExternalModel => model_issues.extend(produced),
                _ => code_issues.extend(produced),
            }
        }
    }

    issues.extend(code_issues);
    issues.extend(model_issues);
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_form;

    struct BudgetCheck;

    impl ExternalValidator for BudgetCheck {
        fn id(&self) -> &str {
            "budget_check"
        }

        fn run(&self, ctx: &ValidatorContext<'_>) -> Vec<Issue> {
            vec![Issue {
                severity: Severity::Warning,
                code: IssueCode::External,
                target: ctx.target_id.to_string(),
                message: "budget looks off".to_string(),
                source: IssueSource::ExternalCode,
            }]
        }
    }

    fn fixture() -> crate::model::ParsedForm {
        parse_form(
            "---\nformdown: 1\n---\n\n\
             <!-- form id=\"f\" -->\n\n\
             <!-- group id=\"g\" validate=\"budget_check\" -->\n\n\
             <!-- field id=\"x\" kind=\"string\" label=\"X\" -->\n\n<!-- /field -->\n\n\
             <!-- /group -->\n\n\
             <!-- /form -->\n",
        )
        .unwrap()
    }

    #[test]
    fn test_external_issues_merge_after_builtin() {
        let form = fixture();
        let mut registry = ValidatorRegistry::new();
        registry.register(Box::new(BudgetCheck)).unwrap();

        let issues = validate_with(&form, &registry);
        let external_pos = issues
            .iter()
            .position(|i| i.source == IssueSource::ExternalCode)
            .unwrap();
        assert!(issues[..external_pos]
            .iter()
            .all(|i| i.source == IssueSource::Builtin));
        assert_eq!(issues[external_pos].target, "g");
    }

    #[test]
    fn test_missing_validator_surfaces_as_warning() {
        let form = fixture();
        let registry = ValidatorRegistry::new();
        let issues = validate_with(&form, &registry);
        assert!(issues
            .iter()
            .any(|i| i.code == IssueCode::ValidatorMissing && i.target == "g"));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = ValidatorRegistry::new();
        registry.register(Box::new(BudgetCheck)).unwrap();
        assert!(registry.register(Box::new(BudgetCheck)).is_err());
    }
}
