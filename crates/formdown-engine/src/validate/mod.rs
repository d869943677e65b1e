pub mod external;
pub mod issue;
pub mod rules;

pub use external::{ExternalValidator, ValidatorContext, ValidatorRegistry, validate_with};
pub use issue::{Issue, IssueCode, IssueSource, Severity};
pub use rules::{checkbox_complete, validate};
