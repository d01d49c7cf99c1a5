pub mod extract;
pub mod grammar;
pub mod substitute;
pub mod validate;

pub use extract::{extract_variables, variable_names};
pub use substitute::{replace_variables, unresolved_variables};
pub use validate::{ContentIssue, ValidationReport, validate_template};
