use std::collections::HashSet;

use crate::{engine::grammar::placeholders, models::template::VariableDefinition};

/// Distinct variable names in order of first appearance.
pub fn variable_names(content: &str) -> Vec<&str> {
    let mut seen = HashSet::new();

    placeholders(content)
        .map(|placeholder| placeholder.name())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(*name))
        .collect()
}

pub fn extract_variables(content: &str) -> Vec<VariableDefinition> {
    variable_names(content)
        .into_iter()
        .map(VariableDefinition::text)
        .collect()
}
