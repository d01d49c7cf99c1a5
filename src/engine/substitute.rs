use std::collections::HashMap;

use crate::engine::{extract::variable_names, grammar::placeholders};

/// Replaces every placeholder whose trimmed name has a non-empty value.
/// Placeholders without a value are kept verbatim so the unfilled slots stay
/// visible in the output.
pub fn replace_variables(content: &str, values: &HashMap<String, String>) -> String {
    let mut rendered = String::with_capacity(content.len());
    let mut cursor = 0;

    for placeholder in placeholders(content) {
        rendered.push_str(&content[cursor..placeholder.start]);

        match values.get(placeholder.name()) {
            Some(value) if !value.is_empty() => rendered.push_str(value),
            _ => rendered.push_str(placeholder.token),
        }

        cursor = placeholder.end;
    }

    rendered.push_str(&content[cursor..]);
    rendered
}

/// Variable names that `replace_variables` would leave untouched.
pub fn unresolved_variables<'a>(content: &'a str, values: &HashMap<String, String>) -> Vec<&'a str> {
    variable_names(content)
        .into_iter()
        .filter(|name| values.get(*name).is_none_or(|value| value.is_empty()))
        .collect()
}
