use serde::Serialize;
use thiserror::Error;

use crate::engine::grammar::placeholders;

pub const MIN_CONTENT_LENGTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentIssue {
    #[error("Template content is required")]
    Required,

    #[error("Template content must be at least {} characters", MIN_CONTENT_LENGTH)]
    TooShort,

    #[error("Template contains an empty variable. Write variables as {{{{name}}}}")]
    EmptyVariable,

    #[error("Variables need double braces, e.g. {{{{name}}}}. Invalid: {}", .0.join(", "))]
    SingleBraces(Vec<String>),

    #[error("Braces are incomplete. Write variables as {{{{name}}}}. Invalid: {}", .0.join(", "))]
    IncompleteBraces(Vec<String>),

    #[error("Invalid brace usage: {}", .0.join(", "))]
    InvalidBraces(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ContentIssue>,
}

impl ValidationReport {
    fn from_issues(errors: Vec<ContentIssue>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl From<&ValidationReport> for ValidationSummary {
    fn from(report: &ValidationReport) -> Self {
        Self {
            is_valid: report.is_valid,
            errors: report.messages(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FragmentKind {
    SingleBrace,
    Incomplete,
    Other,
}

pub fn validate_template(content: &str) -> ValidationReport {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return ValidationReport::from_issues(vec![ContentIssue::Required]);
    }

    let mut errors = Vec::new();

    // Length in UTF-16 code units, matching how browsers count form input.
    if trimmed.encode_utf16().count() < MIN_CONTENT_LENGTH {
        errors.push(ContentIssue::TooShort);
    }

    let mut fragments = Vec::new();
    let mut has_empty_variable = false;
    let mut cursor = 0;

    for placeholder in placeholders(content) {
        if placeholder.name().is_empty() {
            has_empty_variable = true;
        }
        collect_fragments(&content[cursor..placeholder.start], &mut fragments);
        cursor = placeholder.end;
    }
    collect_fragments(&content[cursor..], &mut fragments);

    if has_empty_variable {
        errors.push(ContentIssue::EmptyVariable);
    }

    let of_kind = |kind: FragmentKind| -> Vec<String> {
        fragments
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, text)| text.to_string())
            .collect()
    };

    let single = of_kind(FragmentKind::SingleBrace);
    if !single.is_empty() {
        errors.push(ContentIssue::SingleBraces(single));
    }

    let incomplete = of_kind(FragmentKind::Incomplete);
    if !incomplete.is_empty() {
        errors.push(ContentIssue::IncompleteBraces(incomplete));
    }

    let other = of_kind(FragmentKind::Other);
    if !other.is_empty() {
        errors.push(ContentIssue::InvalidBraces(other));
    }

    ValidationReport::from_issues(errors)
}

/// Collects brace fragments from a segment that holds no well-formed
/// placeholder. A `{` closes at the first `}` on the same line; without one it
/// runs to the end of the line.
fn collect_fragments<'a>(segment: &'a str, out: &mut Vec<(FragmentKind, &'a str)>) {
    let bytes = segment.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                let rest = &bytes[i + 1..];
                let stop = rest.iter().position(|&b| b == b'}' || b == b'\n');

                match stop {
                    Some(offset) if rest[offset] == b'}' => {
                        let mut end = i + 1 + offset + 1;
                        // `{{}}` is one fragment, not `{{}` and a stray `}`.
                        if rest[0] == b'{' && bytes.get(end) == Some(&b'}') {
                            end += 1;
                        }
                        let fragment = &segment[i..end];
                        out.push((classify_closed(fragment), fragment));
                        i = end;
                    }
                    _ => {
                        let end = stop.map_or(bytes.len(), |offset| i + 1 + offset);
                        let fragment = segment[i..end].trim_end();
                        out.push((FragmentKind::Incomplete, fragment));
                        i = end;
                    }
                }
            }
            b'}' => {
                out.push((FragmentKind::Incomplete, &segment[i..i + 1]));
                i += 1;
            }
            _ => i += 1,
        }
    }
}

fn classify_closed(fragment: &str) -> FragmentKind {
    let inner = &fragment[1..fragment.len() - 1];
    if !inner.is_empty() && !inner.starts_with('{') {
        FragmentKind::SingleBrace
    } else {
        FragmentKind::Other
    }
}
