use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::{
    engine::{replace_variables, unresolved_variables},
    models::template::Template,
};

/// Converts Markdown to a safe HTML fragment. Only used for previews.
pub trait MarkdownRenderer {
    fn to_html(&self, markdown: &str) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateUsage {
    pub template_id: String,
    pub values: HashMap<String, String>,
    pub result: String,
    pub unresolved: Vec<String>,
}

impl TemplateUsage {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Fills a template with the values entered so far.
pub fn use_template(template: &Template, values: HashMap<String, String>) -> TemplateUsage {
    let result = replace_variables(&template.content, &values);
    let unresolved = unresolved_variables(&template.content, &values)
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    debug!(
        template_id = %template.id,
        provided = values.len(),
        unresolved = unresolved.len(),
        "Template rendered for use"
    );

    TemplateUsage {
        template_id: template.id.clone(),
        values,
        result,
        unresolved,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Html(String),
    Text(String),
}

/// Markdown templates are previewed as HTML, the rest as plain text.
pub fn preview<R: MarkdownRenderer>(template: &Template, usage: &TemplateUsage, renderer: &R) -> Preview {
    if template.is_markdown {
        Preview::Html(renderer.to_html(&usage.result))
    } else {
        Preview::Text(usage.result.clone())
    }
}
