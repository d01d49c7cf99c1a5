use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::extract_variables;

pub const DEFAULT_CATEGORY: &str = "general";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    #[default]
    Text,
    Number,
    Select,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: VariableType,

    #[serde(default = "required_default")]
    pub required: bool,

    #[serde(rename = "defaultValue", skip_serializing_if = "Option::is_none", default)]
    pub default_value: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub options: Option<Vec<String>>,
}

fn required_default() -> bool {
    true
}

impl VariableDefinition {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VariableType::Text,
            required: true,
            default_value: None,
            options: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub title: String,
    pub content: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub variables: Vec<VariableDefinition>,

    #[serde(default)]
    pub is_public: bool,

    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(rename = "isMarkdown", default)]
    pub is_markdown: bool,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Raw form input as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDraft {
    pub title: String,
    pub content: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub category: String,

    /// Comma-separated.
    #[serde(default)]
    pub tags: String,

    #[serde(default)]
    pub is_markdown: bool,
}

impl TemplateDraft {
    pub fn from_template(template: &Template) -> Self {
        Self {
            title: template.title.clone(),
            content: template.content.clone(),
            description: template.description.clone(),
            category: template.category.clone(),
            tags: template.tags.join(", "),
            is_markdown: template.is_markdown,
        }
    }

    pub fn normalized_category(&self) -> String {
        match self.category.trim() {
            "" => DEFAULT_CATEGORY.to_string(),
            category => category.to_string(),
        }
    }

    pub fn parsed_tags(&self) -> Vec<String> {
        parse_tags(&self.tags)
    }
}

/// Splits on commas, trims, drops empties and keeps the first of duplicates.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();

    for tag in raw.split(',').map(str::trim).filter(|tag| !tag.is_empty()) {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }

    tags
}

/// Insert payload. `variables` is derived from `content` at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTemplate {
    title: String,
    content: String,
    description: String,
    category: String,
    tags: Vec<String>,
    variables: Vec<VariableDefinition>,
    is_public: bool,
    user_id: String,

    #[serde(rename = "isMarkdown")]
    is_markdown: bool,
}

impl NewTemplate {
    pub fn from_draft(draft: &TemplateDraft, user_id: &str) -> Self {
        let content = draft.content.trim().to_string();

        Self {
            title: draft.title.trim().to_string(),
            variables: extract_variables(&content),
            content,
            description: draft.description.trim().to_string(),
            category: draft.normalized_category(),
            tags: draft.parsed_tags(),
            is_public: false,
            user_id: user_id.to_string(),
            is_markdown: draft.is_markdown,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn variables(&self) -> &[VariableDefinition] {
        &self.variables
    }

    pub fn into_template(self, id: String, now: DateTime<Utc>) -> Template {
        Template {
            id,
            title: self.title,
            content: self.content,
            description: self.description,
            category: self.category,
            tags: self.tags,
            variables: self.variables,
            is_public: self.is_public,
            user_id: self.user_id,
            created_at: now,
            updated_at: now,
            is_markdown: self.is_markdown,
        }
    }
}

/// Partial update. Setting content recomputes `variables`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<Vec<VariableDefinition>>,

    #[serde(rename = "isMarkdown", skip_serializing_if = "Option::is_none")]
    is_markdown: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,

    #[serde(skip)]
    expected_updated_at: Option<DateTime<Utc>>,
}

impl TemplatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every form field, as submitted from an edit form.
    pub fn from_draft(draft: &TemplateDraft) -> Self {
        Self::new()
            .title(draft.title.trim())
            .content(draft.content.trim())
            .description(draft.description.trim())
            .category(draft.normalized_category())
            .tags(draft.parsed_tags())
            .markdown(draft.is_markdown)
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        let content = content.into();
        self.variables = Some(extract_variables(&content));
        self.content = Some(content);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        self.category = Some(match category.trim() {
            "" => DEFAULT_CATEGORY.to_string(),
            trimmed => trimmed.to_string(),
        });
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn markdown(mut self, is_markdown: bool) -> Self {
        self.is_markdown = Some(is_markdown);
        self
    }

    /// Only apply the update while the record still carries this version.
    pub fn if_unmodified_since(mut self, updated_at: DateTime<Utc>) -> Self {
        self.expected_updated_at = Some(updated_at);
        self
    }

    pub fn touched_at(mut self, now: DateTime<Utc>) -> Self {
        self.updated_at = Some(now);
        self
    }

    pub fn title_value(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn content_value(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn expected_updated_at(&self) -> Option<DateTime<Utc>> {
        self.expected_updated_at
    }

    pub fn apply_to(&self, template: &mut Template) {
        if let Some(title) = &self.title {
            template.title = title.clone();
        }
        if let Some(content) = &self.content {
            template.content = content.clone();
        }
        if let Some(variables) = &self.variables {
            template.variables = variables.clone();
        }
        if let Some(description) = &self.description {
            template.description = description.clone();
        }
        if let Some(category) = &self.category {
            template.category = category.clone();
        }
        if let Some(tags) = &self.tags {
            template.tags = tags.clone();
        }
        if let Some(is_markdown) = self.is_markdown {
            template.is_markdown = is_markdown;
        }
        if let Some(updated_at) = self.updated_at {
            template.updated_at = updated_at;
        }
    }
}
