use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    engine::{ValidationReport, extract_variables, validate_template},
    errors::TextockError,
    models::template::{Template, TemplateDraft, TemplatePatch, VariableDefinition},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Idle,
    Editing,
    Validating,
    Invalid,
    Valid,
    Submitting,
}

impl Display for EditorState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            EditorState::Idle => write!(f, "idle"),
            EditorState::Editing => write!(f, "editing"),
            EditorState::Validating => write!(f, "validating"),
            EditorState::Invalid => write!(f, "invalid"),
            EditorState::Valid => write!(f, "valid"),
            EditorState::Submitting => write!(f, "submitting"),
        }
    }
}

/// Variables and validation for one version of the content.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentAnalysis {
    pub content: String,
    pub variables: Vec<VariableDefinition>,
    pub report: ValidationReport,
}

impl ContentAnalysis {
    pub fn of(content: &str) -> Self {
        Self {
            content: content.to_string(),
            variables: extract_variables(content),
            report: validate_template(content),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditTarget {
    Create,
    Existing {
        id: String,
        updated_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Create(TemplateDraft),
    Update { id: String, patch: TemplatePatch },
}

/// Create/edit form lifecycle.
///
/// `Idle -> Editing -> Validating -> Invalid | Valid -> Submitting -> Idle | Editing`,
/// with `cancel` returning to `Idle` from anywhere.
#[derive(Debug)]
pub struct TemplateEditor {
    state: EditorState,
    target: Option<EditTarget>,
    draft: TemplateDraft,
    analysis: Option<ContentAnalysis>,
    error: Option<String>,
}

impl Default for TemplateEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEditor {
    pub fn new() -> Self {
        Self {
            state: EditorState::Idle,
            target: None,
            draft: TemplateDraft::default(),
            analysis: None,
            error: None,
        }
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn target(&self) -> Option<&EditTarget> {
        self.target.as_ref()
    }

    pub fn draft(&self) -> &TemplateDraft {
        &self.draft
    }

    pub fn analysis(&self) -> Option<&ContentAnalysis> {
        self.analysis.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn detected_variables(&self) -> &[VariableDefinition] {
        self.analysis
            .as_ref()
            .map(|analysis| analysis.variables.as_slice())
            .unwrap_or_default()
    }

    pub fn open_create(&mut self) -> Result<(), TextockError> {
        self.require(&[EditorState::Idle], "open the editor")?;

        self.target = Some(EditTarget::Create);
        self.draft = TemplateDraft::default();
        self.analysis = None;
        self.error = None;
        self.transition(EditorState::Editing);
        Ok(())
    }

    pub fn open_edit(&mut self, template: &Template) -> Result<(), TextockError> {
        self.require(&[EditorState::Idle], "open the editor")?;

        self.target = Some(EditTarget::Existing {
            id: template.id.clone(),
            updated_at: template.updated_at,
        });
        self.draft = TemplateDraft::from_template(template);
        self.analysis = Some(ContentAnalysis::of(&template.content));
        self.error = None;
        self.transition(EditorState::Editing);
        Ok(())
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), TextockError> {
        self.require_open("edit the title")?;
        self.draft.title = title.into();
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), TextockError> {
        self.require_open("edit the description")?;
        self.draft.description = description.into();
        Ok(())
    }

    pub fn set_category(&mut self, category: impl Into<String>) -> Result<(), TextockError> {
        self.require_open("edit the category")?;
        self.draft.category = category.into();
        Ok(())
    }

    pub fn set_tags(&mut self, tags: impl Into<String>) -> Result<(), TextockError> {
        self.require_open("edit the tags")?;
        self.draft.tags = tags.into();
        Ok(())
    }

    pub fn set_markdown(&mut self, is_markdown: bool) -> Result<(), TextockError> {
        self.require_open("toggle markdown")?;
        self.draft.is_markdown = is_markdown;
        Ok(())
    }

    /// Content changes wait for a debounced analysis before submit unlocks.
    pub fn change_content(&mut self, content: impl Into<String>) -> Result<(), TextockError> {
        self.require_open("edit the content")?;
        self.draft.content = content.into();
        self.error = None;
        self.transition(EditorState::Validating);
        Ok(())
    }

    /// Returns false when the analysis is for content that has since changed.
    pub fn apply_analysis(&mut self, analysis: ContentAnalysis) -> bool {
        if self.state != EditorState::Validating || analysis.content != self.draft.content {
            debug!(state = %self.state, "Discarding outdated content analysis");
            return false;
        }

        let next = if analysis.report.is_valid {
            EditorState::Valid
        } else {
            EditorState::Invalid
        };
        self.analysis = Some(analysis);
        self.transition(next);
        true
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.state, EditorState::Valid | EditorState::Editing)
            && !self.draft.title.trim().is_empty()
            && self
                .current_analysis()
                .is_some_and(|analysis| analysis.report.is_valid)
    }

    pub fn begin_submit(&mut self) -> Result<Submission, TextockError> {
        match self.state {
            EditorState::Valid => {}
            EditorState::Editing => {
                if self.current_analysis().is_none() {
                    self.analysis = Some(ContentAnalysis::of(&self.draft.content));
                }
            }
            EditorState::Invalid => {
                let errors = self
                    .current_analysis()
                    .map(|analysis| analysis.report.errors.clone())
                    .unwrap_or_default();
                return Err(TextockError::InvalidContent(errors));
            }
            state => {
                return Err(TextockError::InvalidTransition {
                    action: "submit",
                    state,
                });
            }
        }

        if self.draft.title.trim().is_empty() {
            return Err(TextockError::TitleRequired);
        }
        if self.draft.content.trim().is_empty() {
            return Err(TextockError::ContentRequired);
        }
        if let Some(analysis) = self.current_analysis() {
            if !analysis.report.is_valid {
                return Err(TextockError::InvalidContent(analysis.report.errors.clone()));
            }
        }

        let submission = match &self.target {
            Some(EditTarget::Existing { id, updated_at }) => Submission::Update {
                id: id.clone(),
                patch: TemplatePatch::from_draft(&self.draft).if_unmodified_since(*updated_at),
            },
            _ => Submission::Create(self.draft.clone()),
        };

        self.error = None;
        self.transition(EditorState::Submitting);
        Ok(submission)
    }

    /// Success closes the editor; failure reopens it with the error shown.
    pub fn finish_submit<T>(&mut self, outcome: &Result<T, TextockError>) -> Result<(), TextockError> {
        self.require(&[EditorState::Submitting], "finish submitting")?;

        match outcome {
            Ok(_) => self.reset(),
            Err(err) => {
                self.error = Some(err.user_message());
                self.transition(EditorState::Editing);
            }
        }
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.reset();
    }

    fn current_analysis(&self) -> Option<&ContentAnalysis> {
        self.analysis
            .as_ref()
            .filter(|analysis| analysis.content == self.draft.content)
    }

    fn reset(&mut self) {
        self.target = None;
        self.draft = TemplateDraft::default();
        self.analysis = None;
        self.error = None;
        self.transition(EditorState::Idle);
    }

    fn transition(&mut self, next: EditorState) {
        debug!(from = %self.state, to = %next, "Editor state changed");
        self.state = next;
    }

    fn require_open(&self, action: &'static str) -> Result<(), TextockError> {
        self.require(
            &[
                EditorState::Editing,
                EditorState::Validating,
                EditorState::Invalid,
                EditorState::Valid,
            ],
            action,
        )
    }

    fn require(&self, allowed: &[EditorState], action: &'static str) -> Result<(), TextockError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(TextockError::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }
}
