use serde::Deserialize;
use thiserror::Error;

use crate::{editor::EditorState, engine::ContentIssue};

pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Failure reported by the record store or the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
    pub code: Option<String>,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Error bodies differ between the table API and the auth API; take
/// whichever fields are present.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct BackendErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    code: Option<serde_json::Value>,
    error_code: Option<String>,
}

impl BackendErrorBody {
    pub(crate) fn into_error(self, status: reqwest::StatusCode) -> BackendError {
        let message = self
            .message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error.clone())
            .unwrap_or_else(|| format!("Backend returned status {}", status));

        let code = self
            .error_code
            .or_else(|| match self.code {
                Some(serde_json::Value::String(code)) => Some(code),
                Some(serde_json::Value::Number(code)) => Some(code.to_string()),
                _ => None,
            })
            .or(self.error)
            .unwrap_or_else(|| status.as_u16().to_string());

        BackendError::new(message).with_code(code)
    }
}

#[derive(Debug, Error)]
pub enum TextockError {
    #[error("Title is required")]
    TitleRequired,

    #[error("Content is required")]
    ContentRequired,

    #[error("Template content is invalid: {}", join_issues(.0))]
    InvalidContent(Vec<ContentIssue>),

    #[error("Template limit reached ({limit} templates). Delete a template to create a new one")]
    QuotaExceeded { limit: u32 },

    #[error("User is not authenticated")]
    Unauthenticated,

    #[error("Cannot {action} while the editor is {state}")]
    InvalidTransition {
        action: &'static str,
        state: EditorState,
    },

    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template {id} was changed since it was opened; reload it before saving")]
    StaleEdit { id: String },

    #[error("Backend request failed: {0}")]
    Backend(#[from] BackendError),
}

fn join_issues(issues: &[ContentIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl TextockError {
    /// Detected locally, before any backend call.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            TextockError::TitleRequired
                | TextockError::ContentRequired
                | TextockError::InvalidContent(_)
                | TextockError::QuotaExceeded { .. }
                | TextockError::Unauthenticated
                | TextockError::InvalidTransition { .. }
        )
    }

    /// Text to show the user. Backend details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            TextockError::Backend(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}
