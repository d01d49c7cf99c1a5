use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::{
    clients::{RecordStore, SortDirection, SortKey},
    editor::Submission,
    engine::validate_template,
    errors::TextockError,
    models::{
        quota::QuotaSnapshot,
        template::{NewTemplate, Template, TemplateDraft, TemplatePatch},
        user::Session,
    },
};

/// The signed-in user's templates, mirrored from the record store.
///
/// The local collection changes only after the store confirms a write, and
/// confirmed rows replace local ones by id.
pub struct TemplateWorkspace<S> {
    store: S,
    templates: Vec<Template>,
    loading: bool,
}

impl<S: RecordStore> TemplateWorkspace<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            templates: Vec::new(),
            loading: true,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|template| template.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn quota(&self) -> QuotaSnapshot {
        QuotaSnapshot::for_count(self.templates.len())
    }

    /// Reloads from the store, newest update first. On failure the current
    /// collection is kept.
    pub async fn refresh(&mut self, session: &Session) -> Result<(), TextockError> {
        let owner_id = session.user_id().ok_or(TextockError::Unauthenticated)?;

        let outcome = self
            .store
            .list(owner_id, SortKey::UpdatedAt, SortDirection::Descending)
            .await;
        self.loading = false;

        match outcome {
            Ok(templates) => {
                info!(owner_id, count = templates.len(), "Templates loaded");
                self.templates = templates;
                Ok(())
            }
            Err(e) => {
                error!(owner_id, error = %e, code = ?e.code, "Failed to load templates");
                Err(e.into())
            }
        }
    }

    pub async fn create(
        &mut self,
        session: &Session,
        draft: &TemplateDraft,
    ) -> Result<&Template, TextockError> {
        // The quota counts the owned templates, so they must be loaded first.
        if self.loading {
            debug!("Templates not loaded yet, refreshing before create");
            self.refresh(session).await?;
        }

        self.quota().ensure_can_create()?;

        if draft.title.trim().is_empty() {
            return Err(TextockError::TitleRequired);
        }
        if draft.content.trim().is_empty() {
            return Err(TextockError::ContentRequired);
        }

        let report = validate_template(&draft.content);
        if !report.is_valid {
            return Err(TextockError::InvalidContent(report.errors));
        }

        let owner_id = session.user_id().ok_or(TextockError::Unauthenticated)?;
        let record = NewTemplate::from_draft(draft, owner_id);

        let created = self.store.insert(&record).await.map_err(|e| {
            error!(owner_id, error = %e, code = ?e.code, "Failed to create template");
            TextockError::from(e)
        })?;

        info!(template_id = %created.id, variables = created.variables.len(), "Template created");

        self.templates.insert(0, created);
        Ok(&self.templates[0])
    }

    pub async fn update(
        &mut self,
        session: &Session,
        id: &str,
        patch: TemplatePatch,
    ) -> Result<&Template, TextockError> {
        if !session.is_authenticated() {
            return Err(TextockError::Unauthenticated);
        }

        if patch.title_value().is_some_and(|title| title.trim().is_empty()) {
            return Err(TextockError::TitleRequired);
        }
        if let Some(content) = patch.content_value() {
            if content.trim().is_empty() {
                return Err(TextockError::ContentRequired);
            }
            let report = validate_template(content);
            if !report.is_valid {
                return Err(TextockError::InvalidContent(report.errors));
            }
        }

        if let (Some(expected), Some(local)) = (patch.expected_updated_at(), self.get(id)) {
            if local.updated_at != expected {
                warn!(template_id = id, "Rejecting save against an outdated copy");
                return Err(TextockError::StaleEdit { id: id.to_string() });
            }
        }

        let guarded = patch.expected_updated_at().is_some();
        let patch = patch.touched_at(Utc::now());

        let updated = self.store.update(id, &patch).await.map_err(|e| {
            error!(template_id = id, error = %e, code = ?e.code, "Failed to update template");
            TextockError::from(e)
        })?;

        let Some(updated) = updated else {
            warn!(template_id = id, guarded, "Update matched no record");
            return Err(if guarded {
                TextockError::StaleEdit { id: id.to_string() }
            } else {
                TextockError::NotFound(id.to_string())
            });
        };

        info!(template_id = id, "Template updated");
        Ok(self.apply_confirmed(updated))
    }

    pub async fn delete(&mut self, session: &Session, id: &str) -> Result<(), TextockError> {
        if !session.is_authenticated() {
            return Err(TextockError::Unauthenticated);
        }

        self.store.delete(id).await.map_err(|e| {
            error!(template_id = id, error = %e, code = ?e.code, "Failed to delete template");
            TextockError::from(e)
        })?;

        self.templates.retain(|template| template.id != id);
        info!(template_id = id, "Template deleted");
        Ok(())
    }

    pub async fn submit(
        &mut self,
        session: &Session,
        submission: Submission,
    ) -> Result<&Template, TextockError> {
        match submission {
            Submission::Create(draft) => self.create(session, &draft).await,
            Submission::Update { id, patch } => self.update(session, &id, patch).await,
        }
    }

    /// Replaces the local copy by id unless the local copy is already newer.
    fn apply_confirmed(&mut self, confirmed: Template) -> &Template {
        match self
            .templates
            .iter()
            .position(|template| template.id == confirmed.id)
        {
            Some(index) => {
                if self.templates[index].updated_at <= confirmed.updated_at {
                    self.templates[index] = confirmed;
                } else {
                    warn!(template_id = %confirmed.id, "Ignoring response older than the local copy");
                }
                &self.templates[index]
            }
            None => {
                self.templates.insert(0, confirmed);
                &self.templates[0]
            }
        }
    }
}
