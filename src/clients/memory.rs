use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::{
    clients::{RecordStore, SortDirection, SortKey},
    errors::BackendError,
    models::template::{NewTemplate, Template, TemplatePatch},
};

/// Process-local record store. Clones share the same rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rows: Arc<Mutex<Vec<Template>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Template>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &str) -> Option<Template> {
        self.lock()
            .ok()
            .and_then(|rows| rows.iter().find(|row| row.id == id).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Template>>, BackendError> {
        self.rows
            .lock()
            .map_err(|_| BackendError::new("Memory store lock poisoned").with_code("poisoned"))
    }
}

impl RecordStore for MemoryStore {
    async fn list(
        &self,
        owner_id: &str,
        sort_key: SortKey,
        direction: SortDirection,
    ) -> Result<Vec<Template>, BackendError> {
        let mut owned: Vec<Template> = self
            .lock()?
            .iter()
            .filter(|row| row.user_id == owner_id)
            .cloned()
            .collect();

        owned.sort_by_key(|row| match sort_key {
            SortKey::CreatedAt => row.created_at,
            SortKey::UpdatedAt => row.updated_at,
        });
        if direction == SortDirection::Descending {
            owned.reverse();
        }

        Ok(owned)
    }

    async fn insert(&self, record: &NewTemplate) -> Result<Template, BackendError> {
        let template = record
            .clone()
            .into_template(Uuid::new_v4().to_string(), Utc::now());

        debug!(template_id = %template.id, "Template stored in memory");
        self.lock()?.push(template.clone());
        Ok(template)
    }

    async fn update(
        &self,
        id: &str,
        patch: &TemplatePatch,
    ) -> Result<Option<Template>, BackendError> {
        let mut rows = self.lock()?;

        let Some(row) = rows.iter_mut().find(|row| row.id == id) else {
            return Ok(None);
        };

        if patch
            .expected_updated_at()
            .is_some_and(|expected| expected != row.updated_at)
        {
            return Ok(None);
        }

        patch.apply_to(row);
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: &str) -> Result<(), BackendError> {
        self.lock()?.retain(|row| row.id != id);
        Ok(())
    }
}
