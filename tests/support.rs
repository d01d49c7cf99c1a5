use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use chrono::{DateTime, Duration, Utc};
use textock::{
    clients::{RecordStore, SortDirection, SortKey, memory::MemoryStore},
    errors::BackendError,
    models::{
        template::{NewTemplate, Template, TemplateDraft, TemplatePatch},
        user::{Session, User},
    },
};

pub const OWNER_ID: &str = "user-1";

pub fn session() -> Session {
    Session::signed_in(
        User {
            id: OWNER_ID.to_string(),
            email: "owner@example.com".to_string(),
        },
        "access-token",
    )
}

pub fn draft(title: &str, content: &str) -> TemplateDraft {
    TemplateDraft {
        title: title.to_string(),
        content: content.to_string(),
        ..TemplateDraft::default()
    }
}

pub fn template(id: &str, content: &str, updated_at: DateTime<Utc>) -> Template {
    let mut template = NewTemplate::from_draft(&draft(&format!("Template {id}"), content), OWNER_ID)
        .into_template(id.to_string(), updated_at - Duration::minutes(5));
    template.updated_at = updated_at;
    template
}

pub fn templates(count: usize) -> Vec<Template> {
    let base = Utc::now() - Duration::days(1);
    (0..count)
        .map(|i| template(&format!("t{i}"), "Hello {{name}}", base + Duration::seconds(i as i64)))
        .collect()
}

/// Memory store that counts every call and can be told to fail the next one.
#[derive(Clone, Default)]
pub struct ProbeStore {
    pub inner: MemoryStore,
    calls: Arc<AtomicUsize>,
    failure: Arc<Mutex<Option<BackendError>>>,
}

impl ProbeStore {
    pub fn with_rows(rows: Vec<Template>) -> Self {
        Self {
            inner: MemoryStore::with_rows(rows),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self, error: BackendError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    fn record_call(&self) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl RecordStore for ProbeStore {
    async fn list(
        &self,
        owner_id: &str,
        sort_key: SortKey,
        direction: SortDirection,
    ) -> Result<Vec<Template>, BackendError> {
        self.record_call()?;
        self.inner.list(owner_id, sort_key, direction).await
    }

    async fn insert(&self, record: &NewTemplate) -> Result<Template, BackendError> {
        self.record_call()?;
        self.inner.insert(record).await
    }

    async fn update(
        &self,
        id: &str,
        patch: &TemplatePatch,
    ) -> Result<Option<Template>, BackendError> {
        self.record_call()?;
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &str) -> Result<(), BackendError> {
        self.record_call()?;
        self.inner.delete(id).await
    }
}
