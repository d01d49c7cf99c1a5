use anyhow::{Error, Result};
use chrono::SecondsFormat;
use reqwest::{Client, RequestBuilder};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    clients::{
        RecordStore, SortDirection, SortKey, build_http_client, error_from_response,
        transport_error,
    },
    config::Config,
    errors::BackendError,
    models::{
        template::{NewTemplate, Template, TemplatePatch},
        user::Session,
    },
};

/// Record store backed by the backend's REST table API.
#[derive(Clone)]
pub struct RecordStoreClient {
    http_client: Client,
    table_url: String,
    anon_key: String,
    session: watch::Receiver<Session>,
}

impl RecordStoreClient {
    pub fn new(config: &Config, session: watch::Receiver<Session>) -> Result<Self, Error> {
        let http_client = build_http_client(config)?;
        let table_url = format!("{}/rest/v1/{}", config.base_url(), config.templates_table);

        info!(table_url = %table_url, "Record store client initialized");

        Ok(Self {
            http_client,
            table_url,
            anon_key: config.backend_anon_key.clone(),
            session,
        })
    }

    /// Requests run as the signed-in user, or as the anonymous role otherwise.
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .session
            .borrow()
            .access_token()
            .map(str::to_string)
            .unwrap_or_else(|| self.anon_key.clone());

        request
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    async fn send_for_rows(&self, request: RequestBuilder) -> Result<Vec<Template>, BackendError> {
        let response = self.authorized(request).send().await.map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        response
            .json::<Vec<Template>>()
            .await
            .map_err(|e| BackendError::new(format!("Failed to parse template rows: {}", e)))
    }
}

impl RecordStore for RecordStoreClient {
    async fn list(
        &self,
        owner_id: &str,
        sort_key: SortKey,
        direction: SortDirection,
    ) -> Result<Vec<Template>, BackendError> {
        debug!(owner_id, sort_key = sort_key.column(), "Listing templates");

        let order = format!("{}.{}", sort_key.column(), direction.as_str());
        let owner = format!("eq.{}", owner_id);

        let request = self.http_client.get(&self.table_url).query(&[
            ("select", "*"),
            ("user_id", owner.as_str()),
            ("order", order.as_str()),
        ]);

        let templates = self.send_for_rows(request).await?;

        debug!(owner_id, count = templates.len(), "Templates listed");
        Ok(templates)
    }

    async fn insert(&self, record: &NewTemplate) -> Result<Template, BackendError> {
        debug!(title = record.title(), "Inserting template");

        let request = self
            .http_client
            .post(&self.table_url)
            .header("Prefer", "return=representation")
            .json(record);

        self.send_for_rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::new("Insert returned no rows"))
    }

    async fn update(
        &self,
        id: &str,
        patch: &TemplatePatch,
    ) -> Result<Option<Template>, BackendError> {
        debug!(template_id = id, "Updating template");

        let mut filters = vec![("id", format!("eq.{}", id))];
        if let Some(expected) = patch.expected_updated_at() {
            filters.push((
                "updated_at",
                format!("eq.{}", expected.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            ));
        }

        let request = self
            .http_client
            .patch(&self.table_url)
            .query(&filters)
            .header("Prefer", "return=representation")
            .json(patch);

        let updated = self.send_for_rows(request).await?.into_iter().next();

        if updated.is_none() {
            warn!(template_id = id, "Update matched no rows");
        }

        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<(), BackendError> {
        debug!(template_id = id, "Deleting template");

        let filter = format!("eq.{}", id);
        let request = self
            .http_client
            .delete(&self.table_url)
            .query(&[("id", filter.as_str())]);

        let response = self.authorized(request).send().await.map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(())
    }
}
