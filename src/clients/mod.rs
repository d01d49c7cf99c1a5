use std::future::Future;

use anyhow::{Error, Result, anyhow};
use reqwest::{Client, Response};
use tokio::sync::watch;

use crate::{
    config::Config,
    errors::{BackendError, BackendErrorBody},
    models::{
        template::{NewTemplate, Template, TemplatePatch},
        user::{Session, User},
    },
};

pub mod auth;
pub mod health;
pub mod memory;
pub mod records;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    UpdatedAt,
}

impl SortKey {
    pub fn column(&self) -> &'static str {
        match self {
            SortKey::CreatedAt => "created_at",
            SortKey::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

/// Table of template records owned by accounts.
pub trait RecordStore {
    fn list(
        &self,
        owner_id: &str,
        sort_key: SortKey,
        direction: SortDirection,
    ) -> impl Future<Output = Result<Vec<Template>, BackendError>> + Send;

    fn insert(
        &self,
        record: &NewTemplate,
    ) -> impl Future<Output = Result<Template, BackendError>> + Send;

    /// `Ok(None)` when no row matched the id (and version guard, if any).
    fn update(
        &self,
        id: &str,
        patch: &TemplatePatch,
    ) -> impl Future<Output = Result<Option<Template>, BackendError>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = Result<(), BackendError>> + Send;
}

pub trait AuthService {
    fn current_user(&self) -> impl Future<Output = Result<Option<User>, BackendError>> + Send;

    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<User, BackendError>> + Send;

    /// `Ok(None)` when the account still has to be confirmed before signing in.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Option<User>, BackendError>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn subscribe(&self) -> watch::Receiver<Session>;
}

pub(crate) fn build_http_client(config: &Config) -> Result<Client, Error> {
    Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(|_| anyhow!("Failed to create HTTP client"))
}

pub(crate) fn transport_error(error: reqwest::Error) -> BackendError {
    BackendError::new(format!("Request failed: {}", error)).with_code("transport")
}

pub(crate) async fn error_from_response(response: Response) -> BackendError {
    let status = response.status();

    match response.json::<BackendErrorBody>().await {
        Ok(body) => body.into_error(status),
        Err(_) => BackendErrorBody::default().into_error(status),
    }
}
