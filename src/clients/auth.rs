use anyhow::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{
    clients::{AuthService, build_http_client, error_from_response, transport_error},
    config::Config,
    errors::BackendError,
    models::user::{Session, User},
};

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: User,
}

/// Sign-up answers with a full session when confirmation is disabled and
/// with the bare user record otherwise.
#[derive(Debug, Deserialize)]
struct SignUpResponse {
    access_token: Option<String>,
    user: Option<User>,
}

/// Client for the backend's auth API. Owns the session and publishes every
/// change to subscribers.
pub struct AuthClient {
    http_client: Client,
    auth_url: String,
    anon_key: String,
    session: watch::Sender<Session>,
}

impl AuthClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let http_client = build_http_client(config)?;
        let auth_url = format!("{}/auth/v1", config.base_url());

        info!(auth_url = %auth_url, "Auth client initialized");

        let (session, _) = watch::channel(Session::loading());

        Ok(Self {
            http_client,
            auth_url,
            anon_key: config.backend_anon_key.clone(),
            session,
        })
    }

    /// Resumes a session from a previously issued access token.
    pub fn with_access_token(self, access_token: impl Into<String>) -> Self {
        self.publish(Session::resuming(access_token));
        self
    }

    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    fn publish(&self, session: Session) {
        self.session.send_replace(session);
    }

    fn access_token(&self) -> Option<String> {
        self.session.borrow().access_token().map(str::to_string)
    }
}

impl AuthService for AuthClient {
    async fn current_user(&self) -> Result<Option<User>, BackendError> {
        let Some(token) = self.access_token() else {
            debug!("No access token, user is signed out");
            self.publish(Session::signed_out());
            return Ok(None);
        };

        let response = self
            .http_client
            .get(format!("{}/user", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => {
                let user: User = response
                    .json()
                    .await
                    .map_err(|e| BackendError::new(format!("Failed to parse user: {}", e)))?;

                debug!(user_id = %user.id, "Current user resolved");
                self.publish(Session::signed_in(user.clone(), token));
                Ok(Some(user))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!("Access token rejected, clearing session");
                self.publish(Session::signed_out());
                Ok(None)
            }
            _ => {
                let err = error_from_response(response).await;
                error!(error = %err, "Current user lookup failed");
                Err(err)
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, BackendError> {
        debug!(email, "Signing in");

        let response = self
            .http_client
            .post(format!("{}/token", self.auth_url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            warn!(email, error = %err, "Sign-in rejected");
            return Err(err);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| BackendError::new(format!("Failed to parse session: {}", e)))?;

        info!(user_id = %token.user.id, "User signed in");
        self.publish(Session::signed_in(token.user.clone(), token.access_token));

        Ok(token.user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<User>, BackendError> {
        debug!(email, "Signing up");

        let response = self
            .http_client
            .post(format!("{}/signup", self.auth_url))
            .header("apikey", &self.anon_key)
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            warn!(email, error = %err, "Sign-up rejected");
            return Err(err);
        }

        let body: SignUpResponse = response
            .json()
            .await
            .map_err(|e| BackendError::new(format!("Failed to parse sign-up response: {}", e)))?;

        match (body.access_token, body.user) {
            (Some(access_token), Some(user)) => {
                info!(user_id = %user.id, "User signed up and signed in");
                self.publish(Session::signed_in(user.clone(), access_token));
                Ok(Some(user))
            }
            _ => {
                info!(email, "User signed up, confirmation pending");
                Ok(None)
            }
        }
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        if let Some(token) = self.access_token() {
            let response = self
                .http_client
                .post(format!("{}/logout", self.auth_url))
                .header("apikey", &self.anon_key)
                .bearer_auth(&token)
                .send()
                .await;

            // The local session is dropped even when the server call fails.
            match response {
                Ok(response) if !response.status().is_success() => {
                    let err = error_from_response(response).await;
                    warn!(error = %err, "Server-side sign-out failed");
                }
                Err(e) => warn!(error = %e, "Sign-out request failed"),
                Ok(_) => {}
            }
        }

        info!("User signed out");
        self.publish(Session::signed_out());
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }
}
