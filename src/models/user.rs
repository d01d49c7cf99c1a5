use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,

    #[serde(default)]
    pub email: String,
}

/// Session context handed to whatever needs the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: Option<User>,
    pub loading: bool,
    access_token: Option<String>,
}

impl Session {
    /// Initial state until the first user lookup resolves.
    pub fn loading() -> Self {
        Self {
            user: None,
            loading: true,
            access_token: None,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            user: None,
            loading: false,
            access_token: None,
        }
    }

    pub fn signed_in(user: User, access_token: impl Into<String>) -> Self {
        Self {
            user: Some(user),
            loading: false,
            access_token: Some(access_token.into()),
        }
    }

    /// A stored token whose user has not been looked up yet.
    pub fn resuming(access_token: impl Into<String>) -> Self {
        Self {
            user: None,
            loading: true,
            access_token: Some(access_token.into()),
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.id.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}
