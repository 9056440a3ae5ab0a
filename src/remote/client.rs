//! Remote backend client
//!
//! Thin REST client for the backend's auth API. Holds the signed-in session
//! in memory and mirrors it to disk.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::RwLock;

use crate::remote::AuthError;
use crate::storage::session::{clear_auth_session, load_auth_session, save_auth_session};
use crate::types::config::{ConfigurationError, RemoteConfig};
use crate::types::session::{AuthSession, AuthUser, Session};

#[derive(Deserialize, Debug)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<UserResponse> for AuthUser {
    fn from(user: UserResponse) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: UserResponse,
}

/// Sign-up returns a token pair when email confirmation is off, and the bare
/// user otherwise.
#[derive(Deserialize, Debug)]
struct SignUpResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<UserResponse>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct BackendError {
    error: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Result of a sign-up request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    SignedIn(Session),
    /// The account exists but must be confirmed before it can sign in
    ConfirmationRequired(AuthUser),
}

pub struct RemoteClient {
    config: RemoteConfig,
    http: reqwest::Client,
    session_path: Option<PathBuf>,
    session: RwLock<Option<AuthSession>>,
}

impl RemoteClient {
    /// Build a client. Performs no network I/O.
    ///
    /// `session_path` is where the signed-in session is persisted; `None`
    /// keeps it in memory only.
    pub fn new(
        config: RemoteConfig,
        session_path: Option<PathBuf>,
    ) -> Result<Self, ConfigurationError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ConfigurationError::Invalid {
                key: "http client",
                reason: e.to_string(),
            })?;

        let stored = match &session_path {
            Some(path) => load_auth_session(path).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable auth session: {}", e);
                None
            }),
            None => None,
        };

        Ok(Self {
            config,
            http,
            session_path,
            session: RwLock::new(stored),
        })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// The locally held session, without asking the backend
    pub async fn stored_session(&self) -> Option<AuthSession> {
        self.session.read().await.clone()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.url, path)
    }

    /// Ask the backend who the current session belongs to.
    ///
    /// Every call is a fresh request. `Ok(None)` means there is no active
    /// session: nothing is stored, or the backend rejected the stored token.
    pub async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let stored = self.stored_session().await;
        let bearer = stored
            .as_ref()
            .map(|s| s.access_token.as_str())
            .unwrap_or(&self.config.anon_key);

        let response = self
            .http
            .get(self.endpoint("/auth/v1/user"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            if let Some(rejected) = stored {
                tracing::info!("Stored session was rejected by the backend ({})", status);
                self.drop_session(&rejected.access_token).await?;
            }
            return Ok(None);
        }
        if !status.is_success() {
            return Err(backend_error(response, "Session lookup failed").await);
        }

        let Some(stored) = stored else {
            return Ok(None);
        };

        let text = response.text().await?;
        let user: UserResponse =
            serde_json::from_str(&text).map_err(|e| AuthError::Decode(e.to_string()))?;

        Ok(Some(Session {
            access_token: stored.access_token,
            user: user.into(),
        }))
    }

    /// Sign in with email and password
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let response = self
            .http
            .post(self.endpoint("/auth/v1/token?grant_type=password"))
            .header("apikey", &self.config.anon_key)
            .json(&Credentials { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response, "Login failed").await);
        }

        let text = response.text().await?;
        let token: TokenResponse =
            serde_json::from_str(&text).map_err(|e| AuthError::Decode(e.to_string()))?;

        let session = AuthSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            user: token.user.into(),
        };
        self.store_session(session.clone()).await?;

        tracing::info!("Signed in as {}", session.user.id);
        Ok(Session {
            access_token: session.access_token,
            user: session.user,
        })
    }

    /// Register a new account
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let response = self
            .http
            .post(self.endpoint("/auth/v1/signup"))
            .header("apikey", &self.config.anon_key)
            .json(&Credentials { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response, "Registration failed").await);
        }

        let text = response.text().await?;
        let body: SignUpResponse =
            serde_json::from_str(&text).map_err(|e| AuthError::Decode(e.to_string()))?;

        let user = match (body.user, body.id) {
            (Some(user), _) => AuthUser::from(user),
            (None, Some(id)) => AuthUser {
                id,
                email: body.email,
            },
            (None, None) => return Err(AuthError::Decode("sign-up response has no user".into())),
        };

        match body.access_token {
            Some(access_token) => {
                let session = AuthSession {
                    access_token,
                    refresh_token: body.refresh_token,
                    user,
                };
                self.store_session(session.clone()).await?;
                Ok(SignUpOutcome::SignedIn(Session {
                    access_token: session.access_token,
                    user: session.user,
                }))
            }
            None => Ok(SignUpOutcome::ConfirmationRequired(user)),
        }
    }

    /// Sign out. The local session is always dropped; revoking it on the
    /// backend is best-effort.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let stored = self.session.write().await.take();

        if let Some(session) = stored {
            let result = self
                .http
                .post(self.endpoint("/auth/v1/logout"))
                .header("apikey", &self.config.anon_key)
                .bearer_auth(&session.access_token)
                .send()
                .await;

            match result {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!("Backend logout returned {}", response.status());
                }
                Err(e) => tracing::warn!("Backend logout failed: {}", e),
                Ok(_) => {}
            }
        }

        if let Some(path) = &self.session_path {
            clear_auth_session(path).await?;
        }
        Ok(())
    }

    /// Forget the session holding `access_token`, unless a newer one has
    /// replaced it in the meantime
    async fn drop_session(&self, access_token: &str) -> Result<(), AuthError> {
        let mut current = self.session.write().await;
        if current.as_ref().map(|s| s.access_token.as_str()) != Some(access_token) {
            return Ok(());
        }
        *current = None;

        if let Some(path) = &self.session_path {
            clear_auth_session(path).await?;
        }
        Ok(())
    }

    async fn store_session(&self, session: AuthSession) -> Result<(), AuthError> {
        if let Some(path) = &self.session_path {
            save_auth_session(path, &session).await?;
        }
        *self.session.write().await = Some(session);
        Ok(())
    }
}

async fn backend_error(response: reqwest::Response, fallback: &str) -> AuthError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let err: BackendError = serde_json::from_str(&body).unwrap_or_default();

    AuthError::Backend {
        status,
        message: err
            .error_description
            .or(err.msg)
            .or(err.message)
            .or(err.error)
            .unwrap_or_else(|| fallback.to_string()),
    }
}
