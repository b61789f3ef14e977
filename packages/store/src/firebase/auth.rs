//! Identity Toolkit implementation of [`CredentialService`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{decode, network_error, Credentials, FirebaseBackend, Service, IDENTITY_URL, SECURE_TOKEN_URL};
use crate::error::{BackendError, Result};
use crate::models::Session;
use crate::service::{CredentialService, SessionCallback};
use crate::subscription::{Callback, Subscription};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdTokenRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email_verified: bool,
    /// Milliseconds since the epoch, as a string.
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    last_login_at: Option<String>,
}

/// Secure Token responses use snake_case.
#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

fn millis_to_datetime(millis: Option<&str>) -> Option<DateTime<Utc>> {
    let millis = millis?.parse::<i64>().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

fn expires_at(expires_in: &str) -> DateTime<Utc> {
    let secs = expires_in.parse::<i64>().unwrap_or(3600);
    Utc::now() + chrono::Duration::seconds(secs)
}

impl AccountInfo {
    fn into_session(self) -> Session {
        Session {
            uid: self.local_id,
            email: self.email.unwrap_or_default(),
            display_name: self.display_name,
            email_verified: self.email_verified,
            created_at: millis_to_datetime(self.created_at.as_deref()),
            last_sign_in_at: millis_to_datetime(self.last_login_at.as_deref()),
        }
    }
}

impl FirebaseBackend {
    fn identity_url(&self, method: &str) -> String {
        format!("{IDENTITY_URL}/accounts:{method}?key={}", self.inner.config.api_key)
    }

    async fn identity<B: Serialize + Sync, T: DeserializeOwned>(&self, method: &str, body: &B) -> Result<T> {
        let response = self
            .inner
            .http
            .post(self.identity_url(method))
            .json(body)
            .send()
            .await
            .map_err(network_error)?;
        decode(response, Service::Identity).await
    }

    pub(super) async fn refresh(&self, current: &Credentials) -> Result<Credentials> {
        tracing::debug!(uid = %current.session.uid, "Refreshing ID token");
        let response = self
            .inner
            .http
            .post(format!("{SECURE_TOKEN_URL}?key={}", self.inner.config.api_key))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", current.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(network_error)?;
        let refreshed: RefreshResponse = decode(response, Service::Identity).await?;
        Ok(Credentials {
            id_token: refreshed.id_token,
            refresh_token: refreshed.refresh_token,
            expires_at: expires_at(&refreshed.expires_in),
            session: current.session.clone(),
        })
    }

    async fn lookup(&self, id_token: &str) -> Result<Option<Session>> {
        let response: LookupResponse = self
            .identity("lookup", &IdTokenRequest { id_token })
            .await?;
        Ok(response.users.into_iter().next().map(AccountInfo::into_session))
    }

    /// Store tokens from a sign-up or sign-in and announce the new session.
    async fn establish(&self, tokens: TokenResponse) -> Session {
        let session = match self.lookup(&tokens.id_token).await {
            Ok(Some(session)) => session,
            Ok(None) | Err(_) => Session {
                display_name: tokens.display_name.clone().filter(|n| !n.is_empty()),
                ..Session::new(tokens.local_id.clone(), tokens.email.clone().unwrap_or_default())
            },
        };
        self.set_credentials(Some(Credentials {
            id_token: tokens.id_token,
            refresh_token: tokens.refresh_token,
            expires_at: expires_at(&tokens.expires_in),
            session: session.clone(),
        }));
        session
    }

    fn update_session(&self, session: Session) {
        if let Some(credentials) = self.credentials().as_mut() {
            credentials.session = session;
        }
    }
}

#[async_trait]
impl CredentialService for FirebaseBackend {
    async fn create_account(&self, email: &str, password: &str) -> Result<Session> {
        let tokens: TokenResponse = self
            .identity(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        let session = self.establish(tokens).await;
        tracing::info!(uid = %session.uid, "Account created");
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let tokens: TokenResponse = self
            .identity(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        let session = self.establish(tokens).await;
        tracing::info!(uid = %session.uid, "Signed in");
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.set_credentials(None);
        Ok(())
    }

    async fn set_display_name(&self, name: &str) -> Result<Session> {
        let id_token = self.id_token().await?;
        let _: serde_json::Value = self
            .identity(
                "update",
                &UpdateRequest {
                    id_token: &id_token,
                    display_name: name,
                    return_secure_token: false,
                },
            )
            .await?;
        let mut session = self
            .current_session()
            .ok_or_else(BackendError::no_current_user)?;
        session.display_name = Some(name.to_string());
        self.update_session(session.clone());
        Ok(session)
    }

    async fn delete_account(&self) -> Result<()> {
        let id_token = self.id_token().await?;
        let _: serde_json::Value = self
            .identity("delete", &IdTokenRequest { id_token: &id_token })
            .await?;
        self.set_credentials(None);
        Ok(())
    }

    async fn reload(&self) -> Result<Option<Session>> {
        if self.current_session().is_none() {
            return Ok(None);
        }
        let id_token = self.id_token().await?;
        let session = self.lookup(&id_token).await?;
        if let Some(session) = &session {
            self.update_session(session.clone());
        }
        Ok(session)
    }

    fn current_session(&self) -> Option<Session> {
        self.credentials().as_ref().map(|c| c.session.clone())
    }

    fn on_session_change(&self, callback: SessionCallback) -> Subscription {
        let callback: Callback<Option<Session>> = Arc::from(callback);
        callback(self.current_session());
        self.inner.sessions.add(callback)
    }
}
