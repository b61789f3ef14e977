//! # Firebase REST backend
//!
//! [`FirebaseBackend`] implements both service traits over plain HTTPS:
//!
//! | Concern | Endpoint |
//! |---------|----------|
//! | Credentials | Identity Toolkit `accounts:signUp`, `accounts:signInWithPassword`, `accounts:update`, `accounts:delete`, `accounts:lookup` |
//! | Token refresh | Secure Token `token` with `grant_type=refresh_token` |
//! | Documents | Firestore `documents:runQuery`, `GET`/`POST`/`PATCH` on `documents/{collection}` |
//!
//! Session state (ID token, refresh token, mirrored [`Session`]) lives only in
//! memory. Firestore has no push channel over REST, so
//! [`DocumentStore::subscribe`](crate::DocumentStore::subscribe) polls the
//! query on the configured interval and delivers only when the result changes.

mod auth;
mod firestore;
mod value;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::FirebaseConfig;
use crate::error::{BackendError, ErrorCode, Result};
use crate::models::Session;
use crate::subscription::Listeners;

const IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/token";
const FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

/// Refresh the ID token this long before it expires.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Tokens for the signed-in account.
#[derive(Clone, Debug)]
struct Credentials {
    id_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
    session: Session,
}

impl Credentials {
    fn is_expired(&self) -> bool {
        Utc::now() + chrono::Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS) >= self.expires_at
    }
}

struct Inner {
    http: reqwest::Client,
    config: FirebaseConfig,
    poll_interval: Option<Duration>,
    credentials: Mutex<Option<Credentials>>,
    sessions: Listeners<Option<Session>>,
}

/// Credential service and document store backed by a Firebase project.
#[derive(Clone)]
pub struct FirebaseBackend {
    inner: Arc<Inner>,
}

/// Error envelope shared by Identity Toolkit and Firestore.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Which service produced an error; the two encode codes differently.
#[derive(Clone, Copy, Debug)]
enum Service {
    Identity,
    Firestore,
}

impl FirebaseBackend {
    pub fn new(config: FirebaseConfig, poll_interval: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Inner {
                http: reqwest::Client::new(),
                config,
                poll_interval,
                credentials: Mutex::new(None),
                sessions: Listeners::new(),
            }),
        }
    }

    fn credentials(&self) -> MutexGuard<'_, Option<Credentials>> {
        self.inner
            .credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the stored credentials and notify session listeners.
    fn set_credentials(&self, credentials: Option<Credentials>) {
        let session = credentials.as_ref().map(|c| c.session.clone());
        *self.credentials() = credentials;
        self.inner.sessions.emit(session);
    }

    /// A valid ID token for the signed-in account, refreshing it if needed.
    async fn id_token(&self) -> Result<String> {
        let current = self.credentials().clone();
        let Some(current) = current else {
            return Err(BackendError::no_current_user());
        };
        if !current.is_expired() {
            return Ok(current.id_token);
        }
        let refreshed = self.refresh(&current).await?;
        let mut stored = self.credentials();
        if store_refreshed(&mut stored, &current, refreshed) {
            return stored
                .as_ref()
                .map(|c| c.id_token.clone())
                .ok_or_else(BackendError::no_current_user);
        }
        // Signed out, or another account signed in, while refreshing.
        match stored.as_ref() {
            Some(other) if !other.is_expired() => Ok(other.id_token.clone()),
            _ => Err(BackendError::no_current_user()),
        }
    }
}

/// Swap refreshed tokens into `slot` if it still holds the account `stale`
/// was taken from. The stored session is kept as is.
fn store_refreshed(slot: &mut Option<Credentials>, stale: &Credentials, refreshed: Credentials) -> bool {
    match slot {
        Some(current) if current.refresh_token == stale.refresh_token => {
            current.id_token = refreshed.id_token;
            current.refresh_token = refreshed.refresh_token;
            current.expires_at = refreshed.expires_at;
            true
        }
        _ => false,
    }
}

fn network_error(err: reqwest::Error) -> BackendError {
    if err.is_decode() {
        BackendError::new(ErrorCode::Unknown("invalid-response".into()), err.to_string())
    } else {
        BackendError::new(ErrorCode::NetworkRequestFailed, err.to_string())
    }
}

/// Decode a successful body, or translate the error envelope.
async fn decode<T: DeserializeOwned>(response: reqwest::Response, service: Service) -> Result<T> {
    if response.status().is_success() {
        return response.json::<T>().await.map_err(network_error);
    }
    Err(error_from_response(response, service).await)
}

async fn error_from_response(response: reqwest::Response, service: Service) -> BackendError {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => return network_error(err),
    };
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => {
            let code = match service {
                Service::Identity => identity_code(&envelope.error.message),
                Service::Firestore => {
                    firestore_code(envelope.error.status.as_deref().unwrap_or_default())
                }
            };
            BackendError::new(code, envelope.error.message)
        }
        Err(_) => BackendError::new(
            ErrorCode::Unknown(format!("http-{}", status.as_u16())),
            body,
        ),
    }
}

/// Map an Identity Toolkit message (`"WEAK_PASSWORD : Password should be…"`)
/// to an error code.
fn identity_code(message: &str) -> ErrorCode {
    let token = message.split(" : ").next().unwrap_or(message).trim();
    match token {
        "EMAIL_EXISTS" => ErrorCode::EmailAlreadyInUse,
        "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => ErrorCode::UserNotFound,
        "INVALID_PASSWORD" => ErrorCode::WrongPassword,
        "INVALID_LOGIN_CREDENTIALS" => ErrorCode::InvalidCredential,
        "INVALID_EMAIL" | "MISSING_EMAIL" => ErrorCode::InvalidEmail,
        "WEAK_PASSWORD" | "MISSING_PASSWORD" => ErrorCode::WeakPassword,
        "USER_DISABLED" => ErrorCode::UserDisabled,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => ErrorCode::TooManyRequests,
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" => ErrorCode::NoCurrentUser,
        other => ErrorCode::Unknown(format!("auth/{}", other.to_lowercase().replace('_', "-"))),
    }
}

/// Map a Firestore RPC status (`"PERMISSION_DENIED"`) to an error code.
fn firestore_code(status: &str) -> ErrorCode {
    match status {
        "PERMISSION_DENIED" | "UNAUTHENTICATED" => ErrorCode::PermissionDenied,
        "UNAVAILABLE" => ErrorCode::Unavailable,
        "NOT_FOUND" => ErrorCode::NotFound,
        other => ErrorCode::Unknown(other.to_lowercase().replace('_', "-")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_codes() {
        assert_eq!(identity_code("EMAIL_EXISTS"), ErrorCode::EmailAlreadyInUse);
        assert_eq!(identity_code("INVALID_PASSWORD"), ErrorCode::WrongPassword);
        assert_eq!(
            identity_code("WEAK_PASSWORD : Password should be at least 6 characters"),
            ErrorCode::WeakPassword
        );
        assert_eq!(
            identity_code("TOO_MANY_ATTEMPTS_TRY_LATER : Access to this account has been temporarily disabled"),
            ErrorCode::TooManyRequests
        );
        assert_eq!(
            identity_code("OPERATION_NOT_ALLOWED"),
            ErrorCode::Unknown("auth/operation-not-allowed".into())
        );
    }

    #[test]
    fn test_firestore_codes() {
        assert_eq!(firestore_code("PERMISSION_DENIED"), ErrorCode::PermissionDenied);
        assert_eq!(firestore_code("UNAVAILABLE"), ErrorCode::Unavailable);
        assert_eq!(
            firestore_code("FAILED_PRECONDITION"),
            ErrorCode::Unknown("failed-precondition".into())
        );
    }

    #[test]
    fn test_fresh_credentials_are_not_expired() {
        let credentials = Credentials {
            id_token: "t".into(),
            refresh_token: "r".into(),
            expires_at: Utc::now() + chrono::Duration::seconds(3600),
            session: Session::new("u1", "ana@x.com"),
        };
        assert!(!credentials.is_expired());

        let stale = Credentials {
            expires_at: Utc::now() + chrono::Duration::seconds(30),
            ..credentials
        };
        assert!(stale.is_expired());
    }

    fn credentials(token: &str, refresh: &str, name: Option<&str>) -> Credentials {
        Credentials {
            id_token: token.into(),
            refresh_token: refresh.into(),
            expires_at: Utc::now() + chrono::Duration::seconds(3600),
            session: Session {
                display_name: name.map(str::to_string),
                ..Session::new("u1", "ana@x.com")
            },
        }
    }

    #[test]
    fn test_refresh_keeps_newer_session() {
        let stale = credentials("old", "r1", None);
        let mut slot = Some(credentials("old", "r1", Some("Ana")));

        assert!(store_refreshed(&mut slot, &stale, credentials("new", "r2", None)));
        let stored = slot.unwrap();
        assert_eq!(stored.id_token, "new");
        assert_eq!(stored.refresh_token, "r2");
        assert_eq!(stored.session.display_name.as_deref(), Some("Ana"));
    }

    #[test]
    fn test_refresh_after_sign_out_is_discarded() {
        let stale = credentials("old", "r1", None);
        let mut slot = None;

        assert!(!store_refreshed(&mut slot, &stale, credentials("new", "r2", None)));
        assert!(slot.is_none());
    }

    #[test]
    fn test_refresh_for_replaced_account_is_discarded() {
        let stale = credentials("old", "r1", None);
        let mut slot = Some(credentials("other", "r9", None));

        assert!(!store_refreshed(&mut slot, &stale, credentials("new", "r2", None)));
        assert_eq!(slot.unwrap().id_token, "other");
    }
}
