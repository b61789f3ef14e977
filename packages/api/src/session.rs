//! Session state mirrored from the credential service.

use chrono::{DateTime, Utc};
use store::{CredentialService, Session, Subscription};

/// The signed-in identity as the app sees it.
///
/// Starts out loading; the first callback from the credential service (which
/// fires immediately on subscription) settles it.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    pub session: Option<Session>,
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            session: None,
            loading: true,
        }
    }
}

/// Flat view of the signed-in account for display.
#[derive(Clone, Debug, PartialEq)]
pub struct UserData {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub email_verified: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl From<&Session> for UserData {
    fn from(session: &Session) -> Self {
        Self {
            uid: session.uid.clone(),
            email: session.email.clone(),
            display_name: session.display_name.clone(),
            email_verified: session.email_verified,
            created_at: session.created_at,
            last_sign_in_at: session.last_sign_in_at,
        }
    }
}

impl SessionState {
    /// Record a state change pushed by the credential service.
    pub fn apply(&mut self, session: Option<Session>) {
        if self.loading {
            tracing::debug!(signed_in = session.is_some(), "Initial session state received");
        }
        self.session = session;
        self.loading = false;
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn uid(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.uid.as_str())
    }

    pub fn user_data(&self) -> Option<UserData> {
        self.session.as_ref().map(UserData::from)
    }
}

/// A live registration for session changes. Dropping it stops delivery.
#[derive(Debug)]
pub struct SessionWatch {
    subscription: Subscription,
}

impl SessionWatch {
    pub fn start(
        auth: &dyn CredentialService,
        on_change: impl Fn(Option<Session>) + Send + Sync + 'static,
    ) -> Self {
        Self {
            subscription: auth.on_session_change(Box::new(on_change)),
        }
    }

    pub fn stop(self) {
        self.subscription.unsubscribe();
    }
}

/// Sign out, reporting the backend message on failure.
pub async fn sign_out(auth: &dyn CredentialService) -> Result<(), String> {
    match auth.sign_out().await {
        Ok(()) => {
            tracing::info!("Signed out");
            Ok(())
        }
        Err(err) => {
            tracing::error!("Sign-out failed: {}", err);
            Err(err.message)
        }
    }
}

/// Re-read the signed-in account. Falls back to the cached session when the
/// backend cannot be reached.
pub async fn reload(auth: &dyn CredentialService) -> Option<Session> {
    match auth.reload().await {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!("Failed to reload user: {}", err);
            auth.current_session()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use store::{BackendError, ErrorCode, MemoryBackend, Operation};

    fn recorder() -> (Arc<Mutex<Vec<Option<String>>>>, impl Fn(Option<Session>) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |s: Option<Session>| {
            sink.lock().unwrap().push(s.map(|s| s.uid));
        })
    }

    #[test]
    fn test_state_starts_loading_and_settles() {
        let mut state = SessionState::default();
        assert!(state.loading);
        assert!(!state.is_authenticated());

        state.apply(Some(Session::new("u1", "ana@x.com")));
        assert!(!state.loading);
        assert_eq!(state.uid(), Some("u1"));
        assert_eq!(state.user_data().unwrap().email, "ana@x.com");

        state.apply(None);
        assert!(!state.loading);
        assert!(state.user_data().is_none());
    }

    #[tokio::test]
    async fn test_watch_fires_immediately_then_on_changes() {
        let backend = MemoryBackend::new();
        let account = backend.with_account("ana@x.com", "secret1", Some("Ana"));
        let (seen, on_change) = recorder();

        let watch = SessionWatch::start(&backend, on_change);
        backend.sign_in("ana@x.com", "secret1").await.unwrap();
        backend.sign_out().await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some(account.uid.clone()), None]
        );
        assert_eq!(backend.session_listener_count(), 1);
        drop(watch);
        assert_eq!(backend.session_listener_count(), 0);
    }

    #[tokio::test]
    async fn test_stopped_watch_receives_nothing() {
        let backend = MemoryBackend::new();
        backend.with_account("ana@x.com", "secret1", None);
        let (seen, on_change) = recorder();

        SessionWatch::start(&backend, on_change).stop();
        backend.sign_in("ana@x.com", "secret1").await.unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sign_out_failure_reports_message() {
        let backend = MemoryBackend::new();
        backend.fail_next(
            Operation::SignOut,
            BackendError::new(ErrorCode::NetworkRequestFailed, "offline"),
        );
        assert_eq!(sign_out(&backend).await, Err("offline".to_string()));
        assert_eq!(sign_out(&backend).await, Ok(()));
    }

    #[tokio::test]
    async fn test_reload_falls_back_to_cached_session() {
        let backend = MemoryBackend::new();
        backend.with_account("ana@x.com", "secret1", Some("Ana"));
        backend.sign_in("ana@x.com", "secret1").await.unwrap();

        backend.fail_next(Operation::Reload, BackendError::new(ErrorCode::NetworkRequestFailed, "offline"));
        let session = reload(&backend).await.unwrap();
        assert_eq!(session.display_name(), "Ana");
    }
}
