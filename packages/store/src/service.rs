//! # Backend service traits
//!
//! The app talks to two collaborators:
//!
//! - [`CredentialService`]: account creation, sign-in/out, display name, and a
//!   push subscription to authentication state.
//! - [`DocumentStore`]: field-equality queries, single-document reads, create,
//!   partial update, and push subscriptions to query results.
//!
//! Both are object-safe (`async_trait`) so the UI can hold them as
//! `Arc<dyn …>` inside a [`Backend`] passed down through context instead of
//! reaching for process-wide handles.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::memory::MemoryBackend;
use crate::models::{Document, Fields, Query, Session};
use crate::subscription::Subscription;

/// Called with the new session (or `None` after sign-out).
pub type SessionCallback = Box<dyn Fn(Option<Session>) + Send + Sync>;

/// Called with the full result set of a subscribed query after each change.
pub type SnapshotCallback = Box<dyn Fn(Result<Vec<Document>>) + Send + Sync>;

#[async_trait]
pub trait CredentialService: Send + Sync {
    /// Create an account and sign it in.
    async fn create_account(&self, email: &str, password: &str) -> Result<Session>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    async fn sign_out(&self) -> Result<()>;

    /// Set the display name of the signed-in account.
    async fn set_display_name(&self, name: &str) -> Result<Session>;

    /// Delete the signed-in account and sign out.
    async fn delete_account(&self) -> Result<()>;

    /// Re-read the signed-in account from the backend.
    async fn reload(&self) -> Result<Option<Session>>;

    fn current_session(&self) -> Option<Session>;

    /// Register for authentication-state changes.
    ///
    /// The callback fires once immediately with the current state, then after
    /// every sign-in, sign-out or account deletion.
    fn on_session_change(&self, callback: SessionCallback) -> Subscription;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// One-shot read of every document matching `query`.
    async fn query(&self, query: &Query) -> Result<Vec<Document>>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Create a document with a generated id and return that id.
    async fn create(&self, collection: &str, fields: Fields) -> Result<String>;

    /// Merge `fields` into an existing document. Fails with `not-found` when
    /// the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    /// Push the result set of `query` now and after every change to it.
    fn subscribe(&self, query: Query, callback: SnapshotCallback) -> Subscription;
}

/// The service instances the app is wired to.
#[derive(Clone)]
pub struct Backend {
    pub auth: Arc<dyn CredentialService>,
    pub documents: Arc<dyn DocumentStore>,
}

impl Backend {
    pub fn new(auth: Arc<dyn CredentialService>, documents: Arc<dyn DocumentStore>) -> Self {
        Self { auth, documents }
    }

    /// Both services backed by one shared in-process [`MemoryBackend`].
    pub fn memory(backend: MemoryBackend) -> Self {
        Self::new(Arc::new(backend.clone()), Arc::new(backend))
    }

    /// Wire the Firebase REST backend when credentials are configured, else
    /// fall back to an empty in-memory backend.
    #[cfg(feature = "firebase")]
    pub fn from_config(config: &crate::AppConfig) -> Self {
        if config.firebase.is_configured() {
            tracing::info!(project = %config.firebase.project_id, "Using Firebase backend");
            let firebase = crate::FirebaseBackend::new(config.firebase.clone(), config.sync.poll_interval());
            Self::new(Arc::new(firebase.clone()), Arc::new(firebase))
        } else {
            tracing::warn!("Firebase is not configured, using in-memory backend");
            Self::memory(MemoryBackend::new())
        }
    }
}
