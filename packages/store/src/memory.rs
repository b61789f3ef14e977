use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{BackendError, ErrorCode, Result};
use crate::models::{Document, Fields, Query, Session};
use crate::service::{CredentialService, DocumentStore, SessionCallback, SnapshotCallback};
use crate::subscription::{Callback, Listeners, Subscription};

/// A backend call recorded by [`MemoryBackend`].
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CreateAccount { email: String },
    SignIn { email: String },
    SignOut,
    SetDisplayName { name: String },
    DeleteAccount,
    Reload,
    Query { collection: String, field: String, value: Value },
    Get { collection: String, id: String },
    Create { collection: String, fields: Fields },
    Update { collection: String, id: String, fields: Fields },
}

/// Kind of a [`Call`], used to inject failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateAccount,
    SignIn,
    SignOut,
    SetDisplayName,
    DeleteAccount,
    Reload,
    Query,
    Get,
    Create,
    Update,
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Call::CreateAccount { .. } => Operation::CreateAccount,
            Call::SignIn { .. } => Operation::SignIn,
            Call::SignOut => Operation::SignOut,
            Call::SetDisplayName { .. } => Operation::SetDisplayName,
            Call::DeleteAccount => Operation::DeleteAccount,
            Call::Reload => Operation::Reload,
            Call::Query { .. } => Operation::Query,
            Call::Get { .. } => Operation::Get,
            Call::Create { .. } => Operation::Create,
            Call::Update { .. } => Operation::Update,
        }
    }

    /// Whether the call writes to the document store.
    pub fn is_write(&self) -> bool {
        matches!(self, Call::Create { .. } | Call::Update { .. })
    }
}

struct Account {
    password: String,
    session: Session,
    disabled: bool,
}

#[derive(Default)]
struct State {
    /// Keyed by lowercased email.
    accounts: BTreeMap<String, Account>,
    current: Option<String>,
    collections: BTreeMap<String, BTreeMap<String, Fields>>,
    journal: Vec<Call>,
    failures: HashMap<Operation, BackendError>,
}

impl State {
    /// Journal the call and consume a pending injected failure for it.
    fn record(&mut self, call: Call) -> Result<()> {
        let op = call.operation();
        self.journal.push(call);
        match self.failures.remove(&op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn current_account(&mut self) -> Result<&mut Account> {
        let key = self.current.clone().ok_or_else(BackendError::no_current_user)?;
        self.accounts
            .get_mut(&key)
            .ok_or_else(BackendError::no_current_user)
    }

    fn run_query(&self, query: &Query) -> Vec<Document> {
        self.collections
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| query.matches(fields))
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Query result for a subscriber; an injected `Query` failure is delivered
    /// instead of the documents.
    fn snapshot(&mut self, query: &Query) -> Result<Vec<Document>> {
        match self.failures.remove(&Operation::Query) {
            Some(err) => Err(err),
            None => Ok(self.run_query(query)),
        }
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn looks_like_email(email: &str) -> bool {
    email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'))
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// In-process credential service and document store.
///
/// Used by tests and for running the app without a configured Firebase
/// project. Every service call is journaled (see [`MemoryBackend::calls`]) and
/// failures can be injected per operation with [`MemoryBackend::fail_next`].
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
    sessions: Listeners<Option<Session>>,
    /// Emits the name of the collection that changed.
    changes: Listeners<String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account without signing it in.
    pub fn with_account(&self, email: &str, password: &str, display_name: Option<&str>) -> Session {
        let key = email.to_lowercase();
        let session = Session {
            uid: new_id(),
            email: key.clone(),
            display_name: display_name.map(str::to_string),
            email_verified: false,
            created_at: Some(Utc::now()),
            last_sign_in_at: None,
        };
        lock(&self.state).accounts.insert(
            key,
            Account {
                password: password.to_string(),
                session: session.clone(),
                disabled: false,
            },
        );
        session
    }

    pub fn disable_account(&self, email: &str) {
        if let Some(account) = lock(&self.state).accounts.get_mut(&email.to_lowercase()) {
            account.disabled = true;
        }
    }

    /// Seed a document without journaling it. Subscribers are notified.
    pub fn insert_document(&self, collection: &str, fields: Fields) -> String {
        let id = new_id();
        lock(&self.state)
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        self.changes.emit(collection.to_string());
        id
    }

    pub fn documents(&self, collection: &str) -> Vec<Document> {
        lock(&self.state)
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn account(&self, email: &str) -> Option<Session> {
        lock(&self.state)
            .accounts
            .get(&email.to_lowercase())
            .map(|account| account.session.clone())
    }

    /// Every service call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.state).journal.clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.state).journal.clear();
    }

    /// Make the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: Operation, error: BackendError) {
        lock(&self.state).failures.insert(operation, error);
    }

    pub fn session_listener_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn snapshot_listener_count(&self) -> usize {
        self.changes.len()
    }
}

#[async_trait]
impl CredentialService for MemoryBackend {
    async fn create_account(&self, email: &str, password: &str) -> Result<Session> {
        let session = {
            let mut state = lock(&self.state);
            state.record(Call::CreateAccount {
                email: email.to_string(),
            })?;
            if !looks_like_email(email) {
                return Err(BackendError::new(
                    ErrorCode::InvalidEmail,
                    "The email address is badly formatted.",
                ));
            }
            if password.len() < 6 {
                return Err(BackendError::new(
                    ErrorCode::WeakPassword,
                    "Password should be at least 6 characters",
                ));
            }
            let key = email.to_lowercase();
            if state.accounts.contains_key(&key) {
                return Err(BackendError::new(
                    ErrorCode::EmailAlreadyInUse,
                    "The email address is already in use by another account.",
                ));
            }
            let now = Utc::now();
            let session = Session {
                uid: new_id(),
                email: key.clone(),
                display_name: None,
                email_verified: false,
                created_at: Some(now),
                last_sign_in_at: Some(now),
            };
            state.accounts.insert(
                key.clone(),
                Account {
                    password: password.to_string(),
                    session: session.clone(),
                    disabled: false,
                },
            );
            state.current = Some(key);
            session
        };
        self.sessions.emit(Some(session.clone()));
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = {
            let mut state = lock(&self.state);
            state.record(Call::SignIn {
                email: email.to_string(),
            })?;
            let key = email.to_lowercase();
            let Some(account) = state.accounts.get_mut(&key) else {
                return Err(BackendError::new(
                    ErrorCode::UserNotFound,
                    "There is no user record corresponding to this identifier.",
                ));
            };
            if account.disabled {
                return Err(BackendError::new(
                    ErrorCode::UserDisabled,
                    "The user account has been disabled by an administrator.",
                ));
            }
            if account.password != password {
                return Err(BackendError::new(
                    ErrorCode::WrongPassword,
                    "The password is invalid or the user does not have a password.",
                ));
            }
            account.session.last_sign_in_at = Some(Utc::now());
            let session = account.session.clone();
            state.current = Some(key);
            session
        };
        self.sessions.emit(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        {
            let mut state = lock(&self.state);
            state.record(Call::SignOut)?;
            state.current = None;
        }
        self.sessions.emit(None);
        Ok(())
    }

    async fn set_display_name(&self, name: &str) -> Result<Session> {
        let mut state = lock(&self.state);
        state.record(Call::SetDisplayName {
            name: name.to_string(),
        })?;
        let account = state.current_account()?;
        account.session.display_name = Some(name.to_string());
        Ok(account.session.clone())
    }

    async fn delete_account(&self) -> Result<()> {
        {
            let mut state = lock(&self.state);
            state.record(Call::DeleteAccount)?;
            let key = state.current.take().ok_or_else(BackendError::no_current_user)?;
            state.accounts.remove(&key);
        }
        self.sessions.emit(None);
        Ok(())
    }

    async fn reload(&self) -> Result<Option<Session>> {
        let mut state = lock(&self.state);
        state.record(Call::Reload)?;
        Ok(state.current_account().ok().map(|account| account.session.clone()))
    }

    fn current_session(&self) -> Option<Session> {
        let state = lock(&self.state);
        state
            .current
            .as_ref()
            .and_then(|key| state.accounts.get(key))
            .map(|account| account.session.clone())
    }

    fn on_session_change(&self, callback: SessionCallback) -> Subscription {
        let callback: Callback<Option<Session>> = Arc::from(callback);
        callback(self.current_session());
        self.sessions.add(callback)
    }
}

#[async_trait]
impl DocumentStore for MemoryBackend {
    async fn query(&self, query: &Query) -> Result<Vec<Document>> {
        let mut state = lock(&self.state);
        state.record(Call::Query {
            collection: query.collection.clone(),
            field: query.field.clone(),
            value: query.value.clone(),
        })?;
        Ok(state.run_query(query))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let mut state = lock(&self.state);
        state.record(Call::Get {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;
        Ok(state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            }))
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<String> {
        let id = new_id();
        {
            let mut state = lock(&self.state);
            state.record(Call::Create {
                collection: collection.to_string(),
                fields: fields.clone(),
            })?;
            state
                .collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), fields);
        }
        self.changes.emit(collection.to_string());
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        {
            let mut state = lock(&self.state);
            state.record(Call::Update {
                collection: collection.to_string(),
                id: id.to_string(),
                fields: fields.clone(),
            })?;
            let Some(doc) = state
                .collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
            else {
                return Err(BackendError::new(
                    ErrorCode::NotFound,
                    format!("No document to update: {collection}/{id}"),
                ));
            };
            doc.extend(fields);
        }
        self.changes.emit(collection.to_string());
        Ok(())
    }

    fn subscribe(&self, query: Query, callback: SnapshotCallback) -> Subscription {
        let callback: Callback<Result<Vec<Document>>> = Arc::from(callback);
        let initial = lock(&self.state).snapshot(&query);
        callback(initial);

        let state = Arc::clone(&self.state);
        self.changes.add(Arc::new(move |collection: String| {
            if collection != query.collection {
                return;
            }
            let result = lock(&state).snapshot(&query);
            callback(result);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{fields, PROFILES_COLLECTION};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn profile(uid: &str, name: &str) -> Fields {
        let Value::Object(map) = json!({ "uid": uid, "nombre": name }) else {
            unreachable!()
        };
        map
    }

    #[tokio::test]
    async fn test_create_account_signs_in() {
        let backend = MemoryBackend::new();
        let session = backend.create_account("ana@x.com", "secret1").await.unwrap();

        assert_eq!(session.email, "ana@x.com");
        assert_eq!(backend.current_session(), Some(session));
    }

    #[tokio::test]
    async fn test_create_account_rejections() {
        let backend = MemoryBackend::new();
        backend.with_account("ana@x.com", "secret1", None);

        let err = backend.create_account("ana@x.com", "secret1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EmailAlreadyInUse);

        let err = backend.create_account("bob@x.com", "123").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::WeakPassword);

        let err = backend.create_account("not-an-email", "secret1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidEmail);
    }

    #[tokio::test]
    async fn test_sign_in_errors() {
        let backend = MemoryBackend::new();
        backend.with_account("ana@x.com", "secret1", Some("Ana"));

        let err = backend.sign_in("ana@x.com", "nope").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::WrongPassword);

        let err = backend.sign_in("who@x.com", "secret1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UserNotFound);

        backend.disable_account("ana@x.com");
        let err = backend.sign_in("ana@x.com", "secret1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UserDisabled);
        assert!(backend.current_session().is_none());
    }

    #[tokio::test]
    async fn test_session_listener_fires_immediately_and_on_change() {
        let backend = MemoryBackend::new();
        backend.with_account("ana@x.com", "secret1", None);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = Arc::clone(&seen);
        let sub = backend.on_session_change(Box::new(move |session| {
            s.lock().unwrap().push(session.map(|s| s.email));
        }));

        backend.sign_in("ana@x.com", "secret1").await.unwrap();
        backend.sign_out().await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("ana@x.com".to_string()), None]
        );

        drop(sub);
        assert_eq!(backend.session_listener_count(), 0);
    }

    #[tokio::test]
    async fn test_set_display_name_requires_session() {
        let backend = MemoryBackend::new();
        let err = backend.set_display_name("Ana").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NoCurrentUser);

        backend.create_account("ana@x.com", "secret1").await.unwrap();
        let session = backend.set_display_name("Ana").await.unwrap();
        assert_eq!(session.display_name.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn test_delete_account_removes_it() {
        let backend = MemoryBackend::new();
        backend.create_account("ana@x.com", "secret1").await.unwrap();
        backend.delete_account().await.unwrap();

        assert!(backend.current_session().is_none());
        assert!(backend.account("ana@x.com").is_none());
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let backend = MemoryBackend::new();
        let id = backend.insert_document(PROFILES_COLLECTION, profile("u1", "Ana"));

        let Value::Object(patch) = json!({ "especialidad": "Surgeon" }) else {
            unreachable!()
        };
        backend.update(PROFILES_COLLECTION, &id, patch).await.unwrap();

        let doc = backend.get(PROFILES_COLLECTION, &id).await.unwrap().unwrap();
        assert_eq!(doc.fields.get(fields::NAME), Some(&json!("Ana")));
        assert_eq!(doc.fields.get(fields::SPECIALTY), Some(&json!("Surgeon")));
    }

    #[tokio::test]
    async fn test_update_missing_document_is_not_found() {
        let backend = MemoryBackend::new();
        let err = backend
            .update(PROFILES_COLLECTION, "missing", Fields::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_query_filters_by_field() {
        let backend = MemoryBackend::new();
        backend.insert_document(PROFILES_COLLECTION, profile("u1", "Ana"));
        backend.insert_document(PROFILES_COLLECTION, profile("u2", "Bob"));

        let docs = backend
            .query(&Query::eq(PROFILES_COLLECTION, fields::UID, "u2"))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].fields.get(fields::NAME), Some(&json!("Bob")));
    }

    #[tokio::test]
    async fn test_subscribe_redelivers_after_writes() {
        let backend = MemoryBackend::new();
        let deliveries = Arc::new(AtomicUsize::new(0));
        let last_len = Arc::new(AtomicUsize::new(usize::MAX));

        let d = Arc::clone(&deliveries);
        let l = Arc::clone(&last_len);
        let sub = backend.subscribe(
            Query::eq(PROFILES_COLLECTION, fields::UID, "u1"),
            Box::new(move |result| {
                d.fetch_add(1, Ordering::SeqCst);
                l.store(result.unwrap().len(), Ordering::SeqCst);
            }),
        );
        assert_eq!(deliveries.load(Ordering::SeqCst), 1);
        assert_eq!(last_len.load(Ordering::SeqCst), 0);

        backend.create(PROFILES_COLLECTION, profile("u1", "Ana")).await.unwrap();
        assert_eq!(deliveries.load(Ordering::SeqCst), 2);
        assert_eq!(last_len.load(Ordering::SeqCst), 1);

        sub.unsubscribe();
        assert_eq!(backend.snapshot_listener_count(), 0);
        backend.create(PROFILES_COLLECTION, profile("u1", "Ana")).await.unwrap();
        assert_eq!(deliveries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed_once() {
        let backend = MemoryBackend::new();
        backend.fail_next(
            Operation::Create,
            BackendError::new(ErrorCode::PermissionDenied, "Missing or insufficient permissions."),
        );

        let err = backend.create(PROFILES_COLLECTION, Fields::new()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert!(backend.documents(PROFILES_COLLECTION).is_empty());

        backend.create(PROFILES_COLLECTION, Fields::new()).await.unwrap();
        assert_eq!(backend.documents(PROFILES_COLLECTION).len(), 1);
        assert_eq!(backend.calls().len(), 2);
    }
}
