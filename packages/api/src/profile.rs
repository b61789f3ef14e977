//! The signed-in user's profile record: fetch, placeholder and live updates.

use store::models::fields;
use store::{
    BackendError, Document, DocumentStore, ProfileRecord, Query, Session, Subscription,
    PROFILES_COLLECTION,
};

use crate::messages;

/// A profile as shown to the user, plus the id of the stored document it came
/// from. `doc_id` is `None` for a placeholder that has not been saved yet.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedProfile {
    pub record: ProfileRecord,
    pub doc_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProfileState {
    pub profile: Option<LoadedProfile>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for ProfileState {
    fn default() -> Self {
        Self {
            profile: None,
            loading: true,
            error: None,
        }
    }
}

pub fn profile_query(uid: &str) -> Query {
    Query::eq(PROFILES_COLLECTION, fields::UID, uid)
}

/// Unsaved profile built from the session when no record exists yet.
pub fn placeholder(session: &Session) -> ProfileRecord {
    ProfileRecord {
        uid: session.uid.clone(),
        name: session.display_name.clone().unwrap_or_default(),
        email: session.email.clone(),
        ..Default::default()
    }
}

/// Pick the profile out of a query result: the first matching document, or a
/// placeholder when there is none.
pub fn resolve(docs: Vec<Document>, session: &Session) -> LoadedProfile {
    let Some(doc) = docs.into_iter().next() else {
        return LoadedProfile {
            record: placeholder(session),
            doc_id: None,
        };
    };
    let record = ProfileRecord::from_fields(&doc.fields).unwrap_or_else(|err| {
        tracing::warn!(doc_id = %doc.id, "Malformed profile document: {}", err);
        placeholder(session)
    });
    LoadedProfile {
        record,
        doc_id: Some(doc.id),
    }
}

fn owned_by(doc: &Document, session: &Session) -> bool {
    doc.fields.get(fields::UID).and_then(|uid| uid.as_str()) == Some(session.uid.as_str())
}

/// Read the profile for `session`.
///
/// A known document id is read directly when that document belongs to the
/// session's user; otherwise the collection is queried by uid.
pub async fn fetch_profile(
    store: &dyn DocumentStore,
    session: &Session,
    known_id: Option<&str>,
) -> Result<LoadedProfile, BackendError> {
    if let Some(id) = known_id {
        match store.get(PROFILES_COLLECTION, id).await? {
            Some(doc) if owned_by(&doc, session) => return Ok(resolve(vec![doc], session)),
            Some(_) => tracing::warn!(doc_id = id, "Known profile document belongs to another user"),
            None => tracing::debug!(doc_id = id, "Known profile document missing, querying by uid"),
        }
    }
    let docs = store.query(&profile_query(&session.uid)).await?;
    Ok(resolve(docs, session))
}

/// A fetch prepared by [`ProfileState::begin_load`].
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileFetch {
    pub session: Session,
    pub known_id: Option<String>,
}

impl ProfileFetch {
    pub async fn run(&self, store: &dyn DocumentStore) -> Result<LoadedProfile, BackendError> {
        fetch_profile(store, &self.session, self.known_id.as_deref()).await
    }
}

/// Subscribe to the profile query of `session`.
pub fn watch_profile(
    store: &dyn DocumentStore,
    session: &Session,
    on_update: impl Fn(Result<Vec<Document>, BackendError>) + Send + Sync + 'static,
) -> Subscription {
    store.subscribe(profile_query(&session.uid), Box::new(on_update))
}

impl ProfileState {
    pub fn doc_id(&self) -> Option<&str> {
        self.profile.as_ref().and_then(|p| p.doc_id.as_deref())
    }

    pub fn record(&self) -> Option<&ProfileRecord> {
        self.profile.as_ref().map(|p| &p.record)
    }

    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Apply the outcome of a fetch. A failed fetch keeps the last profile.
    pub fn apply(&mut self, result: Result<LoadedProfile, BackendError>) {
        self.loading = false;
        match result {
            Ok(profile) => {
                self.profile = Some(profile);
                self.error = None;
            }
            Err(err) => {
                tracing::error!(code = %err.code, "Error fetching user data: {}", err);
                self.error = Some(messages::profile_load_error(&err));
            }
        }
    }

    /// Apply a pushed query result from a live subscription.
    pub fn apply_snapshot(&mut self, result: Result<Vec<Document>, BackendError>, session: &Session) {
        self.loading = false;
        match result {
            Ok(docs) => {
                self.profile = Some(resolve(docs, session));
                self.error = None;
            }
            Err(err) => {
                tracing::error!(code = %err.code, "Error in user data subscription: {}", err);
                self.error = Some(messages::SYNC_FAILED.to_string());
            }
        }
    }

    pub fn signed_out(&mut self) {
        *self = Self {
            profile: None,
            loading: false,
            error: None,
        };
    }

    /// Start loading the profile of `session`.
    ///
    /// Returns `None` when signed out. A cached profile of a different user is
    /// dropped, and its document id is never reused.
    pub fn begin_load(&mut self, session: Option<&Session>) -> Option<ProfileFetch> {
        let Some(session) = session else {
            self.signed_out();
            return None;
        };
        if self.record().is_some_and(|r| r.uid != session.uid) {
            self.profile = None;
        }
        let known_id = self.doc_id().map(str::to_string);
        self.begin();
        Some(ProfileFetch {
            session: session.clone(),
            known_id,
        })
    }

    /// Fetch (or refetch) the profile for `session`.
    pub async fn load(&mut self, store: &dyn DocumentStore, session: Option<&Session>) {
        if let Some(fetch) = self.begin_load(session) {
            let result = fetch.run(store).await;
            self.apply(result);
        }
    }
}

/// Keeps at most one live profile subscription, for the current user.
#[derive(Debug, Default)]
pub struct ProfileWatch {
    current: Option<(String, Subscription)>,
}

impl ProfileWatch {
    pub fn uid(&self) -> Option<&str> {
        self.current.as_ref().map(|(uid, _)| uid.as_str())
    }

    /// Follow the profile of `session`.
    ///
    /// An existing subscription for the same user is kept and `on_update` is
    /// dropped. A different user replaces it; `None` releases it. Returns
    /// whether a new subscription was made.
    pub fn follow(
        &mut self,
        store: &dyn DocumentStore,
        session: Option<&Session>,
        on_update: impl Fn(Result<Vec<Document>, BackendError>) + Send + Sync + 'static,
    ) -> bool {
        let Some(session) = session else {
            self.current = None;
            return false;
        };
        if self.uid() == Some(session.uid.as_str()) {
            return false;
        }
        // Release before subscribing so only one listener exists at a time.
        self.current = None;
        tracing::debug!(uid = %session.uid, "Subscribing to profile changes");
        self.current = Some((session.uid.clone(), watch_profile(store, session, on_update)));
        true
    }
}
