//! Editing the profile: validation, change detection and the write itself.

use serde_json::Value;
use store::models::{fields, timestamp};
use store::{Backend, BackendError, Fields, ProfileRecord, Session, PROFILES_COLLECTION};

use crate::messages;
use crate::profile::LoadedProfile;
use crate::validation::{check_age, check_length, Field, FieldErrors, NAME_LEN, SPECIALTY_LEN};

/// Editable profile fields as typed by the user.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileDraft {
    pub name: String,
    pub age: String,
    pub specialty: String,
}

impl ProfileDraft {
    pub fn from_record(record: &ProfileRecord) -> Self {
        Self {
            name: record.name.clone(),
            age: record.age.clone(),
            specialty: record.specialty.clone(),
        }
    }

    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            age: self.age.trim().to_string(),
            specialty: self.specialty.trim().to_string(),
        }
    }

    /// Check every field, collecting one error per invalid field.
    pub fn validate(&self) -> Result<ProfileDraft, FieldErrors> {
        let errors: FieldErrors = [
            check_length(
                Field::Name,
                &self.name,
                NAME_LEN,
                [messages::NAME_REQUIRED, messages::NAME_TOO_SHORT, messages::NAME_TOO_LONG],
            ),
            check_age(&self.age),
            check_length(
                Field::Specialty,
                &self.specialty,
                SPECIALTY_LEN,
                [
                    messages::SPECIALTY_REQUIRED,
                    messages::SPECIALTY_TOO_SHORT,
                    messages::SPECIALTY_TOO_LONG,
                ],
            ),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        if errors.is_empty() {
            Ok(self.trimmed())
        } else {
            Err(errors)
        }
    }
}

/// Whether the trimmed draft differs from what is stored. Without a stored
/// profile every draft counts as a change.
pub fn has_changes(original: Option<&ProfileRecord>, draft: &ProfileDraft) -> bool {
    let Some(original) = original else {
        return true;
    };
    let draft = draft.trimmed();
    original.name != draft.name || original.age != draft.age || original.specialty != draft.specialty
}

/// The profile as it stands after a successful save.
#[derive(Clone, Debug, PartialEq)]
pub struct SavedProfile {
    pub profile: LoadedProfile,
    pub session: Session,
}

/// Only the draft fields that differ from `original`.
fn changed_fields(original: &ProfileRecord, draft: &ProfileDraft) -> Fields {
    let mut out = Fields::new();
    for (key, before, after) in [
        (fields::NAME, &original.name, &draft.name),
        (fields::AGE, &original.age, &draft.age),
        (fields::SPECIALTY, &original.specialty, &draft.specialty),
    ] {
        if before != after {
            out.insert(key.to_string(), Value::from(after.as_str()));
        }
    }
    out
}

/// Write a validated draft.
///
/// The display name is set on the credential first. An existing record is
/// updated in place with the changed fields and a fresh `fechaActualizacion`;
/// without one, a complete record is created.
pub async fn save_profile(
    backend: &Backend,
    session: &Session,
    current: Option<&LoadedProfile>,
    draft: &ProfileDraft,
) -> Result<SavedProfile, BackendError> {
    let session = backend.auth.set_display_name(&draft.name).await?;
    let now = timestamp();

    let existing = current.and_then(|c| c.doc_id.as_deref().map(|id| (id, &c.record)));
    let profile = match existing {
        Some((id, original)) => {
            let mut update = changed_fields(original, draft);
            update.insert(fields::UPDATED_AT.to_string(), Value::from(now.as_str()));
            backend
                .documents
                .update(PROFILES_COLLECTION, id, update)
                .await?;
            tracing::info!(doc_id = id, "Profile updated");
            LoadedProfile {
                record: ProfileRecord {
                    name: draft.name.clone(),
                    age: draft.age.clone(),
                    specialty: draft.specialty.clone(),
                    updated_at: Some(now),
                    ..original.clone()
                },
                doc_id: Some(id.to_string()),
            }
        }
        None => {
            let record = ProfileRecord {
                uid: session.uid.clone(),
                name: draft.name.clone(),
                email: session.email.clone(),
                age: draft.age.clone(),
                specialty: draft.specialty.clone(),
                registered_at: Some(now.clone()),
                updated_at: Some(now),
            };
            let id = backend
                .documents
                .create(PROFILES_COLLECTION, record.to_fields())
                .await?;
            tracing::info!(doc_id = %id, "Profile record created");
            LoadedProfile {
                record,
                doc_id: Some(id),
            }
        }
    };
    Ok(SavedProfile { profile, session })
}

/// Result of pressing save.
#[derive(Clone, Debug, PartialEq)]
pub enum SaveOutcome {
    /// A save is already in flight.
    Busy,
    /// The draft matches the stored profile; nothing was written.
    Unchanged,
    /// Validation failed; see [`ProfileEditState::field_errors`].
    Invalid,
    /// The backend rejected the write; see [`ProfileEditState::error`].
    Failed,
    Saved(SavedProfile),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileEditState {
    pub loading: bool,
    pub error: Option<String>,
    pub field_errors: FieldErrors,
}

impl ProfileEditState {
    /// Decide whether the draft should be written, and enter the saving state
    /// if so.
    pub fn begin(
        &mut self,
        original: Option<&ProfileRecord>,
        draft: &ProfileDraft,
    ) -> Result<ProfileDraft, SaveOutcome> {
        if self.loading {
            return Err(SaveOutcome::Busy);
        }
        if !has_changes(original, draft) {
            return Err(SaveOutcome::Unchanged);
        }
        match draft.validate() {
            Ok(valid) => {
                self.loading = true;
                self.error = None;
                self.field_errors = FieldErrors::new();
                Ok(valid)
            }
            Err(errors) => {
                self.field_errors = errors;
                Err(SaveOutcome::Invalid)
            }
        }
    }

    pub fn finish(&mut self, result: Result<SavedProfile, BackendError>) -> SaveOutcome {
        self.loading = false;
        match result {
            Ok(saved) => SaveOutcome::Saved(saved),
            Err(err) => {
                tracing::error!(code = %err.code, "Error updating profile: {}", err);
                self.error = Some(messages::profile_save_error(&err));
                SaveOutcome::Failed
            }
        }
    }

    pub fn clear_error(&mut self) {
        self.error = None;
        self.field_errors = FieldErrors::new();
    }

    pub async fn submit(
        &mut self,
        backend: &Backend,
        session: &Session,
        current: Option<&LoadedProfile>,
        draft: &ProfileDraft,
    ) -> SaveOutcome {
        let draft = match self.begin(current.map(|c| &c.record), draft) {
            Ok(draft) => draft,
            Err(outcome) => return outcome,
        };
        let result = save_profile(backend, session, current, &draft).await;
        self.finish(result)
    }
}
