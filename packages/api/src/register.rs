//! Account registration: credential, display name and profile record.

use store::{models::timestamp, Backend, BackendError, ProfileRecord, Session, PROFILES_COLLECTION};

use crate::messages;
use crate::validation::{check_age, is_valid_email, Field, ValidationError, MIN_PASSWORD_LEN};

/// Draft and status of the registration form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: String,
    pub specialty: String,
    pub loading: bool,
    pub error: Option<String>,
}

/// A validated registration, text fields trimmed.
#[derive(Clone, Debug, PartialEq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: String,
    pub specialty: String,
}

impl RegisterForm {
    /// Check the fields in display order and report the first problem.
    pub fn validate(&self) -> Result<NewAccount, ValidationError> {
        let name = self.name.trim();
        let email = self.email.trim();
        let age = self.age.trim();
        let specialty = self.specialty.trim();

        if name.is_empty() {
            return Err(ValidationError::new(Field::Name, messages::NAME_REQUIRED));
        }
        if email.is_empty() {
            return Err(ValidationError::new(Field::Email, messages::EMAIL_REQUIRED));
        }
        if !is_valid_email(email) {
            return Err(ValidationError::new(Field::Email, messages::EMAIL_INVALID));
        }
        if self.password.trim().is_empty() {
            return Err(ValidationError::new(Field::Password, messages::PASSWORD_REQUIRED));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::new(Field::Password, messages::PASSWORD_TOO_SHORT));
        }
        check_age(age)?;
        if specialty.is_empty() {
            return Err(ValidationError::new(Field::Specialty, messages::SPECIALTY_REQUIRED));
        }

        Ok(NewAccount {
            name: name.to_string(),
            email: email.to_string(),
            password: self.password.clone(),
            age: age.to_string(),
            specialty: specialty.to_string(),
        })
    }

    pub fn begin(&mut self) -> Option<NewAccount> {
        if self.loading {
            return None;
        }
        match self.validate() {
            Ok(account) => {
                self.loading = true;
                self.error = None;
                Some(account)
            }
            Err(err) => {
                self.error = Some(err.message.to_string());
                None
            }
        }
    }

    pub fn finish(&mut self, result: Result<Session, BackendError>) -> bool {
        self.loading = false;
        match result {
            Ok(_) => true,
            Err(err) => {
                self.error = Some(messages::register_error(&err));
                false
            }
        }
    }

    pub async fn submit(&mut self, backend: &Backend) -> bool {
        let Some(account) = self.begin() else {
            return false;
        };
        let result = create_account(backend, &account).await;
        self.finish(result)
    }
}

/// Create the credential, name it, and store the profile record.
///
/// If naming or storing fails once the credential exists, the credential is
/// deleted again so the email can be reused, and the original error is
/// returned.
pub async fn create_account(backend: &Backend, account: &NewAccount) -> Result<Session, BackendError> {
    let session = backend
        .auth
        .create_account(&account.email, &account.password)
        .await?;
    tracing::info!(uid = %session.uid, "Credential created");

    match complete_registration(backend, &session, account).await {
        Ok(session) => Ok(session),
        Err(err) => {
            tracing::warn!(uid = %session.uid, "Registration incomplete, deleting credential: {}", err);
            if let Err(rollback) = backend.auth.delete_account().await {
                tracing::warn!(uid = %session.uid, "Failed to delete credential: {}", rollback);
            }
            Err(err)
        }
    }
}

async fn complete_registration(
    backend: &Backend,
    session: &Session,
    account: &NewAccount,
) -> Result<Session, BackendError> {
    let session = backend.auth.set_display_name(&account.name).await?;
    let record = ProfileRecord {
        uid: session.uid.clone(),
        name: account.name.clone(),
        email: account.email.clone(),
        age: account.age.clone(),
        specialty: account.specialty.clone(),
        registered_at: Some(timestamp()),
        updated_at: None,
    };
    let id = backend
        .documents
        .create(PROFILES_COLLECTION, record.to_fields())
        .await?;
    tracing::info!(uid = %session.uid, doc_id = %id, "Profile record created");
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use store::models::fields;
    use store::{Call, CredentialService, ErrorCode, MemoryBackend, Operation};

    fn ana() -> RegisterForm {
        RegisterForm {
            name: "Ana".into(),
            email: "ana@x.com".into(),
            password: "secret1".into(),
            age: "30".into(),
            specialty: "Doctor".into(),
            ..Default::default()
        }
    }

    fn setup() -> (MemoryBackend, Backend) {
        let memory = MemoryBackend::new();
        let backend = Backend::memory(memory.clone());
        (memory, backend)
    }

    #[tokio::test]
    async fn test_register_creates_credential_name_and_record() {
        let (memory, backend) = setup();
        let mut form = ana();

        assert!(form.submit(&backend).await);
        assert!(!form.loading);
        assert!(form.error.is_none());

        let session = memory.current_session().unwrap();
        assert_eq!(session.display_name.as_deref(), Some("Ana"));

        let docs = memory.documents(PROFILES_COLLECTION);
        assert_eq!(docs.len(), 1);
        let doc = &docs[0].fields;
        assert_eq!(doc.get(fields::UID), Some(&json!(session.uid)));
        assert_eq!(doc.get(fields::NAME), Some(&json!("Ana")));
        assert_eq!(doc.get(fields::EMAIL), Some(&json!("ana@x.com")));
        assert_eq!(doc.get(fields::AGE), Some(&json!("30")));
        assert_eq!(doc.get(fields::SPECIALTY), Some(&json!("Doctor")));
        assert!(doc.contains_key(fields::REGISTERED_AT));
        assert!(!doc.contains_key(fields::UPDATED_AT));
        assert_eq!(doc.len(), 6);
    }

    #[test]
    fn test_validation_order_first_failure_wins() {
        let blank = RegisterForm::default();
        assert_eq!(blank.validate().unwrap_err().message, messages::NAME_REQUIRED);

        let cases = [
            (RegisterForm { email: " ".into(), ..ana() }, messages::EMAIL_REQUIRED),
            (RegisterForm { email: "ana@x".into(), age: "".into(), ..ana() }, messages::EMAIL_INVALID),
            (RegisterForm { password: "".into(), ..ana() }, messages::PASSWORD_REQUIRED),
            (RegisterForm { password: "      ".into(), ..ana() }, messages::PASSWORD_REQUIRED),
            (RegisterForm { password: "12345".into(), ..ana() }, messages::PASSWORD_TOO_SHORT),
            (RegisterForm { age: "".into(), specialty: "".into(), ..ana() }, messages::AGE_REQUIRED),
            (RegisterForm { age: "0".into(), ..ana() }, messages::AGE_INVALID),
            (RegisterForm { specialty: "  ".into(), ..ana() }, messages::SPECIALTY_REQUIRED),
        ];
        for (form, expected) in cases {
            assert_eq!(form.validate().unwrap_err().message, expected);
        }
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_backend() {
        let (memory, backend) = setup();
        for age in ["121", "abc", "0"] {
            let mut form = RegisterForm { age: age.into(), ..ana() };
            assert!(!form.submit(&backend).await);
            assert_eq!(form.error.as_deref(), Some(messages::AGE_INVALID));
        }
        let mut form = RegisterForm { email: "ana at x.com".into(), ..ana() };
        assert!(!form.submit(&backend).await);
        assert!(memory.calls().is_empty());
    }

    #[tokio::test]
    async fn test_email_in_use() {
        let (memory, backend) = setup();
        memory.with_account("ana@x.com", "other12", None);
        let mut form = ana();

        assert!(!form.submit(&backend).await);
        assert_eq!(form.error.as_deref(), Some(messages::EMAIL_IN_USE));
        assert!(memory.documents(PROFILES_COLLECTION).is_empty());
    }

    #[tokio::test]
    async fn test_failed_record_rolls_back_credential() {
        let (memory, backend) = setup();
        memory.fail_next(
            Operation::Create,
            BackendError::new(ErrorCode::PermissionDenied, "Missing or insufficient permissions."),
        );
        let mut form = ana();

        assert!(!form.submit(&backend).await);
        assert_eq!(form.error.as_deref(), Some("Missing or insufficient permissions."));
        assert_eq!(memory.calls().last(), Some(&Call::DeleteAccount));
        assert!(memory.account("ana@x.com").is_none());
        assert!(memory.current_session().is_none());

        // The email is free again.
        let mut retry = ana();
        assert!(retry.submit(&backend).await);
    }

    #[tokio::test]
    async fn test_failed_rollback_keeps_original_error() {
        let (memory, backend) = setup();
        memory.fail_next(
            Operation::SetDisplayName,
            BackendError::new(ErrorCode::NetworkRequestFailed, "offline"),
        );
        memory.fail_next(
            Operation::DeleteAccount,
            BackendError::new(ErrorCode::NetworkRequestFailed, "still offline"),
        );
        let mut form = ana();

        assert!(!form.submit(&backend).await);
        assert_eq!(form.error.as_deref(), Some(messages::NETWORK_FAILED));
        assert!(memory.documents(PROFILES_COLLECTION).is_empty());
    }
}
