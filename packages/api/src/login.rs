//! Email and password sign-in form.

use store::{BackendError, CredentialService, Session};

use crate::messages;

/// Draft and status of the sign-in form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub loading: bool,
    pub error: Option<String>,
}

/// Credentials ready to send, email already trimmed.
#[derive(Clone, Debug, PartialEq)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Validate the draft and enter the submitting state.
    ///
    /// Returns `None` when the form is incomplete (with the error set) or a
    /// submission is already outstanding.
    pub fn begin(&mut self) -> Option<SignInRequest> {
        if self.loading {
            return None;
        }
        let email = self.email.trim();
        if email.is_empty() || self.password.trim().is_empty() {
            self.error = Some(messages::FILL_ALL_FIELDS.to_string());
            return None;
        }
        self.loading = true;
        self.error = None;
        Some(SignInRequest {
            email: email.to_string(),
            password: self.password.clone(),
        })
    }

    /// Leave the submitting state. Returns whether sign-in succeeded.
    pub fn finish(&mut self, result: Result<Session, BackendError>) -> bool {
        self.loading = false;
        match result {
            Ok(session) => {
                tracing::info!(uid = %session.uid, "Login succeeded");
                true
            }
            Err(err) => {
                tracing::warn!(code = %err.code, "Login failed");
                self.error = Some(messages::login_error(&err));
                false
            }
        }
    }

    pub async fn submit(&mut self, auth: &dyn CredentialService) -> bool {
        let Some(request) = self.begin() else {
            return false;
        };
        let result = auth.sign_in(&request.email, &request.password).await;
        self.finish(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{CredentialService, MemoryBackend};

    fn form(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: email.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_blank_fields_never_reach_backend() {
        let backend = MemoryBackend::new();
        let mut login = form("  ", "secret1");

        assert!(!login.submit(&backend).await);
        assert_eq!(login.error.as_deref(), Some(messages::FILL_ALL_FIELDS));
        assert!(!login.loading);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let backend = MemoryBackend::new();
        backend.with_account("ana@x.com", "secret1", None);
        let mut login = form("ana@x.com", "nope123");

        assert!(!login.submit(&backend).await);
        assert_eq!(login.error.as_deref(), Some(messages::WRONG_PASSWORD));
        assert!(!login.loading);
        assert!(backend.current_session().is_none());
    }

    #[tokio::test]
    async fn test_success_trims_email() {
        let backend = MemoryBackend::new();
        backend.with_account("ana@x.com", "secret1", None);
        let mut login = form("  ana@x.com ", "secret1");

        assert!(login.submit(&backend).await);
        assert!(login.error.is_none());
        assert_eq!(
            backend.calls(),
            vec![store::Call::SignIn { email: "ana@x.com".into() }]
        );
        assert_eq!(backend.current_session().unwrap().email, "ana@x.com");
    }

    #[tokio::test]
    async fn test_disabled_account() {
        let backend = MemoryBackend::new();
        backend.with_account("ana@x.com", "secret1", None);
        backend.disable_account("ana@x.com");
        let mut login = form("ana@x.com", "secret1");

        assert!(!login.submit(&backend).await);
        assert_eq!(login.error.as_deref(), Some(messages::USER_DISABLED));
    }

    #[test]
    fn test_begin_is_gated_while_loading() {
        let mut login = form("ana@x.com", "secret1");
        assert!(login.begin().is_some());
        assert!(login.loading);
        assert!(login.begin().is_none());
    }
}
