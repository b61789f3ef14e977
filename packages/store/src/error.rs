//! Backend error type shared by every service implementation.

use std::fmt;

use thiserror::Error;

/// Machine-readable error code reported by the credential service or the
/// document store.
///
/// Credential codes render with the `auth/` prefix (`auth/wrong-password`),
/// document-store codes render bare (`permission-denied`). Codes the client
/// does not recognise are kept verbatim in [`ErrorCode::Unknown`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    EmailAlreadyInUse,
    UserNotFound,
    WrongPassword,
    InvalidCredential,
    InvalidEmail,
    WeakPassword,
    UserDisabled,
    TooManyRequests,
    NetworkRequestFailed,
    NoCurrentUser,
    PermissionDenied,
    Unavailable,
    NotFound,
    Unknown(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::EmailAlreadyInUse => "auth/email-already-in-use",
            ErrorCode::UserNotFound => "auth/user-not-found",
            ErrorCode::WrongPassword => "auth/wrong-password",
            ErrorCode::InvalidCredential => "auth/invalid-credential",
            ErrorCode::InvalidEmail => "auth/invalid-email",
            ErrorCode::WeakPassword => "auth/weak-password",
            ErrorCode::UserDisabled => "auth/user-disabled",
            ErrorCode::TooManyRequests => "auth/too-many-requests",
            ErrorCode::NetworkRequestFailed => "auth/network-request-failed",
            ErrorCode::NoCurrentUser => "auth/no-current-user",
            ErrorCode::PermissionDenied => "permission-denied",
            ErrorCode::Unavailable => "unavailable",
            ErrorCode::NotFound => "not-found",
            ErrorCode::Unknown(code) => code,
        }
    }

    /// Parse a code in its rendered form. Unrecognised codes are preserved.
    pub fn parse(code: &str) -> Self {
        match code {
            "auth/email-already-in-use" => ErrorCode::EmailAlreadyInUse,
            "auth/user-not-found" => ErrorCode::UserNotFound,
            "auth/wrong-password" => ErrorCode::WrongPassword,
            "auth/invalid-credential" => ErrorCode::InvalidCredential,
            "auth/invalid-email" => ErrorCode::InvalidEmail,
            "auth/weak-password" => ErrorCode::WeakPassword,
            "auth/user-disabled" => ErrorCode::UserDisabled,
            "auth/too-many-requests" => ErrorCode::TooManyRequests,
            "auth/network-request-failed" => ErrorCode::NetworkRequestFailed,
            "auth/no-current-user" => ErrorCode::NoCurrentUser,
            "permission-denied" => ErrorCode::PermissionDenied,
            "unavailable" => ErrorCode::Unavailable,
            "not-found" => ErrorCode::NotFound,
            other => ErrorCode::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error returned by a backend call.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{message} ({code})")]
pub struct BackendError {
    pub code: ErrorCode,
    /// Raw message from the backend, shown to the user when the code has no
    /// dedicated translation.
    pub message: String,
}

impl BackendError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Error for operations that need a signed-in user when there is none.
    pub fn no_current_user() -> Self {
        Self::new(ErrorCode::NoCurrentUser, "No user is currently signed in")
    }
}

pub type Result<T, E = BackendError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_parse_back() {
        for code in [
            ErrorCode::WrongPassword,
            ErrorCode::EmailAlreadyInUse,
            ErrorCode::PermissionDenied,
            ErrorCode::Unavailable,
        ] {
            assert_eq!(ErrorCode::parse(code.as_str()), code);
        }
    }

    #[test]
    fn test_unknown_code_is_preserved() {
        let code = ErrorCode::parse("auth/quota-exceeded");
        assert_eq!(code, ErrorCode::Unknown("auth/quota-exceeded".to_string()));
        assert_eq!(code.to_string(), "auth/quota-exceeded");
    }

    #[test]
    fn test_display_includes_code() {
        let err = BackendError::new(ErrorCode::WrongPassword, "INVALID_PASSWORD");
        assert_eq!(err.to_string(), "INVALID_PASSWORD (auth/wrong-password)");
    }
}
