//! User-facing strings and the backend error tables of each flow.
//!
//! Each flow owns its own table because the same code reads differently in
//! context: `unavailable` while loading a profile is a read failure, while
//! saving it is a write failure.

use chrono::{DateTime, Utc};
use store::{BackendError, ErrorCode};

pub const FILL_ALL_FIELDS: &str = "Por favor completa todos los campos";

pub const NAME_REQUIRED: &str = "El nombre es requerido";
pub const NAME_TOO_SHORT: &str = "El nombre debe tener al menos 2 caracteres";
pub const NAME_TOO_LONG: &str = "El nombre no puede exceder 50 caracteres";
pub const EMAIL_REQUIRED: &str = "El correo es requerido";
pub const EMAIL_INVALID: &str = "Por favor ingresa un correo válido";
pub const PASSWORD_REQUIRED: &str = "La contraseña es requerida";
pub const PASSWORD_TOO_SHORT: &str = "La contraseña debe tener al menos 6 caracteres";
pub const AGE_REQUIRED: &str = "La edad es requerida";
pub const AGE_INVALID: &str = "Por favor ingresa una edad válida (1-120)";
pub const SPECIALTY_REQUIRED: &str = "La especialidad es requerida";
pub const SPECIALTY_TOO_SHORT: &str = "La especialidad debe tener al menos 2 caracteres";
pub const SPECIALTY_TOO_LONG: &str = "La especialidad no puede exceder 100 caracteres";

pub const USER_NOT_FOUND: &str = "No existe una cuenta con este correo";
pub const WRONG_PASSWORD: &str = "Contraseña incorrecta";
pub const INVALID_CREDENTIAL: &str = "Correo o contraseña incorrectos";
pub const INVALID_EMAIL: &str = "Correo electrónico inválido";
pub const USER_DISABLED: &str = "Esta cuenta ha sido deshabilitada";
pub const TOO_MANY_REQUESTS: &str = "Demasiados intentos. Intenta más tarde";
pub const NETWORK_FAILED: &str = "Error de conexión. Verifica tu internet";
pub const EMAIL_IN_USE: &str = "Ya existe una cuenta con este correo";
pub const WEAK_PASSWORD: &str = "La contraseña es muy débil";

pub const LOAD_DENIED: &str = "No tienes permisos para ver estos datos";
pub const SAVE_DENIED: &str = "No tienes permisos para actualizar estos datos";
pub const UNAVAILABLE: &str = "Servicio no disponible. Intenta más tarde";
pub const LOAD_FAILED: &str = "Error al cargar los datos del usuario";
pub const SYNC_FAILED: &str = "Error al sincronizar datos";
pub const UNKNOWN_ERROR: &str = "Error desconocido";

pub const SIGN_OUT_FAILED: &str = "No se pudo cerrar la sesión";
pub const NO_CHANGES: &str = "No se detectaron cambios en la información";
pub const PROFILE_SAVED: &str = "Tu perfil ha sido actualizado correctamente";
pub const ACCOUNT_CREATED: &str = "Tu cuenta ha sido creada correctamente.";
pub const DISCARD_CHANGES: &str =
    "¿Estás seguro de que quieres cancelar? Los cambios no guardados se perderán.";
pub const CONFIRM_SIGN_OUT: &str = "¿Estás seguro de que quieres cerrar sesión?";
pub const EMAIL_READ_ONLY: &str = "El correo no se puede modificar";
pub const NOT_AVAILABLE: &str = "No disponible";
pub const DEFAULT_GREETING_NAME: &str = "Usuario";
pub const EMAIL_VERIFIED: &str = "Verificado";
pub const EMAIL_NOT_VERIFIED: &str = "Sin verificar";

/// Sign-in failures.
pub fn login_error(err: &BackendError) -> String {
    match err.code {
        ErrorCode::UserNotFound => USER_NOT_FOUND.into(),
        ErrorCode::WrongPassword => WRONG_PASSWORD.into(),
        ErrorCode::InvalidCredential => INVALID_CREDENTIAL.into(),
        ErrorCode::InvalidEmail => INVALID_EMAIL.into(),
        ErrorCode::UserDisabled => USER_DISABLED.into(),
        ErrorCode::TooManyRequests => TOO_MANY_REQUESTS.into(),
        ErrorCode::NetworkRequestFailed => NETWORK_FAILED.into(),
        _ => err.message.clone(),
    }
}

/// Account creation failures.
pub fn register_error(err: &BackendError) -> String {
    match err.code {
        ErrorCode::EmailAlreadyInUse => EMAIL_IN_USE.into(),
        ErrorCode::InvalidEmail => INVALID_EMAIL.into(),
        ErrorCode::WeakPassword => WEAK_PASSWORD.into(),
        ErrorCode::NetworkRequestFailed => NETWORK_FAILED.into(),
        _ => err.message.clone(),
    }
}

/// Profile read failures.
pub fn profile_load_error(err: &BackendError) -> String {
    match err.code {
        ErrorCode::PermissionDenied => LOAD_DENIED.into(),
        ErrorCode::Unavailable => UNAVAILABLE.into(),
        _ => LOAD_FAILED.into(),
    }
}

/// Profile write failures.
pub fn profile_save_error(err: &BackendError) -> String {
    match err.code {
        ErrorCode::NetworkRequestFailed => NETWORK_FAILED.into(),
        ErrorCode::PermissionDenied => SAVE_DENIED.into(),
        ErrorCode::Unavailable => UNAVAILABLE.into(),
        _ if err.message.trim().is_empty() => UNKNOWN_ERROR.into(),
        _ => err.message.clone(),
    }
}

/// `"30"` → `"30 años"`; a blank age reads as not available.
pub fn age_label(age: &str) -> String {
    match age.trim() {
        "" => NOT_AVAILABLE.into(),
        age => format!("{age} años"),
    }
}

/// Show `value`, or the not-available placeholder when it is blank.
pub fn or_not_available(value: &str) -> &str {
    if value.trim().is_empty() {
        NOT_AVAILABLE
    } else {
        value
    }
}

pub fn verification_label(verified: bool) -> &'static str {
    if verified {
        EMAIL_VERIFIED
    } else {
        EMAIL_NOT_VERIFIED
    }
}

/// Account creation date as `dd/mm/yyyy`.
pub fn member_since(created_at: Option<DateTime<Utc>>) -> String {
    created_at
        .map(|at| at.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(code: ErrorCode, message: &str) -> BackendError {
        BackendError::new(code, message)
    }

    #[test]
    fn test_login_table() {
        assert_eq!(login_error(&err(ErrorCode::WrongPassword, "x")), WRONG_PASSWORD);
        assert_eq!(login_error(&err(ErrorCode::UserNotFound, "x")), USER_NOT_FOUND);
        assert_eq!(login_error(&err(ErrorCode::InvalidCredential, "x")), INVALID_CREDENTIAL);
        assert_eq!(login_error(&err(ErrorCode::NetworkRequestFailed, "x")), NETWORK_FAILED);
        assert_eq!(
            login_error(&err(ErrorCode::Unknown("auth/internal-error".into()), "Internal")),
            "Internal"
        );
    }

    #[test]
    fn test_register_table() {
        assert_eq!(register_error(&err(ErrorCode::EmailAlreadyInUse, "x")), EMAIL_IN_USE);
        assert_eq!(register_error(&err(ErrorCode::WeakPassword, "x")), WEAK_PASSWORD);
        assert_eq!(register_error(&err(ErrorCode::WrongPassword, "raw")), "raw");
    }

    #[test]
    fn test_load_table_never_shows_raw_message() {
        assert_eq!(profile_load_error(&err(ErrorCode::PermissionDenied, "x")), LOAD_DENIED);
        assert_eq!(profile_load_error(&err(ErrorCode::Unavailable, "x")), UNAVAILABLE);
        assert_eq!(profile_load_error(&err(ErrorCode::NotFound, "raw")), LOAD_FAILED);
    }

    #[test]
    fn test_save_table_falls_back_to_unknown() {
        assert_eq!(profile_save_error(&err(ErrorCode::PermissionDenied, "x")), SAVE_DENIED);
        assert_eq!(profile_save_error(&err(ErrorCode::NotFound, "gone")), "gone");
        assert_eq!(profile_save_error(&err(ErrorCode::NotFound, "")), UNKNOWN_ERROR);
    }

    #[test]
    fn test_age_label() {
        assert_eq!(age_label("30"), "30 años");
        assert_eq!(age_label(" "), NOT_AVAILABLE);
        assert_eq!(or_not_available(""), NOT_AVAILABLE);
        assert_eq!(or_not_available("Doctor"), "Doctor");
    }

    #[test]
    fn test_account_labels() {
        let created = DateTime::parse_from_rfc3339("2024-03-05T10:00:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(member_since(Some(created)), "05/03/2024");
        assert_eq!(member_since(None), NOT_AVAILABLE);
        assert_eq!(verification_label(true), "Verificado");
        assert_eq!(verification_label(false), "Sin verificar");
    }
}
