//! # API crate: client-side flows for the Perfil app
//!
//! Everything between a screen and the backend lives here: form drafts,
//! validation, the backend call sequences, and the translation of backend
//! error codes into the Spanish messages the screens display. Nothing in this
//! crate depends on the UI framework; the `ui` crate wraps each state type in
//! a signal and drives it from hooks.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`validation`] | [`Field`], [`ValidationError`], [`FieldErrors`], email and age rules |
//! | [`messages`] | Fixed UI strings and the code → message tables for each flow |
//! | [`session`] | [`SessionState`] mirrored from the credential service, [`SessionWatch`], sign-out and reload |
//! | [`login`] | [`LoginForm`]: `idle → submitting → {error, success}` |
//! | [`register`] | [`RegisterForm`] and [`create_account`] with compensating rollback |
//! | [`profile`] | [`ProfileState`]: fetch, placeholder synthesis; [`ProfileWatch`] for the live subscription |
//! | [`profile_edit`] | [`ProfileDraft`] validation, change detection and [`save_profile`] |
//!
//! ## Shape of a flow
//!
//! Each stateful type exposes a synchronous `begin` that validates and flips
//! the loading flag, and a synchronous `finish` that consumes the backend
//! result and always clears it. An async `submit` composes the two around the
//! backend call for callers (and tests) that hold the state directly.

pub mod login;
pub mod messages;
pub mod profile;
pub mod profile_edit;
pub mod register;
pub mod session;
pub mod validation;

pub use login::{LoginForm, SignInRequest};
pub use profile::{fetch_profile, watch_profile, LoadedProfile, ProfileFetch, ProfileState, ProfileWatch};
pub use profile_edit::{has_changes, save_profile, ProfileDraft, ProfileEditState, SaveOutcome, SavedProfile};
pub use register::{create_account, NewAccount, RegisterForm};
pub use session::{SessionState, SessionWatch, UserData};
pub use validation::{Field, FieldErrors, ValidationError};

pub use store::{Backend, BackendError, ErrorCode, ProfileRecord, Session};
