//! # Store crate: backend contracts for the Perfil client
//!
//! Everything the app knows about its backend lives here: the two service traits,
//! the data they exchange, and the implementations the frontends can be wired to.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`service`] | [`CredentialService`] and [`DocumentStore`] traits plus the [`Backend`] bundle handed to the UI |
//! | [`models`] | [`Session`], [`Document`], [`Query`] and the typed [`ProfileRecord`] view of a `usuarios` document |
//! | [`error`] | [`BackendError`] and its machine-readable [`ErrorCode`] |
//! | [`subscription`] | [`Subscription`] handles and the [`Listeners`] registry behind push callbacks |
//! | [`config`] | `perfil.toml` configuration with environment overrides |
//! | `memory` | [`MemoryBackend`], an in-process backend for tests and offline development |
//! | `firebase` | `FirebaseBackend`, the REST client for Identity Toolkit and Firestore (feature `firebase`) |

pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod subscription;

mod memory;
pub use memory::{Call, MemoryBackend, Operation};

#[cfg(feature = "firebase")]
mod firebase;
#[cfg(feature = "firebase")]
pub use firebase::FirebaseBackend;

pub use config::AppConfig;
pub use error::{BackendError, ErrorCode};
pub use models::{Document, Fields, ProfileRecord, Query, Session, PROFILES_COLLECTION};
pub use service::{Backend, CredentialService, DocumentStore, SessionCallback, SnapshotCallback};
pub use subscription::{Listeners, Subscription};
