//! This crate contains all shared UI for the workspace.

use std::time::Duration;

use dioxus::prelude::*;

pub mod components;
pub mod views;

pub const MAIN_CSS: Asset = asset!("/assets/main.css");

mod auth;
pub use auth::{use_backend, use_session, SessionProvider};

mod profile;
pub use profile::{use_profile, use_profile_context, ProfileHandle, ProfileProvider};

/// Sleep on whichever timer the target provides.
pub async fn sleep(duration: Duration) {
    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::sleep(duration).await;
    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(duration).await;
}
