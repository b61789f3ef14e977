//! # App configuration: `perfil.toml`
//!
//! Static backend connection parameters plus a couple of client tunables.
//!
//! ```toml
//! [firebase]
//! api_key = "AIza..."
//! project_id = "my-project"
//! auth_domain = "my-project.firebaseapp.com"
//!
//! [sync]
//! poll_interval_secs = 5   # live profile updates; 0 disables them
//!
//! [ui]
//! splash_min_millis = 500
//! ```
//!
//! Every section is optional and falls back to its `Default`. The Firebase
//! values can be overridden from the environment (`PERFIL_API_KEY`,
//! `PERFIL_PROJECT_ID`, `PERFIL_AUTH_DOMAIN`), with `.env` loaded through
//! `dotenvy`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration stored in `perfil.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub firebase: FirebaseConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Firebase project connection parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FirebaseConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub auth_domain: String,
}

impl FirebaseConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.project_id.trim().is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Seconds between remote checks for live profile updates. 0 disables.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u32,
}

fn default_poll_interval() -> u32 {
    5
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Option<Duration> {
        match self.poll_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(u64::from(secs))),
        }
    }

    pub fn live_updates(&self) -> bool {
        self.poll_interval_secs > 0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Minimum time the splash screen stays up.
    #[serde(default = "default_splash_min_millis")]
    pub splash_min_millis: u64,
}

fn default_splash_min_millis() -> u64 {
    500
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            splash_min_millis: default_splash_min_millis(),
        }
    }
}

impl AppConfig {
    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "perfil.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Builder method to set the live-update poll interval.
    pub fn with_poll_interval(mut self, secs: u32) -> Self {
        self.sync.poll_interval_secs = secs;
        self
    }

    /// Apply `PERFIL_*` overrides from the process environment (and `.env`).
    pub fn with_env_overrides(self) -> Self {
        dotenvy::dotenv().ok();
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get("PERFIL_API_KEY") {
            self.firebase.api_key = v;
        }
        if let Some(v) = get("PERFIL_PROJECT_ID") {
            self.firebase.project_id = v;
        }
        if let Some(v) = get("PERFIL_AUTH_DOMAIN") {
            self.firebase.auth_domain = v;
        }
        self
    }
}
