use std::time::Duration;

use dioxus::prelude::*;
use store::{AppConfig, Backend};
use views::{EditProfile, Home, Login, Register};

mod views;

const CONFIG_TOML: &str = include_str!("../perfil.toml");

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[layout(AppShell)]
        #[route("/")]
        Root {},
        #[route("/login")]
        Login {},
        #[route("/register")]
        Register {},
        #[layout(SignedIn)]
            #[route("/home")]
            Home {},
            #[route("/profile/edit")]
            EditProfile {},
}

impl Route {
    /// Where to send the user instead, given whether they are signed in.
    ///
    /// Register is left alone after sign-in: the account is signed in as soon
    /// as the credential exists, while the rest of registration is still
    /// running on that screen.
    fn redirect(&self, signed_in: bool) -> Option<Route> {
        match (self, signed_in) {
            (Route::Root {}, true) | (Route::Login {}, true) => Some(Route::Home {}),
            (Route::Root {}, false) | (Route::Home {}, false) | (Route::EditProfile {}, false) => {
                Some(Route::Login {})
            }
            _ => None,
        }
    }
}

fn main() {
    init_logging();
    dioxus::launch(App);
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if let Err(err) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("Logging already initialised: {err}");
    }
}

fn load_config() -> AppConfig {
    let config = AppConfig::from_toml(CONFIG_TOML).unwrap_or_else(|err| {
        tracing::warn!("Invalid {}, using defaults: {}", AppConfig::filename(), err);
        AppConfig::default()
    });
    config.with_env_overrides()
}

#[component]
fn App() -> Element {
    let config = use_context_provider(load_config);
    use_context_provider(|| Backend::from_config(&config));

    rsx! {
        document::Link { rel: "stylesheet", href: ui::MAIN_CSS }
        ui::SessionProvider {
            Router::<Route> {}
        }
    }
}

/// Holds the splash screen until the session is known and the minimum splash
/// time has passed, then keeps the user on the stack matching their session.
#[component]
fn AppShell() -> Element {
    let session = ui::use_session();
    let route = use_route::<Route>();
    let nav = use_navigator();
    let config = use_context::<AppConfig>();
    let mut splash_elapsed = use_signal(|| false);

    let splash_min = Duration::from_millis(config.ui.splash_min_millis);
    use_future(move || async move {
        ui::sleep(splash_min).await;
        splash_elapsed.set(true);
    });

    let state = session();
    if state.loading || !splash_elapsed() {
        return rsx! {
            ui::views::SplashView {}
        };
    }

    if let Some(target) = route.redirect(state.is_authenticated()) {
        nav.replace(target);
        return rsx! {};
    }

    rsx! {
        Outlet::<Route> {}
    }
}

/// Shares one profile handle between Home and EditProfile.
#[component]
fn SignedIn() -> Element {
    let config = use_context::<AppConfig>();

    rsx! {
        ui::ProfileProvider {
            live: config.sync.live_updates(),
            Outlet::<Route> {}
        }
    }
}

#[component]
fn Root() -> Element {
    rsx! {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_out_users_land_on_login() {
        for route in [Route::Root {}, Route::Home {}, Route::EditProfile {}] {
            assert_eq!(route.redirect(false), Some(Route::Login {}));
        }
        assert_eq!(Route::Login {}.redirect(false), None);
        assert_eq!(Route::Register {}.redirect(false), None);
    }

    #[test]
    fn test_signed_in_users_land_on_home() {
        assert_eq!(Route::Root {}.redirect(true), Some(Route::Home {}));
        assert_eq!(Route::Login {}.redirect(true), Some(Route::Home {}));
        assert_eq!(Route::Home {}.redirect(true), None);
        assert_eq!(Route::EditProfile {}.redirect(true), None);
        assert_eq!(Route::Register {}.redirect(true), None);
    }

    #[test]
    fn test_bundled_config_parses() {
        let config = AppConfig::from_toml(CONFIG_TOML).unwrap();
        assert!(config.sync.live_updates());
        assert_eq!(config.ui.splash_min_millis, 500);
    }
}
