use dioxus::prelude::*;

/// Shown while the initial session state is being resolved.
#[component]
pub fn SplashView() -> Element {
    rsx! {
        div {
            class: "splash",
            div { class: "splash__logo", "P" }
            h1 { class: "splash__title", "Perfil" }
            p { class: "splash__subtitle", "Cargando..." }
        }
    }
}
