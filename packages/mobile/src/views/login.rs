use dioxus::prelude::*;
use ui::views::{LoginView, RegisterView};

use crate::Route;

#[component]
pub fn Login() -> Element {
    let nav = use_navigator();

    rsx! {
        LoginView {
            on_register: move |_| {
                nav.push(Route::Register {});
            },
        }
    }
}

#[component]
pub fn Register() -> Element {
    let nav = use_navigator();

    rsx! {
        RegisterView {
            on_login: move |_| {
                nav.replace(Route::Login {});
            },
            on_registered: move |_| {
                nav.replace(Route::Home {});
            },
        }
    }
}
