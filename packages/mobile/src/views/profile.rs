use dioxus::prelude::*;
use ui::use_profile_context;
use ui::views::{EditProfileView, HomeView};

use crate::Route;

#[component]
pub fn Home() -> Element {
    let nav = use_navigator();

    rsx! {
        HomeView {
            on_edit: move |_| {
                nav.push(Route::EditProfile {});
            },
        }
    }
}

#[component]
pub fn EditProfile() -> Element {
    let nav = use_navigator();
    let mut profile = use_profile_context();

    rsx! {
        EditProfileView {
            on_saved: move |saved| {
                profile.apply_saved(&saved);
                profile.refresh();
            },
            on_close: move |_| {
                if nav.can_go_back() {
                    nav.go_back();
                } else {
                    nav.replace(Route::Home {});
                }
            },
        }
    }
}
