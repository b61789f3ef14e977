use dioxus::prelude::*;

use crate::components::{Button, ButtonVariant};

/// A full-screen overlay that centers its children in a modal card.
/// Tapping outside the card triggers `on_close`.
#[component]
pub fn ModalOverlay(on_close: EventHandler<()>, children: Element) -> Element {
    rsx! {
        div {
            class: "modal-overlay",
            onclick: move |_| on_close.call(()),
            div {
                class: "modal-card",
                onclick: move |evt: Event<MouseData>| evt.stop_propagation(),
                {children}
            }
        }
    }
}

/// Two-choice prompt. Dismissing the overlay counts as cancelling.
#[component]
pub fn ConfirmDialog(
    title: String,
    message: String,
    confirm_label: String,
    cancel_label: String,
    #[props(default)] destructive: bool,
    on_confirm: EventHandler<()>,
    on_cancel: EventHandler<()>,
) -> Element {
    rsx! {
        ModalOverlay {
            on_close: move |_| on_cancel.call(()),
            h2 { class: "modal-title", "{title}" }
            p { class: "modal-message", "{message}" }
            div {
                class: "modal-actions",
                Button {
                    variant: ButtonVariant::Secondary,
                    onclick: move |_| on_cancel.call(()),
                    "{cancel_label}"
                }
                Button {
                    variant: if destructive { ButtonVariant::Danger } else { ButtonVariant::Primary },
                    onclick: move |_| on_confirm.call(()),
                    "{confirm_label}"
                }
            }
        }
    }
}

/// Single-action message; the action is the only way out.
#[component]
pub fn Notice(
    title: String,
    message: String,
    action_label: String,
    on_action: EventHandler<()>,
) -> Element {
    rsx! {
        ModalOverlay {
            on_close: move |_| {},
            h2 { class: "modal-title", "{title}" }
            p { class: "modal-message", "{message}" }
            div {
                class: "modal-actions",
                Button {
                    onclick: move |_| on_action.call(()),
                    "{action_label}"
                }
            }
        }
    }
}
