use api::messages;
use dioxus::prelude::*;

use crate::components::{Button, ButtonVariant};
use crate::views::{ConfirmDialog, Notice};
use crate::{use_backend, use_profile_context, use_session};

/// Greeting name: the stored name, else the account's display name, else a
/// generic fallback.
fn greeting_name(record_name: &str, display_name: Option<&str>) -> String {
    [Some(record_name), display_name]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
        .unwrap_or(messages::DEFAULT_GREETING_NAME)
        .to_string()
}

#[component]
fn ProfileRow(label: String, value: String) -> Element {
    rsx! {
        div {
            class: "profile-row",
            span { class: "profile-row__label", "{label}" }
            span { class: "profile-row__value", "{value}" }
        }
    }
}

/// Profile summary for the signed-in user.
#[component]
pub fn HomeView(on_edit: EventHandler<()>) -> Element {
    let backend = use_backend();
    let retry_backend = backend.clone();
    let mut session = use_session();
    let mut profile = use_profile_context();
    let mut confirm_sign_out = use_signal(|| false);
    let mut signing_out = use_signal(|| false);
    let mut sign_out_failed = use_signal(|| false);

    let handle_sign_out = move |_| {
        confirm_sign_out.set(false);
        signing_out.set(true);
        let auth = backend.auth.clone();
        spawn(async move {
            if api::session::sign_out(auth.as_ref()).await.is_err() {
                sign_out_failed.set(true);
            }
            signing_out.set(false);
        });
    };

    let handle_retry = move |_| {
        let auth = retry_backend.auth.clone();
        spawn(async move {
            let reloaded = api::session::reload(auth.as_ref()).await;
            session.with_mut(|s| s.apply(reloaded));
            profile.refresh();
        });
    };

    let state = profile.state.read().clone();

    if state.loading {
        return rsx! {
            div {
                class: "screen screen--centered",
                div { class: "spinner spinner--large" }
                p { class: "screen-muted", "Cargando datos..." }
            }
        };
    }

    if let Some(error) = &state.error {
        return rsx! {
            div {
                class: "screen screen--centered",
                p { class: "error-text", "{error}" }
                Button {
                    onclick: handle_retry,
                    "Reintentar"
                }
            }
        };
    }

    let record = state.profile.map(|p| p.record).unwrap_or_default();
    let account = session.read().user_data();
    let display_name = account.as_ref().and_then(|a| a.display_name.clone());
    let name = greeting_name(&record.name, display_name.as_deref());
    let verified = account.as_ref().is_some_and(|a| a.email_verified);
    let created_at = account.as_ref().and_then(|a| a.created_at);

    rsx! {
        div {
            class: "screen",
            div {
                class: "home-header",
                p { class: "home-header__greeting", "¡Hola!" }
                h1 { class: "home-header__name", "{name}" }
            }

            div {
                class: "profile-card",
                h2 { class: "profile-card__title", "Mi Perfil" }
                ProfileRow { label: "Nombre", value: messages::or_not_available(&record.name).to_string() }
                ProfileRow { label: "Correo", value: messages::or_not_available(&record.email).to_string() }
                ProfileRow { label: "Edad", value: messages::age_label(&record.age) }
                ProfileRow { label: "Especialidad", value: messages::or_not_available(&record.specialty).to_string() }
                ProfileRow { label: "Correo verificado", value: messages::verification_label(verified).to_string() }
                ProfileRow { label: "Miembro desde", value: messages::member_since(created_at) }

                div {
                    class: "profile-card__actions",
                    Button {
                        onclick: move |_| on_edit.call(()),
                        "Editar Perfil"
                    }
                    Button {
                        variant: ButtonVariant::Danger,
                        loading: signing_out(),
                        onclick: move |_| confirm_sign_out.set(true),
                        "Cerrar Sesión"
                    }
                }
            }

            if confirm_sign_out() {
                ConfirmDialog {
                    title: "Cerrar Sesión",
                    message: messages::CONFIRM_SIGN_OUT.to_string(),
                    confirm_label: "Cerrar Sesión",
                    cancel_label: "Cancelar",
                    destructive: true,
                    on_confirm: handle_sign_out,
                    on_cancel: move |_| confirm_sign_out.set(false),
                }
            }

            if sign_out_failed() {
                Notice {
                    title: "Error",
                    message: messages::SIGN_OUT_FAILED.to_string(),
                    action_label: "Aceptar",
                    on_action: move |_| sign_out_failed.set(false),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_name_fallbacks() {
        assert_eq!(greeting_name("Ana", Some("Otra")), "Ana");
        assert_eq!(greeting_name(" ", Some("Ana")), "Ana");
        assert_eq!(greeting_name("", None), "Usuario");
    }
}
