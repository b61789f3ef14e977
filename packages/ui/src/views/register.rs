use api::{messages, RegisterForm};
use dioxus::prelude::*;

use crate::components::{Button, ButtonSize, Input};
use crate::views::Notice;
use crate::{use_backend, use_session};

/// Account creation form.
///
/// On success a notice is shown; its action calls `on_registered`. The new
/// account is already signed in at that point.
#[component]
pub fn RegisterView(on_login: EventHandler<()>, on_registered: EventHandler<()>) -> Element {
    let backend = use_backend();
    let mut session = use_session();
    let mut form = use_signal(RegisterForm::default);
    let mut registered = use_signal(|| false);

    let handle_register = move |_| {
        let Some(account) = form.with_mut(|f| f.begin()) else {
            return;
        };
        let backend = backend.clone();
        spawn(async move {
            let result = api::create_account(&backend, &account).await;
            if let Ok(created) = &result {
                session.with_mut(|s| s.apply(Some(created.clone())));
            }
            if form.with_mut(|f| f.finish(result)) {
                registered.set(true);
            }
        });
    };

    let state = form();

    rsx! {
        div {
            class: "screen",
            div {
                class: "screen-header",
                h1 { class: "screen-title", "Crear Cuenta" }
                p { class: "screen-subtitle", "Únete a nosotros" }
            }

            Input {
                id: "register-name",
                label: "Nombre completo",
                value: state.name.clone(),
                oninput: move |v: String| form.with_mut(|f| f.name = v),
            }
            Input {
                id: "register-email",
                label: "Correo electrónico",
                input_type: "email",
                value: state.email.clone(),
                oninput: move |v: String| form.with_mut(|f| f.email = v),
            }
            Input {
                id: "register-password",
                label: "Contraseña",
                input_type: "password",
                value: state.password.clone(),
                oninput: move |v: String| form.with_mut(|f| f.password = v),
            }
            Input {
                id: "register-age",
                label: "Edad",
                numeric: true,
                value: state.age.clone(),
                oninput: move |v: String| form.with_mut(|f| f.age = v),
            }
            Input {
                id: "register-specialty",
                label: "Especialidad",
                value: state.specialty.clone(),
                oninput: move |v: String| form.with_mut(|f| f.specialty = v),
            }

            if let Some(error) = &state.error {
                div { class: "error-banner", "{error}" }
            }

            Button {
                size: ButtonSize::Large,
                disabled: state.loading,
                onclick: handle_register,
                if state.loading { "Registrando..." } else { "Crear Cuenta" }
            }

            button {
                class: "link",
                disabled: state.loading,
                onclick: move |_| on_login.call(()),
                "¿Ya tienes cuenta? Inicia sesión aquí"
            }

            if registered() {
                Notice {
                    title: "¡Registro Exitoso!",
                    message: messages::ACCOUNT_CREATED.to_string(),
                    action_label: "Continuar",
                    on_action: move |_| on_registered.call(()),
                }
            }
        }
    }
}
