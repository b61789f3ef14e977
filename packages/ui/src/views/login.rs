use api::LoginForm;
use dioxus::prelude::*;
use store::CredentialService;

use crate::components::{Button, ButtonSize, Input};
use crate::use_backend;

/// Email and password sign-in. Navigation after success is driven by the
/// session change, not by this view.
#[component]
pub fn LoginView(on_register: EventHandler<()>) -> Element {
    let backend = use_backend();
    let mut form = use_signal(LoginForm::default);

    let handle_login = move |_| {
        let Some(request) = form.with_mut(|f| f.begin()) else {
            return;
        };
        let auth = backend.auth.clone();
        spawn(async move {
            let result = auth.sign_in(&request.email, &request.password).await;
            form.with_mut(|f| f.finish(result));
        });
    };

    let state = form();

    rsx! {
        div {
            class: "screen screen--centered",
            h1 { class: "screen-title", "Iniciar Sesión" }

            Input {
                id: "login-email",
                label: "Correo electrónico",
                input_type: "email",
                value: state.email.clone(),
                oninput: move |v: String| form.with_mut(|f| f.email = v),
            }
            Input {
                id: "login-password",
                label: "Contraseña",
                input_type: "password",
                value: state.password.clone(),
                oninput: move |v: String| form.with_mut(|f| f.password = v),
            }

            if let Some(error) = &state.error {
                div { class: "error-banner", "{error}" }
            }

            Button {
                size: ButtonSize::Large,
                disabled: state.loading,
                onclick: handle_login,
                if state.loading { "Cargando..." } else { "Entrar" }
            }

            button {
                class: "link",
                onclick: move |_| on_register.call(()),
                "¿No tienes cuenta? Regístrate aquí"
            }
        }
    }
}
