use api::{has_changes, messages, Field, ProfileDraft, ProfileEditState, SaveOutcome, SavedProfile};
use dioxus::prelude::*;

use crate::components::{Button, ButtonSize, ButtonVariant, Input};
use crate::views::{ConfirmDialog, Notice};
use crate::{use_backend, use_profile_context, use_session};

#[derive(Clone, PartialEq)]
enum EditNotice {
    Unchanged,
    Saved(SavedProfile),
}

/// Profile editor.
///
/// After a successful save the user acknowledges a notice, then `on_saved`
/// is called with the stored profile followed by `on_close`.
#[component]
pub fn EditProfileView(on_saved: EventHandler<SavedProfile>, on_close: EventHandler<()>) -> Element {
    let backend = use_backend();
    let session = use_session();
    let profile = use_profile_context();
    let mut draft = use_signal(ProfileDraft::default);
    let mut edit = use_signal(ProfileEditState::default);
    let mut notice = use_signal(|| Option::<EditNotice>::None);
    let mut confirm_discard = use_signal(|| false);
    let mut prefilled = use_signal(|| false);

    // Fill the draft once the profile is available.
    use_effect(move || {
        let state = profile.state.read();
        if let Some(record) = state.record() {
            if !*prefilled.peek() {
                draft.set(ProfileDraft::from_record(record));
                prefilled.set(true);
            }
        }
    });

    let mut set_field = move |field: Field, value: String| {
        draft.with_mut(|d| match field {
            Field::Name => d.name = value,
            Field::Age => d.age = value,
            Field::Specialty => d.specialty = value,
            Field::Email | Field::Password => {}
        });
        if edit.peek().error.is_some() || !edit.peek().field_errors.is_empty() {
            edit.with_mut(|e| e.clear_error());
        }
    };

    let handle_save = move |_| {
        let Some(current_session) = session.peek().session.clone() else {
            return;
        };
        let current = profile.state.peek().profile.clone();
        let current_draft = draft.peek().clone();
        let begun = edit.with_mut(|e| e.begin(current.as_ref().map(|c| &c.record), &current_draft));
        let valid = match begun {
            Ok(valid) => valid,
            Err(SaveOutcome::Unchanged) => {
                notice.set(Some(EditNotice::Unchanged));
                return;
            }
            Err(_) => return,
        };
        let backend = backend.clone();
        spawn(async move {
            let result = api::save_profile(&backend, &current_session, current.as_ref(), &valid).await;
            if let SaveOutcome::Saved(saved) = edit.with_mut(|e| e.finish(result)) {
                notice.set(Some(EditNotice::Saved(saved)));
            }
        });
    };

    let handle_cancel = move |_| {
        let original = profile.state.peek().record().cloned().unwrap_or_default();
        if has_changes(Some(&original), &draft.peek()) {
            confirm_discard.set(true);
        } else {
            on_close.call(());
        }
    };

    let profile_state = profile.state.read().clone();
    if profile_state.loading && !prefilled() {
        return rsx! {
            div {
                class: "screen screen--centered",
                div { class: "spinner spinner--large" }
                p { class: "screen-muted", "Cargando datos..." }
            }
        };
    }

    let email = profile_state
        .record()
        .map(|r| r.email.clone())
        .filter(|e| !e.is_empty())
        .or_else(|| session.read().session.as_ref().map(|s| s.email.clone()))
        .unwrap_or_default();
    let values = draft();
    let status = edit();
    let field_error = |field: Field| status.field_errors.get(field).unwrap_or_default().to_string();

    rsx! {
        div {
            class: "screen",
            div {
                class: "screen-header",
                h1 { class: "screen-title", "Editar Perfil" }
                p { class: "screen-subtitle", "Actualiza tu información personal" }
            }

            Input {
                id: "edit-name",
                label: "Nombre completo",
                value: values.name.clone(),
                error: field_error(Field::Name),
                oninput: move |v: String| set_field(Field::Name, v),
            }
            Input {
                id: "edit-email",
                label: "Correo electrónico",
                value: email,
                disabled: true,
                hint: messages::EMAIL_READ_ONLY.to_string(),
                oninput: move |_| {},
            }
            Input {
                id: "edit-age",
                label: "Edad",
                numeric: true,
                value: values.age.clone(),
                error: field_error(Field::Age),
                oninput: move |v: String| set_field(Field::Age, v),
            }
            Input {
                id: "edit-specialty",
                label: "Especialidad",
                value: values.specialty.clone(),
                error: field_error(Field::Specialty),
                oninput: move |v: String| set_field(Field::Specialty, v),
            }

            if let Some(error) = &status.error {
                div { class: "error-banner", "{error}" }
            }

            div {
                class: "form-actions",
                Button {
                    size: ButtonSize::Large,
                    disabled: status.loading,
                    onclick: handle_save,
                    if status.loading { "Guardando..." } else { "Guardar Cambios" }
                }
                Button {
                    variant: ButtonVariant::Secondary,
                    disabled: status.loading,
                    onclick: handle_cancel,
                    "Cancelar"
                }
            }

            {
                match notice() {
                    Some(EditNotice::Unchanged) => rsx! {
                        Notice {
                            title: "Sin cambios",
                            message: messages::NO_CHANGES.to_string(),
                            action_label: "Aceptar",
                            on_action: move |_| notice.set(None),
                        }
                    },
                    Some(EditNotice::Saved(saved)) => rsx! {
                        Notice {
                            title: "¡Éxito!",
                            message: messages::PROFILE_SAVED.to_string(),
                            action_label: "Continuar",
                            on_action: move |_| {
                                notice.set(None);
                                on_saved.call(saved.clone());
                                on_close.call(());
                            },
                        }
                    },
                    None => rsx! {},
                }
            }

            if confirm_discard() {
                ConfirmDialog {
                    title: "Cancelar Cambios",
                    message: messages::DISCARD_CHANGES.to_string(),
                    confirm_label: "Cancelar",
                    cancel_label: "Continuar Editando",
                    destructive: true,
                    on_confirm: move |_| {
                        confirm_discard.set(false);
                        on_close.call(());
                    },
                    on_cancel: move |_| confirm_discard.set(false),
                }
            }
        }
    }
}
