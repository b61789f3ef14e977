use dioxus::prelude::*;

/// The label sits inside the field until it is focused or filled.
pub fn label_floats(focused: bool, value: &str) -> bool {
    focused || !value.is_empty()
}

/// Labeled text field with an error line underneath.
#[component]
pub fn Input(
    id: String,
    label: String,
    value: String,
    oninput: EventHandler<String>,
    /// Empty when the field is valid.
    #[props(default)]
    error: String,
    #[props(default = "text".to_string())] input_type: String,
    /// Bring up the numeric keypad.
    #[props(default)]
    numeric: bool,
    #[props(default)] disabled: bool,
    #[props(default)] hint: String,
) -> Element {
    let mut focused = use_signal(|| false);

    let mut field_class = String::from("field");
    if label_floats(focused(), &value) {
        field_class.push_str(" field--floating");
    }
    if focused() {
        field_class.push_str(" field--focused");
    }
    if !error.is_empty() {
        field_class.push_str(" field--error");
    }
    if disabled {
        field_class.push_str(" field--disabled");
    }

    rsx! {
        div {
            class: "{field_class}",
            label { class: "field__label", r#for: "{id}", "{label}" }
            input {
                id: "{id}",
                class: "field__input",
                r#type: "{input_type}",
                "inputmode": if numeric { "numeric" } else { "text" },
                value: "{value}",
                disabled: disabled,
                onfocus: move |_| focused.set(true),
                onblur: move |_| focused.set(false),
                oninput: move |evt: FormEvent| oninput.call(evt.value()),
            }
            if !error.is_empty() {
                p { class: "field__error", "{error}" }
            } else if !hint.is_empty() {
                p { class: "field__hint", "{hint}" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_floats_when_focused_or_filled() {
        assert!(!label_floats(false, ""));
        assert!(label_floats(true, ""));
        assert!(label_floats(false, "ana"));
    }
}
