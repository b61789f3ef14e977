use dioxus::prelude::*;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ButtonVariant {
    #[default]
    Primary,
    Secondary,
    Danger,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ButtonSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl ButtonVariant {
    fn class(self) -> &'static str {
        match self {
            ButtonVariant::Primary => "button--primary",
            ButtonVariant::Secondary => "button--secondary",
            ButtonVariant::Danger => "button--danger",
        }
    }
}

impl ButtonSize {
    fn class(self) -> &'static str {
        match self {
            ButtonSize::Small => "button--small",
            ButtonSize::Medium => "button--medium",
            ButtonSize::Large => "button--large",
        }
    }
}

pub fn button_class(variant: ButtonVariant, size: ButtonSize, inactive: bool) -> String {
    let mut class = format!("button {} {}", variant.class(), size.class());
    if inactive {
        class.push_str(" button--disabled");
    }
    class
}

/// Pressable action. While `loading` it shows a spinner and ignores presses.
#[component]
pub fn Button(
    onclick: EventHandler<MouseEvent>,
    #[props(default)] variant: ButtonVariant,
    #[props(default)] size: ButtonSize,
    #[props(default)] loading: bool,
    #[props(default)] disabled: bool,
    children: Element,
) -> Element {
    let inactive = loading || disabled;

    rsx! {
        button {
            class: button_class(variant, size, inactive),
            disabled: inactive,
            onclick: move |evt| {
                if !inactive {
                    onclick.call(evt);
                }
            },
            if loading {
                span { class: "spinner", title: "Cargando..." }
            } else {
                {children}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_class() {
        assert_eq!(
            button_class(ButtonVariant::default(), ButtonSize::default(), false),
            "button button--primary button--medium"
        );
        assert_eq!(
            button_class(ButtonVariant::Danger, ButtonSize::Small, true),
            "button button--danger button--small button--disabled"
        );
    }
}
