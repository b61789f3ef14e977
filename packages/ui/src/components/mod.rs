mod button;
pub use button::{button_class, Button, ButtonSize, ButtonVariant};

mod input;
pub use input::{label_floats, Input};
