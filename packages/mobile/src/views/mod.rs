mod login;
pub use login::{Login, Register};

mod profile;
pub use profile::{EditProfile, Home};
