mod modal_overlay;
pub use modal_overlay::{ConfirmDialog, ModalOverlay, Notice};

mod splash;
pub use splash::SplashView;

mod login;
pub use login::LoginView;

mod register;
pub use register::RegisterView;

mod home;
pub use home::HomeView;

mod edit_profile;
pub use edit_profile::EditProfileView;
