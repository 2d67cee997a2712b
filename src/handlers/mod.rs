pub mod auth_handlers;

pub use auth_handlers::{
    forgot_password_handler, health_handler, login_handler, logout_handler,
    reset_password_handler, signup_handler, verify_email_handler,
};
