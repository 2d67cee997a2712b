pub mod account_service;
pub mod email_service;
pub mod notifier;

pub use account_service::{AccountService, AccountServiceError};
pub use email_service::{create_email_service, EmailService, MockEmailService, SmtpEmailService};
pub use notifier::{Notification, Notifier};
