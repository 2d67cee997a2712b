use crate::services::email_service::EmailService;
use tokio::sync::mpsc;

/// Outbound notification intent. The credential flows emit these and move
/// on; delivery happens on a separate worker task so an SMTP failure can
/// never abort a committed state transition.
#[derive(Debug, Clone)]
pub enum Notification {
    Verification {
        to: String,
        name: String,
        code: String,
    },
    Welcome {
        to: String,
        name: String,
    },
    PasswordReset {
        to: String,
        token: String,
    },
    ResetConfirmation {
        to: String,
    },
}

impl Notification {
    fn kind(&self) -> &'static str {
        match self {
            Notification::Verification { .. } => "verification",
            Notification::Welcome { .. } => "welcome",
            Notification::PasswordReset { .. } => "password-reset",
            Notification::ResetConfirmation { .. } => "reset-confirmation",
        }
    }

    fn recipient(&self) -> &str {
        match self {
            Notification::Verification { to, .. }
            | Notification::Welcome { to, .. }
            | Notification::PasswordReset { to, .. }
            | Notification::ResetConfirmation { to } => to,
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Spawn the delivery worker and return a handle for dispatching
    /// intents to it.
    pub fn spawn(email_service: Box<dyn EmailService>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();

        tokio::spawn(async move {
            while let Some(intent) = rx.recv().await {
                let kind = intent.kind();
                let recipient = intent.recipient().to_string();

                let outcome = match &intent {
                    Notification::Verification { to, name, code } => {
                        email_service.send_verification_email(to, name, code).await
                    }
                    Notification::Welcome { to, name } => {
                        email_service.send_welcome_email(to, name).await
                    }
                    Notification::PasswordReset { to, token } => {
                        email_service.send_password_reset_email(to, token).await
                    }
                    Notification::ResetConfirmation { to } => {
                        email_service.send_reset_confirmation_email(to).await
                    }
                };

                match outcome {
                    Ok(()) => {
                        tracing::info!("Sent {} email to {}", kind, recipient);
                    }
                    Err(e) => {
                        tracing::error!("Failed to send {} email to {}: {}", kind, recipient, e);
                    }
                }
            }
        });

        Self { tx }
    }

    /// Fire-and-forget: a closed channel is logged and swallowed, never
    /// surfaced to the request path.
    pub fn dispatch(&self, intent: Notification) {
        let kind = intent.kind();
        if self.tx.send(intent).is_err() {
            tracing::warn!("Notification worker gone; dropping {} email", kind);
        }
    }
}
