use crate::config::{AppConfig, SmtpConfig, SmtpEncryption};
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Failed to build email message: {0}")]
    MessageBuild(String),
    #[error("Failed to send email: {0}")]
    SendFailed(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send_verification_email(
        &self,
        to_email: &str,
        name: &str,
        code: &str,
    ) -> Result<(), EmailError>;
    async fn send_welcome_email(&self, to_email: &str, name: &str) -> Result<(), EmailError>;
    async fn send_password_reset_email(
        &self,
        to_email: &str,
        token: &str,
    ) -> Result<(), EmailError>;
    async fn send_reset_confirmation_email(&self, to_email: &str) -> Result<(), EmailError>;
}

/// Logs outbound mail instead of sending it. Used whenever SMTP is not
/// configured, so the credential flows stay exercisable in development.
pub struct MockEmailService {
    base_url: String,
}

impl MockEmailService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send_verification_email(
        &self,
        to_email: &str,
        name: &str,
        code: &str,
    ) -> Result<(), EmailError> {
        tracing::info!("[MOCK EMAIL] Verification email to: {} ({})", to_email, name);
        tracing::info!("   Subject: Verify your email address");
        tracing::info!("   Verification code: {}", code);
        Ok(())
    }

    async fn send_welcome_email(&self, to_email: &str, name: &str) -> Result<(), EmailError> {
        tracing::info!("[MOCK EMAIL] Welcome email to: {} ({})", to_email, name);
        Ok(())
    }

    async fn send_password_reset_email(
        &self,
        to_email: &str,
        token: &str,
    ) -> Result<(), EmailError> {
        let reset_url = format!("{}/reset-password/{}", self.base_url, token);
        tracing::info!("[MOCK EMAIL] Password reset email to: {}", to_email);
        tracing::info!("   Reset link: {}", reset_url);
        Ok(())
    }

    async fn send_reset_confirmation_email(&self, to_email: &str) -> Result<(), EmailError> {
        tracing::info!("[MOCK EMAIL] Password reset confirmation to: {}", to_email);
        Ok(())
    }
}

pub struct SmtpEmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    from_name: String,
    base_url: String,
}

impl SmtpEmailService {
    pub fn new(smtp: &SmtpConfig, base_url: impl Into<String>) -> Result<Self, EmailError> {
        let credentials = Credentials::new(smtp.username.clone(), smtp.password.clone());

        let mailer = match smtp.encryption {
            SmtpEncryption::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
                .map_err(|e| EmailError::ConfigError(format!("SMTP relay error: {}", e)))?
                .port(smtp.port)
                .credentials(credentials)
                .build(),
            SmtpEncryption::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
                    .map_err(|e| EmailError::ConfigError(format!("SMTP starttls error: {}", e)))?
                    .port(smtp.port)
                    .credentials(credentials)
                    .build()
            }
            SmtpEncryption::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
                    .port(smtp.port)
                    .credentials(credentials)
                    .build()
            }
        };

        Ok(Self {
            mailer,
            from_email: smtp.from_email.clone(),
            from_name: smtp.from_name.clone(),
            base_url: base_url.into(),
        })
    }

    async fn send_html(
        &self,
        to_email: &str,
        subject: &str,
        html_body: String,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                format!("{} <{}>", self.from_name, self.from_email)
                    .parse()
                    .map_err(|e| {
                        EmailError::MessageBuild(format!("Invalid from address: {}", e))
                    })?,
            )
            .to(to_email
                .parse()
                .map_err(|e| EmailError::MessageBuild(format!("Invalid to address: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body)
            .map_err(|e| EmailError::MessageBuild(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| EmailError::SendFailed(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send_verification_email(
        &self,
        to_email: &str,
        name: &str,
        code: &str,
    ) -> Result<(), EmailError> {
        let html_body = format!(
            r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
</head>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1 style="color: #333;">Hello {}!</h1>
    <p>Thank you for signing up. Enter this code to verify your email address:</p>
    <p style="text-align: center; margin: 30px 0;">
        <span style="font-size: 32px; letter-spacing: 8px; font-weight: bold;">{}</span>
    </p>
    <p style="color: #999; font-size: 12px; margin-top: 40px;">This code will expire in 24 hours.</p>
</body>
</html>
"#,
            name, code
        );

        self.send_html(to_email, "Verify your email address", html_body)
            .await
    }

    async fn send_welcome_email(&self, to_email: &str, name: &str) -> Result<(), EmailError> {
        let html_body = format!(
            r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
</head>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1 style="color: #333;">Welcome, {}!</h1>
    <p>Your email address has been verified and your account is ready to use.</p>
</body>
</html>
"#,
            name
        );

        self.send_html(to_email, "Welcome aboard", html_body).await
    }

    async fn send_password_reset_email(
        &self,
        to_email: &str,
        token: &str,
    ) -> Result<(), EmailError> {
        let reset_url = format!("{}/reset-password/{}", self.base_url, token);

        let html_body = format!(
            r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
</head>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1 style="color: #333;">Reset your password</h1>
    <p>We received a request to reset your password. Click the button below to choose a new one:</p>
    <p style="text-align: center; margin: 30px 0;">
        <a href="{}" style="background-color: #4CAF50; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px; display: inline-block;">Reset Password</a>
    </p>
    <p style="color: #666; font-size: 14px;">Or copy and paste this link into your browser:</p>
    <p style="color: #666; font-size: 14px; word-break: break-all;">{}</p>
    <p style="color: #999; font-size: 12px; margin-top: 40px;">This link will expire in 1 hour. If you didn't request a reset, you can safely ignore this email.</p>
</body>
</html>
"#,
            reset_url, reset_url
        );

        self.send_html(to_email, "Reset your password", html_body)
            .await
    }

    async fn send_reset_confirmation_email(&self, to_email: &str) -> Result<(), EmailError> {
        let html_body = r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
</head>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1 style="color: #333;">Password changed</h1>
    <p>Your password was reset successfully. If this wasn't you, contact support immediately.</p>
</body>
</html>
"#
        .to_string();

        self.send_html(to_email, "Your password was changed", html_body)
            .await
    }
}

pub fn create_email_service(config: &AppConfig) -> Box<dyn EmailService> {
    if let Some(smtp) = &config.smtp {
        match SmtpEmailService::new(smtp, config.base_url.clone()) {
            Ok(service) => {
                tracing::info!("Using SMTP email service");
                Box::new(service)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize SMTP email service: {}. Falling back to mock service",
                    e
                );
                Box::new(MockEmailService::new(config.base_url.clone()))
            }
        }
    } else {
        tracing::info!(
            "SMTP not configured. Using mock email service (emails will be logged to console)"
        );
        Box::new(MockEmailService::new(config.base_url.clone()))
    }
}
