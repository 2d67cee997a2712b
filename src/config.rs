use std::env;

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha512};
use time::Duration;
use tower_sessions::{
    cookie::{Key, SameSite},
    service::SignedCookie,
    Expiry, SessionManagerLayer,
};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::warn;

/// Convenience alias for the signed session layer produced by `AppConfig`.
pub type SessionLayer = SessionManagerLayer<SqliteStore, SignedCookie>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpEncryption {
    Tls,
    StartTls,
    None,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    pub encryption: SmtpEncryption,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub burst: u32,
    pub period_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub expiry: Duration,
    pub name: String,
}

/// Explicit configuration for the whole service. Everything environment-
/// sourced is read once here and injected; nothing reads env vars at
/// request time.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    /// Base URL used to build password-reset links.
    pub base_url: String,
    pub session_secret: Option<String>,
    pub session: SessionSettings,
    /// Argon2 time-cost parameter for password hashing.
    pub hash_cost: u32,
    pub smtp: Option<SmtpConfig>,
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let is_production = environment == "production";

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/altauth.db".to_string());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let session_secret = env::var("SESSION_SECRET").ok().filter(|s| !s.is_empty());
        if is_production && session_secret.is_none() {
            anyhow::bail!("SESSION_SECRET must be set in production");
        }

        let session = if is_production {
            SessionSettings {
                secure: true,
                http_only: true,
                same_site: SameSite::Strict,
                expiry: Duration::hours(2),
                name: "__Host-session".to_string(),
            }
        } else {
            SessionSettings {
                secure: false,
                http_only: true,
                same_site: SameSite::Lax,
                expiry: Duration::days(7),
                name: "session".to_string(),
            }
        };

        let hash_cost = env::var("HASH_COST")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) => Some(SmtpConfig {
                host,
                port: env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse::<u16>()
                    .context("Invalid SMTP_PORT")?,
                username: env::var("SMTP_USERNAME").context("SMTP_USERNAME not set")?,
                password: env::var("SMTP_PASSWORD").context("SMTP_PASSWORD not set")?,
                from_email: env::var("SMTP_FROM_EMAIL").context("SMTP_FROM_EMAIL not set")?,
                from_name: env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "altauth".to_string()),
                encryption: parse_encryption(
                    &env::var("SMTP_ENCRYPTION").unwrap_or_else(|_| "starttls".to_string()),
                )?,
            }),
            Err(_) => None,
        };

        // Source defaults: 2 requests per 5 minutes per client IP.
        let rate_limit = RateLimitConfig {
            burst: env::var("RATE_LIMIT_BURST")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(2),
            period_secs: env::var("RATE_LIMIT_PERIOD_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(150),
        };

        Ok(Self {
            database_url,
            bind_addr,
            base_url,
            session_secret,
            session,
            hash_cost,
            smtp,
            rate_limit,
        })
    }

    pub fn create_session_layer(&self, store: SqliteStore) -> SessionLayer {
        let key = self.load_session_key();

        SessionManagerLayer::new(store)
            .with_secure(self.session.secure)
            .with_http_only(self.session.http_only)
            .with_same_site(self.session.same_site)
            .with_name(self.session.name.clone())
            .with_expiry(Expiry::OnInactivity(self.session.expiry))
            .with_signed(key)
    }

    fn load_session_key(&self) -> Key {
        match &self.session_secret {
            Some(secret) => {
                let bytes = decode_secret_bytes(secret);
                key_from_secret_bytes(&bytes)
            }
            None => {
                warn!("SESSION_SECRET not set; generating ephemeral key (development only)");
                Key::generate()
            }
        }
    }
}

fn parse_encryption(value: &str) -> anyhow::Result<SmtpEncryption> {
    match value.to_lowercase().as_str() {
        "tls" => Ok(SmtpEncryption::Tls),
        "starttls" => Ok(SmtpEncryption::StartTls),
        "none" => Ok(SmtpEncryption::None),
        other => anyhow::bail!(
            "Invalid SMTP_ENCRYPTION value: {}. Use 'tls', 'starttls', or 'none'",
            other
        ),
    }
}

fn decode_secret_bytes(secret: &str) -> Vec<u8> {
    STANDARD
        .decode(secret.as_bytes())
        .unwrap_or_else(|_| secret.as_bytes().to_vec())
}

fn key_from_secret_bytes(bytes: &[u8]) -> Key {
    if bytes.len() >= 64 {
        Key::from(&bytes[..64])
    } else {
        let digest = Sha512::digest(bytes);
        Key::from(digest.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_secrets_are_stretched_to_key_length() {
        let key = key_from_secret_bytes(b"short secret");
        assert!(!key.master().is_empty());
    }

    #[test]
    fn base64_secrets_are_decoded() {
        let encoded = STANDARD.encode([7u8; 64]);
        let decoded = decode_secret_bytes(&encoded);
        assert_eq!(decoded, vec![7u8; 64]);
    }

    #[test]
    fn non_base64_secrets_fall_back_to_raw_bytes() {
        let decoded = decode_secret_bytes("not base64 at all!!!");
        assert_eq!(decoded, b"not base64 at all!!!".to_vec());
    }

    #[test]
    fn encryption_parsing_accepts_known_modes() {
        assert_eq!(parse_encryption("TLS").unwrap(), SmtpEncryption::Tls);
        assert_eq!(
            parse_encryption("starttls").unwrap(),
            SmtpEncryption::StartTls
        );
        assert_eq!(parse_encryption("none").unwrap(), SmtpEncryption::None);
        assert!(parse_encryption("smoke-signals").is_err());
    }
}
