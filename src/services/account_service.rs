use crate::models::user::User;
use crate::repositories::user_repository::{
    format_timestamp, RepositoryError, UserRepository,
};
use crate::services::notifier::{Notification, Notifier};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString},
    Algorithm, Argon2, Params, PasswordVerifier, Version,
};
use chrono::{Duration, Utc};
use rand::Rng;
use std::sync::Arc;

const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;
const RESET_TOKEN_TTL_HOURS: i64 = 1;

#[derive(Debug, thiserror::Error)]
pub enum AccountServiceError {
    #[error("All fields are required")]
    MissingFields,
    #[error("User already exists")]
    EmailTaken,
    #[error("User not found")]
    UserNotFound,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// The credential & token lifecycle: signup, email verification, login,
/// and the password-reset challenge. Persistence, hashing, and email
/// delivery are collaborators; this service owns the state transitions.
pub struct AccountService {
    repository: Arc<dyn UserRepository>,
    notifier: Notifier,
    hash_params: Params,
}

impl AccountService {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        notifier: Notifier,
        hash_cost: u32,
    ) -> Result<Self, AccountServiceError> {
        let hash_params = Params::new(
            Params::DEFAULT_M_COST,
            hash_cost.max(Params::MIN_T_COST),
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| AccountServiceError::Hashing(e.to_string()))?;

        Ok(Self {
            repository,
            notifier,
            hash_params,
        })
    }

    /// Create an unverified account with a pending verification challenge
    /// and kick off the verification email.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AccountServiceError> {
        let name = name.trim();
        let email = normalize_email(email);
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AccountServiceError::MissingFields);
        }

        if self.repository.find_by_email(&email).await?.is_some() {
            return Err(AccountServiceError::EmailTaken);
        }

        let password_hash = self.hash_password(password)?;
        let code = generate_verification_code();
        let expires = format_timestamp(Utc::now() + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS));

        // Two racing signups on the same email both pass the pre-check;
        // the unique index resolves the race and the loser sees a
        // conflict, not a crash.
        let user = match self
            .repository
            .create_user(name, &email, &password_hash, &code, &expires)
            .await
        {
            Ok(user) => user,
            Err(RepositoryError::AlreadyExists) => return Err(AccountServiceError::EmailTaken),
            Err(e) => return Err(e.into()),
        };

        self.notifier.dispatch(Notification::Verification {
            to: user.email.clone(),
            name: user.name.clone(),
            code,
        });

        Ok(user)
    }

    /// Consume a verification challenge. The lookup only matches an
    /// unexpired token, so a stale code is rejected even when the stored
    /// value still matches, and a second submission fails because the
    /// columns were already cleared.
    pub async fn verify_email(&self, code: &str) -> Result<User, AccountServiceError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AccountServiceError::InvalidToken);
        }

        let mut user = self
            .repository
            .find_by_active_verification_token(code)
            .await?
            .ok_or(AccountServiceError::InvalidToken)?;

        self.repository.mark_verified(user.id).await?;
        user.is_verified = true;
        user.verification_token = None;
        user.verification_expires = None;

        // Best-effort: verification is committed whether or not this mail
        // ever leaves the building.
        self.notifier.dispatch(Notification::Welcome {
            to: user.email.clone(),
            name: user.name.clone(),
        });

        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AccountServiceError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AccountServiceError::MissingFields);
        }

        let mut user = self
            .repository
            .find_by_email(&email)
            .await?
            .ok_or(AccountServiceError::UserNotFound)?;

        if !self.verify_password(password, &user.password_hash) {
            return Err(AccountServiceError::InvalidCredentials);
        }

        user.last_login = self.repository.touch_last_login(user.id).await?;

        Ok(user)
    }

    /// Attach a reset challenge and email the link. The raw token is only
    /// ever delivered by mail, never returned to the caller.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AccountServiceError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AccountServiceError::MissingFields);
        }

        let user = self
            .repository
            .find_by_email(&email)
            .await?
            .ok_or(AccountServiceError::UserNotFound)?;

        let token = generate_reset_token();
        let expires = format_timestamp(Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS));

        self.repository
            .set_reset_challenge(user.id, &token, &expires)
            .await?;

        self.notifier.dispatch(Notification::PasswordReset {
            to: user.email.clone(),
            token,
        });

        Ok(())
    }

    /// Consume a reset challenge: replace the hash and clear both reset
    /// columns in one update. No session is issued; the user logs in again.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), AccountServiceError> {
        if new_password.is_empty() {
            return Err(AccountServiceError::MissingFields);
        }
        let token = token.trim();
        if token.is_empty() {
            return Err(AccountServiceError::InvalidToken);
        }

        let user = self
            .repository
            .find_by_active_reset_token(token)
            .await?
            .ok_or(AccountServiceError::InvalidToken)?;

        let password_hash = self.hash_password(new_password)?;
        self.repository
            .replace_password(user.id, &password_hash)
            .await?;

        self.notifier.dispatch(Notification::ResetConfirmation {
            to: user.email.clone(),
        });

        Ok(())
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<User, AccountServiceError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(AccountServiceError::UserNotFound)
    }

    fn hash_password(&self, password: &str) -> Result<String, AccountServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.hash_params.clone());
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AccountServiceError::Hashing(e.to_string()))
    }

    // The argon2 verifier compares digests in constant time.
    fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        if let Ok(parsed_hash) = PasswordHash::new(password_hash) {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
        } else {
            false
        }
    }
}

/// Email matching is case-insensitive: addresses are lowercased at write
/// time and at lookup time.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn generate_verification_code() -> String {
    let mut rng = rand::thread_rng();
    rng.gen_range(100_000..1_000_000).to_string()
}

fn generate_reset_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    hex::encode(bytes)
}
