use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::auth::{
    dto::ChangePasswordRequest,
    password::{hash_password, verify_password, PasswordHashError},
    repo::UserStore,
    repo_types::User,
};
use crate::config::SeedUser;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum PasswordChangeError {
    #[error("Current password and new password are required")]
    MissingFields,
    #[error("New password must be at least 8 characters long")]
    TooShort,
    #[error("Current password is incorrect")]
    IncorrectCurrentPassword,
    /// The account vanished between session check and update.
    #[error("User not found")]
    UserNotFound,
    #[error(transparent)]
    Hash(#[from] PasswordHashError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Invalid email")]
    InvalidEmail,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Hash(#[from] PasswordHashError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// A password change request that passed presence and length checks.
#[derive(Debug)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(self) -> Result<PasswordChange, PasswordChangeError> {
        let (current_password, new_password) = match (self.current_password, self.new_password) {
            (Some(current), Some(new)) if !current.is_empty() && !new.is_empty() => (current, new),
            _ => return Err(PasswordChangeError::MissingFields),
        };
        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(PasswordChangeError::TooShort);
        }
        Ok(PasswordChange {
            current_password,
            new_password,
        })
    }
}

/// Validate, verify and persist a new password for `user`.
///
/// Nothing is written unless validation and verification both pass.
pub async fn change_password(
    store: &dyn UserStore,
    user: &User,
    request: ChangePasswordRequest,
) -> Result<(), PasswordChangeError> {
    let change = request.validate().map_err(|e| {
        warn!(user_id = %user.id, reason = %e, "password change rejected");
        e
    })?;

    let matches = verify_password(change.current_password, user.password_hash.clone()).await?;
    if !matches {
        warn!(user_id = %user.id, "password change with wrong current password");
        return Err(PasswordChangeError::IncorrectCurrentPassword);
    }

    let new_hash = hash_password(change.new_password).await?;
    if !store.update_password_hash(user.id, &new_hash).await? {
        warn!(user_id = %user.id, "user disappeared before password update");
        return Err(PasswordChangeError::UserNotFound);
    }

    info!(user_id = %user.id, "password changed");
    Ok(())
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check an email/password pair. Unknown email and wrong password are
/// indistinguishable to the caller.
pub async fn authenticate(
    store: &dyn UserStore,
    email: &str,
    password: String,
) -> Result<User, LoginError> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(LoginError::InvalidEmail);
    }

    let Some(user) = store.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(LoginError::InvalidCredentials);
    };

    if !verify_password(password, user.password_hash.clone()).await? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(LoginError::InvalidCredentials);
    }

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

/// Create the development seed account unless it already exists.
pub async fn ensure_seed_user(store: &dyn UserStore, seed: &SeedUser) -> anyhow::Result<()> {
    let email = normalize_email(&seed.email);
    if !is_valid_email(&email) {
        anyhow::bail!("SEED_USER_EMAIL is not a valid email");
    }
    if seed.password.chars().count() < MIN_PASSWORD_LENGTH {
        anyhow::bail!("SEED_USER_PASSWORD must be at least {MIN_PASSWORD_LENGTH} characters");
    }
    if store.find_by_email(&email).await?.is_some() {
        return Ok(());
    }
    let hash = hash_password(seed.password.clone()).await?;
    let user = store.create(&email, &hash).await?;
    info!(user_id = %user.id, email = %user.email, "seed user created");
    Ok(())
}
