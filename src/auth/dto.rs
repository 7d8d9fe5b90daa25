use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::User;

/// Body of `POST /account/password`.
///
/// Fields are optional at the decoding layer so that an absent field becomes
/// a validation failure with a readable message instead of a decode error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Body of `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

/// Model for the password change page.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordPage {
    pub user: PublicUser,
    pub min_password_length: usize,
}

/// Model for the login page.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginPage {
    pub action: String,
}
