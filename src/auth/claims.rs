use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload carried by the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,   // user ID
    pub jti: Uuid,   // unique per signature
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
}

impl SessionClaims {
    pub fn user_id(&self) -> Uuid {
        self.sub
    }
}
