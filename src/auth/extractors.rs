use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::Redirect,
};
use tracing::{debug, error, warn};

use super::repo_types::User;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

/// Session guard: resolves the session cookie to an existing user.
///
/// Every failure, including a store error during lookup, redirects to the
/// login page so the response never reveals whether a session or account
/// existed.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(claims) = state.sessions.parse(&parts.headers) else {
            debug!("no valid session");
            return Err(Redirect::to(LOGIN_PATH));
        };

        match state.users.find_by_id(claims.user_id()).await {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => {
                warn!(user_id = %claims.sub, "session for unknown user");
                Err(Redirect::to(LOGIN_PATH))
            }
            Err(e) => {
                error!(error = %e, user_id = %claims.sub, "user lookup failed");
                Err(Redirect::to(LOGIN_PATH))
            }
        }
    }
}
