use axum::{
    extract::{rejection::JsonRejection, State},
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{ChangePasswordRequest, LoginPage, LoginRequest, PasswordPage, PublicUser},
        extractors::{CurrentUser, HOME_PATH, LOGIN_PATH},
        services::{self, PasswordChangeError, MIN_PASSWORD_LENGTH},
        session::SessionKeys,
    },
    error::ApiError,
    state::AppState,
};

pub fn account_routes() -> Router<AppState> {
    Router::new().route(
        "/account/password",
        get(password_page).post(change_password),
    )
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
}

pub fn home_routes() -> Router<AppState> {
    Router::new().route("/", get(home))
}

#[instrument(skip_all)]
pub async fn password_page(CurrentUser(user): CurrentUser) -> Json<PasswordPage> {
    Json(PasswordPage {
        user: PublicUser::from(&user),
        min_password_length: MIN_PASSWORD_LENGTH,
    })
}

#[instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!(error = %rejection, "undecodable password change body");
        ApiError::invalid_body()
    })?;

    match services::change_password(state.users.as_ref(), &user, payload).await {
        Ok(()) => {}
        Err(PasswordChangeError::UserNotFound) => {
            return Ok(Redirect::to(LOGIN_PATH).into_response())
        }
        Err(e) => return Err(e.into()),
    }

    // Rotate the session so the user stays signed in with a fresh token.
    let token = state.sessions.sign(user.id).map_err(ApiError::Internal)?;
    let cookie = state
        .sessions
        .session_cookie(&token)
        .map_err(|e| ApiError::Internal(e.into()))?;
    Ok(([(SET_COOKIE, cookie)], Redirect::to(HOME_PATH)).into_response())
}

pub async fn login_page() -> Json<LoginPage> {
    Json(LoginPage {
        action: LOGIN_PATH.to_string(),
    })
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!(error = %rejection, "undecodable login body");
        ApiError::invalid_body()
    })?;

    let user = services::authenticate(state.users.as_ref(), &payload.email, payload.password).await?;

    let token = state.sessions.sign(user.id).map_err(ApiError::Internal)?;
    let cookie = state
        .sessions
        .session_cookie(&token)
        .map_err(|e| ApiError::Internal(e.into()))?;
    Ok(([(SET_COOKIE, cookie)], Redirect::to(HOME_PATH)).into_response())
}

/// Always clears the cookie, whether or not a session was present.
pub async fn logout(State(keys): State<SessionKeys>) -> Result<Response, ApiError> {
    let cookie = keys
        .clear_session_cookie()
        .map_err(|e| ApiError::Internal(e.into()))?;
    Ok(([(SET_COOKIE, cookie)], Redirect::to(LOGIN_PATH)).into_response())
}

#[instrument(skip_all)]
pub async fn home(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(PublicUser::from(&user))
}
