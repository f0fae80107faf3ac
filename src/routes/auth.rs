//! Auth routes: password login, sign-up, session inspection, logout.

use axum::extract::{FromRef, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;
use uuid::Uuid;

use super::ApiError;
use crate::access::Caller;
use crate::models::UserProfile;
use crate::services::auth::{self as auth_svc, AuthError};
use crate::services::session;
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";

/// Session token from an `Authorization: Bearer` header, else from the cookie.
///
/// An explicit header wins so API clients are not shadowed by a stale cookie.
pub(crate) fn request_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_owned());
    }

    let jar = CookieJar::from_headers(headers);
    jar.get(COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
        .filter(|token| !token.is_empty())
}

pub(crate) fn auth_error_to_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidEmail | AuthError::WeakPassword => StatusCode::BAD_REQUEST,
        AuthError::EmailTaken => StatusCode::CONFLICT,
        AuthError::InvalidCredentials | AuthError::MissingProfile => StatusCode::UNAUTHORIZED,
        AuthError::SignupDisabled => StatusCode::FORBIDDEN,
        AuthError::Hash(_) | AuthError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn auth_error(err: AuthError) -> ApiError {
    let status = auth_error_to_status(&err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "auth request failed");
        return (status, "internal error".into());
    }
    (status, err.to_string())
}

fn internal(err: impl std::fmt::Display, what: &'static str) -> ApiError {
    tracing::error!(error = %err, "{what}");
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
}

fn session_cookie(token: String, secure: bool, ttl_hours: i64) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::hours(ttl_hours))
        .build()
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated caller resolved from the session token.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub profile: UserProfile,
    pub caller: Caller,
    pub token: String,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = request_token(&parts.headers).ok_or(StatusCode::UNAUTHORIZED)?;

        let app_state = AppState::from_ref(state);
        let user_id = session::validate_session(&app_state.pool, &token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "session lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let profile = auth_svc::load_profile(&app_state.pool, user_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "profile lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let caller = auth_svc::caller_for(&profile);
        Ok(Self { profile, caller, token })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupBody {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub user: UserProfile,
    pub demo: bool,
}

/// Open a session for `user_id` and build the cookie + body response.
async fn start_session(
    state: &AppState,
    user_id: Uuid,
    demo: bool,
) -> Result<impl IntoResponse + use<>, ApiError> {
    let user = auth_svc::load_profile(&state.pool, user_id)
        .await
        .map_err(|e| internal(e, "profile lookup failed"))?
        .ok_or_else(|| auth_error(AuthError::MissingProfile))?;

    let token = session::create_session(&state.pool, user_id, state.config.session_ttl_hours)
        .await
        .map_err(|e| internal(e, "session creation failed"))?;

    let cookie = session_cookie(token.clone(), state.config.cookie_secure, state.config.session_ttl_hours);
    let jar = CookieJar::new().add(cookie);
    Ok((jar, Json(SessionResponse { token, user, demo })))
}

/// `POST /api/auth/login` — verify credentials and open a session.
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> Result<impl IntoResponse, ApiError> {
    let signed_in = auth_svc::sign_in(&state.pool, &body.email, &body.password, state.config.demo_login_enabled)
        .await
        .map_err(auth_error)?;
    start_session(&state, signed_in.user_id, signed_in.demo).await
}

/// `POST /api/auth/signup` — create an account and open a session.
pub async fn signup(State(state): State<AppState>, Json(body): Json<SignupBody>) -> Result<impl IntoResponse, ApiError> {
    let user_id = auth_svc::sign_up(
        &state.pool,
        state.config.allow_signup,
        &body.email,
        &body.password,
        &body.full_name,
    )
    .await
    .map_err(auth_error)?;
    let response = start_session(&state, user_id, false).await?;
    Ok((StatusCode::CREATED, response))
}

/// `GET /api/auth/me` — return the current profile.
pub async fn me(auth: AuthUser) -> Json<UserProfile> {
    Json(auth.profile)
}

/// `POST /api/auth/logout` — delete session, clear cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Err(e) = session::delete_session(&state.pool, &auth.token).await {
        tracing::warn!(error = %e, "session delete failed");
    }

    let cookie = Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure)
        .max_age(Duration::ZERO);

    let jar = CookieJar::new().add(cookie);
    (jar, StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
