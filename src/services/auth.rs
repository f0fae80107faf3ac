//! Password authentication: sign-up, sign-in, and the demo fallback.
//!
//! DESIGN
//! ======
//! Credentials live in `auth_users` (no row policies, never exposed over the
//! API). Profiles live in `user_profiles` and are read under the user's own
//! scope, so the self-read policy is the only thing that admits them.
//!
//! TRADE-OFFS
//! ==========
//! When `demo_login_enabled` is set, a failed sign-in that matches one of the
//! hardcoded demo credentials signs in as the seeded demo profile instead.
//! This bypasses real authentication and is off unless explicitly enabled.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::warn;
use uuid::Uuid;

use crate::access::Caller;
use crate::db;
use crate::models::{Role, UserProfile};
use crate::services::demo;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email")]
    InvalidEmail,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("email already registered")]
    EmailTaken,
    #[error("sign-up is disabled")]
    SignupDisabled,
    #[error("account has no profile")]
    MissingProfile,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Outcome of a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignIn {
    pub user_id: Uuid,
    /// True when the demo fallback admitted the caller.
    pub demo: bool,
}

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(normalized)
}

/// Hash a password with Argon2id and a random salt.
///
/// # Errors
///
/// Returns `AuthError::Hash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Verify a password against a stored PHC hash string.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn check_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

/// Insert a credential row inside an existing transaction.
pub(crate) async fn insert_auth_user(
    tx: &mut Transaction<'static, Postgres>,
    email: &str,
    password: &str,
) -> Result<(Uuid, String), AuthError> {
    let email = normalize_email(email).ok_or(AuthError::InvalidEmail)?;
    check_password(password)?;
    let hash = hash_password(password)?;

    let row = sqlx::query("INSERT INTO auth_users (email, password_hash) VALUES ($1, $2) ON CONFLICT (email) DO NOTHING RETURNING id")
        .bind(&email)
        .bind(hash)
        .fetch_optional(&mut **tx)
        .await?;

    let Some(row) = row else {
        return Err(AuthError::EmailTaken);
    };
    Ok((row.get("id"), email))
}

/// Self-service sign-up. The new profile is a `Client Team` member with no
/// client, which admits nothing until a Super Admin assigns one.
///
/// # Errors
///
/// Returns `SignupDisabled`, `InvalidEmail`, `WeakPassword`, `EmailTaken`,
/// or a database error.
pub async fn sign_up(
    pool: &PgPool,
    allow_signup: bool,
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<Uuid, AuthError> {
    if !allow_signup {
        return Err(AuthError::SignupDisabled);
    }

    let mut tx = pool.begin().await?;
    let (user_id, email) = insert_auth_user(&mut tx, email, password).await?;
    db::set_user_scope(&mut tx, user_id).await?;
    sqlx::query("INSERT INTO user_profiles (id, email, full_name, role) VALUES ($1, $2, $3, $4)")
        .bind(user_id)
        .bind(&email)
        .bind(full_name.trim())
        .bind(Role::ClientTeam.as_str())
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(user_id)
}

/// Verify credentials, falling back to the demo accounts when enabled.
///
/// # Errors
///
/// Returns `InvalidCredentials` when neither path admits the caller.
pub async fn sign_in(pool: &PgPool, email: &str, password: &str, demo_enabled: bool) -> Result<SignIn, AuthError> {
    let verified = match verify_credentials(pool, email, password).await {
        Ok(found) => found,
        Err(e) => {
            warn!(error = %e, "credential lookup failed");
            if !demo_enabled {
                return Err(e);
            }
            None
        }
    };

    if let Some(user_id) = verified {
        return Ok(SignIn { user_id, demo: false });
    }

    if demo_enabled {
        if let Some(account) = demo::match_credentials(email, password) {
            warn!(email = account.email, "demo credentials accepted; real authentication bypassed");
            return Ok(SignIn { user_id: account.user_id, demo: true });
        }
    }

    Err(AuthError::InvalidCredentials)
}

async fn verify_credentials(pool: &PgPool, email: &str, password: &str) -> Result<Option<Uuid>, AuthError> {
    let Some(email) = normalize_email(email) else {
        return Ok(None);
    };

    let row = sqlx::query("SELECT id, password_hash FROM auth_users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(|r| {
        let hash: String = r.get("password_hash");
        verify_password(password, &hash).then(|| r.get("id"))
    }))
}

/// Load the profile for a user under their own scope.
///
/// # Errors
///
/// Returns a database error if the lookup fails.
pub async fn load_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<UserProfile>, sqlx::Error> {
    let mut tx = db::begin_as_user(pool, user_id).await?;
    let profile = sqlx::query_as::<_, UserProfile>(
        "SELECT id, email, full_name, role, client_id, avatar_url, created_at FROM user_profiles WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(profile)
}

#[must_use]
pub fn caller_for(profile: &UserProfile) -> Caller {
    Caller::new(profile.id, profile.role, profile.client_id)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;

#[cfg(all(test, feature = "live-db-tests"))]
#[path = "auth_live_test.rs"]
mod live_tests;
