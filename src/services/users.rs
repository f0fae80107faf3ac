//! User profiles and account administration.
//!
//! Super Admins manage every account. Client Admins may add and remove
//! `Client Team` members of their own client. Everyone may edit their own
//! name and avatar; role and client assignment are Super Admin only, which
//! the `user_profiles_guard_role` trigger enforces a second time.

use sqlx::PgPool;
use uuid::Uuid;

use super::StoreError;
use super::auth::{self, AuthError};
use crate::access::{Action, Caller, Table, authorize};
use crate::db;
use crate::models::{NewUser, ProfilePatch, Role, UserProfile};

const PROFILE_COLUMNS: &str = "id, email, full_name, role, client_id, avatar_url, created_at";

impl From<AuthError> for StoreError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Db(e) => e.into(),
            AuthError::EmailTaken => Self::Invalid("email already registered".into()),
            other => Self::Invalid(other.to_string()),
        }
    }
}

/// Client roles need a client; staff roles must not have one.
fn check_assignment(role: Role, client_id: Option<Uuid>) -> Result<(), StoreError> {
    match (role.is_staff(), client_id) {
        (true, Some(_)) => Err(StoreError::Invalid(format!("{role} accounts cannot belong to a client"))),
        (false, None) => Err(StoreError::Invalid(format!("{role} accounts need a client"))),
        _ => Ok(()),
    }
}

/// Profiles visible to the caller, by name.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_profiles(pool: &PgPool, caller: &Caller) -> Result<Vec<UserProfile>, StoreError> {
    authorize(caller, Table::UserProfiles, Action::Read, None)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let rows = sqlx::query_as::<_, UserProfile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM user_profiles ORDER BY full_name, email"
    ))
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(rows)
}

/// Fetch one profile.
///
/// # Errors
///
/// Returns `NotFound` if the profile is not visible.
pub async fn get_profile(pool: &PgPool, caller: &Caller, id: Uuid) -> Result<UserProfile, StoreError> {
    authorize(caller, Table::UserProfiles, Action::Read, None)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, UserProfile>(&format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE id = $1"))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    tx.commit().await?;
    row.ok_or(StoreError::NotFound("user profile", id))
}

/// Create an account with a password and a profile in one transaction.
///
/// # Errors
///
/// Returns `Forbidden` when the caller may not grant this role or client,
/// `Invalid` for a bad email, weak password, or taken email.
pub async fn create_user(pool: &PgPool, caller: &Caller, input: &NewUser) -> Result<UserProfile, StoreError> {
    authorize(caller, Table::UserProfiles, Action::Insert, input.client_id)?;
    check_assignment(input.role, input.client_id)?;
    if caller.role != Role::SuperAdmin && input.role != Role::ClientTeam {
        return Err(StoreError::Forbidden(format!("{} may only add Client Team members", caller.role)));
    }

    let mut tx = db::begin_scoped(pool, caller).await?;
    let (user_id, email) = auth::insert_auth_user(&mut tx, &input.email, &input.password).await?;
    let row = sqlx::query_as::<_, UserProfile>(&format!(
        "INSERT INTO user_profiles (id, email, full_name, role, client_id) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(user_id)
    .bind(&email)
    .bind(input.full_name.trim())
    .bind(input.role.as_str())
    .bind(input.client_id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(row)
}

/// Update a profile.
///
/// # Errors
///
/// Returns `Forbidden` when editing someone else or changing role/client
/// without Super Admin, `NotFound` if the profile is not visible.
pub async fn update_profile(pool: &PgPool, caller: &Caller, id: Uuid, patch: &ProfilePatch) -> Result<UserProfile, StoreError> {
    authorize(caller, Table::UserProfiles, Action::Update, None)?;
    let is_admin = caller.role == Role::SuperAdmin;
    if !is_admin && id != caller.user_id {
        return Err(StoreError::Forbidden("profiles may only be edited by their owner".into()));
    }
    if !is_admin && (patch.role.is_some() || patch.client_id.is_some()) {
        return Err(StoreError::Forbidden("only a Super Admin may change role or client".into()));
    }

    let mut tx = db::begin_scoped(pool, caller).await?;
    if patch.role.is_some() || patch.client_id.is_some() {
        let current = sqlx::query_as::<_, UserProfile>(&format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound("user profile", id))?;
        let role = patch.role.unwrap_or(current.role);
        // Promoting to staff drops the client assignment.
        let client_id = if role.is_staff() { None } else { patch.client_id.or(current.client_id) };
        check_assignment(role, client_id)?;

        sqlx::query("UPDATE user_profiles SET role = $2, client_id = $3 WHERE id = $1")
            .bind(id)
            .bind(role.as_str())
            .bind(client_id)
            .execute(&mut *tx)
            .await?;
    }

    let row = sqlx::query_as::<_, UserProfile>(&format!(
        "UPDATE user_profiles SET \
             full_name = COALESCE($2, full_name), \
             avatar_url = COALESCE($3, avatar_url) \
         WHERE id = $1 RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(id)
    .bind(patch.full_name.as_deref().map(str::trim))
    .bind(&patch.avatar_url)
    .fetch_optional(&mut *tx)
    .await?;
    tx.commit().await?;
    row.ok_or(StoreError::NotFound("user profile", id))
}

/// Delete an account. The profile delete runs under row policies first;
/// the credential row is removed only if that succeeded.
///
/// # Errors
///
/// Returns `Invalid` when deleting oneself, `NotFound` if the caller could
/// not delete the profile.
pub async fn delete_user(pool: &PgPool, caller: &Caller, id: Uuid) -> Result<(), StoreError> {
    if id == caller.user_id {
        return Err(StoreError::Invalid("accounts cannot delete themselves".into()));
    }
    let target = get_profile(pool, caller, id).await?;
    authorize(caller, Table::UserProfiles, Action::Delete, target.client_id)?;
    if caller.role != Role::SuperAdmin && target.role != Role::ClientTeam {
        return Err(StoreError::Forbidden(format!("{} may only remove Client Team members", caller.role)));
    }

    let mut tx = db::begin_scoped(pool, caller).await?;
    let result = sqlx::query("DELETE FROM user_profiles WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("user profile", id));
    }
    sqlx::query("DELETE FROM auth_users WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM sessions WHERE user_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

#[cfg(all(test, feature = "live-db-tests"))]
#[path = "users_test.rs"]
mod live_tests;
