//! Hardcoded demo accounts.
//!
//! Three fixed credentials sign in without a real credential check when
//! `DEMO_LOGIN_ENABLED` is on. `seed` makes sure the matching profiles and
//! the demo client exist so the resulting sessions resolve to real rows. The
//! seeded credential rows carry an unusable hash, so with the flag off the
//! accounts cannot sign in at all.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::access::Caller;
use crate::db;
use crate::models::Role;
use crate::services::auth::{self, AuthError};

pub const DEMO_PASSWORD: &str = "password123";

/// Stored as the demo accounts' credential hash. It is not a PHC string, so
/// the real password check never admits these accounts.
pub const UNUSABLE_PASSWORD_HASH: &str = "!";

pub const DEMO_CLIENT_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_c11e);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoAccount {
    pub user_id: Uuid,
    pub email: &'static str,
    pub full_name: &'static str,
    pub role: Role,
    pub client_id: Option<Uuid>,
}

pub const DEMO_ACCOUNTS: [DemoAccount; 3] = [
    DemoAccount {
        user_id: Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_a001),
        email: "admin@sentra.com",
        full_name: "Demo Admin",
        role: Role::SuperAdmin,
        client_id: None,
    },
    DemoAccount {
        user_id: Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_a002),
        email: "client@sentra.com",
        full_name: "Demo Client",
        role: Role::ClientAdmin,
        client_id: Some(DEMO_CLIENT_ID),
    },
    DemoAccount {
        user_id: Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_a003),
        email: "team@sentra.com",
        full_name: "Demo Team",
        role: Role::Team,
        client_id: None,
    },
];

/// Match a credential pair against the demo accounts.
#[must_use]
pub fn match_credentials(email: &str, password: &str) -> Option<&'static DemoAccount> {
    let email = auth::normalize_email(email)?;
    if password != DEMO_PASSWORD {
        return None;
    }
    DEMO_ACCOUNTS.iter().find(|account| account.email == email)
}

/// Upsert the demo client, credentials, and profiles.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub async fn seed(pool: &PgPool) -> Result<(), AuthError> {
    let admin = &DEMO_ACCOUNTS[0];
    let scope = Caller::new(admin.user_id, Role::SuperAdmin, None);

    let mut tx = db::begin_scoped(pool, &scope).await?;

    sqlx::query(
        "INSERT INTO clients (id, business_name, contact_name, email, status, package_name)
         VALUES ($1, 'Sentra Demo Client', 'Demo Client', 'client@sentra.com', 'active', 'Starter')
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(DEMO_CLIENT_ID)
    .execute(&mut *tx)
    .await?;

    for account in &DEMO_ACCOUNTS {
        sqlx::query("INSERT INTO auth_users (id, email, password_hash) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING")
            .bind(account.user_id)
            .bind(account.email)
            .bind(UNUSABLE_PASSWORD_HASH)
            .execute(&mut *tx)
            .await?;

        // Older seeds stored a real hash; reset it so only the demo gate admits.
        sqlx::query("UPDATE auth_users SET password_hash = $2 WHERE id = $1")
            .bind(account.user_id)
            .bind(UNUSABLE_PASSWORD_HASH)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO user_profiles (id, email, full_name, role, client_id)
             SELECT $1, $2, $3, $4, $5
             WHERE EXISTS (SELECT 1 FROM auth_users WHERE id = $1)
             ON CONFLICT (id) DO UPDATE SET role = EXCLUDED.role, client_id = EXCLUDED.client_id",
        )
        .bind(account.user_id)
        .bind(account.email)
        .bind(account.full_name)
        .bind(account.role.as_str())
        .bind(account.client_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    info!(accounts = DEMO_ACCOUNTS.len(), "demo accounts seeded");
    Ok(())
}

#[cfg(test)]
#[path = "demo_test.rs"]
mod tests;
