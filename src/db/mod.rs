//! Database initialization, migrations, and caller-scoped transactions.
//!
//! SYSTEM CONTEXT
//! ==============
//! Startup uses this module to create the shared SQLx pool and enforce schema
//! migrations before accepting API traffic. Every service call then runs
//! inside `begin_scoped`, which writes the caller identity into
//! transaction-local settings that the row-level policies read.

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::access::Caller;

/// Initialize the `PostgreSQL` connection pool and run migrations.
///
/// # Errors
///
/// Returns an error if the connection or migrations fail.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;

    Ok(pool)
}

/// Open a transaction whose row policies see `caller`.
///
/// The settings are `is_local`, so they vanish at commit or rollback and a
/// pooled connection never leaks one caller's scope into the next.
///
/// # Errors
///
/// Returns a database error if the transaction cannot be opened.
pub async fn begin_scoped(pool: &PgPool, caller: &Caller) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "SELECT set_config('app.user_id', $1, true),
                set_config('app.role', $2, true),
                set_config('app.client_id', $3, true)",
    )
    .bind(caller.user_id.to_string())
    .bind(caller.role.as_str())
    .bind(caller.client_id.map(|id| id.to_string()).unwrap_or_default())
    .execute(&mut *tx)
    .await?;
    Ok(tx)
}

/// Transaction scoped to a user whose role is not yet known. Only the
/// self-read and self-signup policies admit it.
///
/// # Errors
///
/// Returns a database error if the transaction cannot be opened.
pub async fn begin_as_user(pool: &PgPool, user_id: Uuid) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    set_user_scope(&mut tx, user_id).await?;
    Ok(tx)
}

/// Narrow an open transaction to `user_id` with no role.
///
/// # Errors
///
/// Returns a database error if the setting cannot be written.
pub async fn set_user_scope(tx: &mut Transaction<'static, Postgres>, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT set_config('app.user_id', $1, true)")
        .bind(user_id.to_string())
        .execute(&mut **tx)
        .await?;
    Ok(())
}
