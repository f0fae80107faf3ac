//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! One module per table family. Each operation checks the application copy
//! of the access matrix, opens a caller-scoped transaction, runs its
//! statement, and commits. Derived totals are never written here; the
//! database triggers own them.

pub mod auth;
pub mod calendar;
pub mod chat;
pub mod clients;
pub mod components;
pub mod dashboard;
pub mod demo;
pub mod invoices;
pub mod payments;
pub mod progress;
pub mod session;
pub mod tags;
pub mod users;

#[cfg(all(test, feature = "live-db-tests"))]
pub(crate) mod live_support;

use uuid::Uuid;

use crate::access::Denied;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found: {1}")]
    NotFound(&'static str, Uuid),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<Denied> for StoreError {
    fn from(err: Denied) -> Self {
        Self::Forbidden(err.to_string())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        classify_db_error(err)
    }
}

/// Map constraint and policy failures onto caller-facing variants.
fn classify_db_error(err: sqlx::Error) -> StoreError {
    let code = err
        .as_database_error()
        .and_then(|db| db.code())
        .map(|c| c.into_owned());

    match code.as_deref() {
        // check, foreign key, unique, not null, bad text representation
        Some("23514" | "23503" | "23505" | "23502" | "22P02" | "22007" | "22008") => {
            let message = err
                .as_database_error()
                .map_or_else(|| err.to_string(), |db| db.message().to_owned());
            StoreError::Invalid(message)
        }
        // insufficient privilege / row-level security rejection
        Some("42501") => StoreError::Forbidden(
            err.as_database_error()
                .map_or_else(|| err.to_string(), |db| db.message().to_owned()),
        ),
        _ => StoreError::Database(err),
    }
}

/// Reject blank required text.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Invalid(format!("{field} is required")));
    }
    Ok(())
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
