//! Dashboard summary: counts and totals the caller's row policies admit.

use sqlx::PgPool;

use super::StoreError;
use crate::access::{Action, Caller, Table, authorize};
use crate::db;
use crate::models::DashboardSummary;

/// Every aggregate runs under the caller scope, so a client user sees only
/// their own client's numbers without any filtering here.
const SUMMARY_SQL: &str = "SELECT \
        (SELECT count(*) FROM clients) AS clients, \
        (SELECT count(*) FROM invoices) AS invoices, \
        (SELECT COALESCE(sum(total_sales), 0) FROM clients) AS total_sales, \
        (SELECT COALESCE(sum(total_collection), 0) FROM clients) AS total_collection, \
        (SELECT COALESCE(sum(balance), 0) FROM clients) AS balance, \
        (SELECT count(*) FROM progress_steps WHERE NOT completed) AS open_steps, \
        (SELECT count(*) FROM calendar_events WHERE starts_at >= now()) AS upcoming_events";

/// Compute the dashboard summary for `caller`.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn summary(pool: &PgPool, caller: &Caller) -> Result<DashboardSummary, StoreError> {
    authorize(caller, Table::Clients, Action::Read, None)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, DashboardSummary>(SUMMARY_SQL)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(row)
}
