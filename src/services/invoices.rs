//! Invoice service.
//!
//! `paid`, `due`, and `status` are derived by the `invoices_derive_totals`
//! trigger from the invoice amount and its `Paid` payments. Writing an
//! invoice also re-rolls the owning client's totals.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{StoreError, require_text};
use crate::access::{Action, Caller, Table, authorize};
use crate::db;
use crate::models::{Invoice, InvoicePatch, NewInvoice};

const SELECT_INVOICE: &str = "SELECT id, client_id, invoice_number, amount, paid, due, status, issue_date, due_date, \
     notes, created_at, updated_at FROM invoices";

const RETURNING_INVOICE: &str = "RETURNING id, client_id, invoice_number, amount, paid, due, status, issue_date, \
     due_date, notes, created_at, updated_at";

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceFilter {
    pub client_id: Option<Uuid>,
}

fn check_amount(amount: Decimal) -> Result<(), StoreError> {
    if amount.is_sign_negative() {
        return Err(StoreError::Invalid("amount must not be negative".into()));
    }
    Ok(())
}

/// List invoices visible to the caller, newest issue date first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_invoices(pool: &PgPool, caller: &Caller, filter: &InvoiceFilter) -> Result<Vec<Invoice>, StoreError> {
    authorize(caller, Table::Invoices, Action::Read, filter.client_id)?;

    let mut builder = QueryBuilder::<Postgres>::new(SELECT_INVOICE);
    if let Some(client_id) = filter.client_id {
        builder.push(" WHERE client_id = ").push_bind(client_id);
    }
    builder.push(" ORDER BY issue_date DESC, created_at DESC");

    let mut tx = db::begin_scoped(pool, caller).await?;
    let rows = builder.build_query_as::<Invoice>().fetch_all(&mut *tx).await?;
    tx.commit().await?;
    Ok(rows)
}

/// Fetch one invoice.
///
/// # Errors
///
/// Returns `NotFound` if the row does not exist or is not visible.
pub async fn get_invoice(pool: &PgPool, caller: &Caller, id: Uuid) -> Result<Invoice, StoreError> {
    authorize(caller, Table::Invoices, Action::Read, None)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, Invoice>(&format!("{SELECT_INVOICE} WHERE id = $1"))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    tx.commit().await?;
    row.ok_or(StoreError::NotFound("invoice", id))
}

/// Create an invoice. It starts unpaid; the trigger fills `due` and `status`.
///
/// # Errors
///
/// Returns `Invalid` for a blank number, negative amount, duplicate number,
/// or unknown client.
pub async fn create_invoice(pool: &PgPool, caller: &Caller, input: &NewInvoice) -> Result<Invoice, StoreError> {
    authorize(caller, Table::Invoices, Action::Insert, Some(input.client_id))?;
    require_text("invoiceNumber", &input.invoice_number)?;
    check_amount(input.amount)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, Invoice>(&format!(
        "INSERT INTO invoices (client_id, invoice_number, amount, issue_date, due_date, notes) \
         VALUES ($1, $2, $3, COALESCE($4, CURRENT_DATE), $5, $6) {RETURNING_INVOICE}"
    ))
    .bind(input.client_id)
    .bind(input.invoice_number.trim())
    .bind(input.amount)
    .bind(input.issue_date)
    .bind(input.due_date)
    .bind(&input.notes)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(row)
}

/// Apply a partial update. Changing the amount re-derives due and status.
///
/// # Errors
///
/// Returns `NotFound` if the row is missing or not writable by the caller.
pub async fn update_invoice(pool: &PgPool, caller: &Caller, id: Uuid, patch: &InvoicePatch) -> Result<Invoice, StoreError> {
    authorize(caller, Table::Invoices, Action::Update, None)?;
    if let Some(number) = patch.invoice_number.as_deref() {
        require_text("invoiceNumber", number)?;
    }
    if let Some(amount) = patch.amount {
        check_amount(amount)?;
    }

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, Invoice>(&format!(
        "UPDATE invoices SET \
             invoice_number = COALESCE($2, invoice_number), \
             amount = COALESCE($3, amount), \
             issue_date = COALESCE($4, issue_date), \
             due_date = COALESCE($5, due_date), \
             notes = COALESCE($6, notes) \
         WHERE id = $1 {RETURNING_INVOICE}"
    ))
    .bind(id)
    .bind(patch.invoice_number.as_deref().map(str::trim))
    .bind(patch.amount)
    .bind(patch.issue_date)
    .bind(patch.due_date)
    .bind(&patch.notes)
    .fetch_optional(&mut *tx)
    .await?;
    tx.commit().await?;
    row.ok_or(StoreError::NotFound("invoice", id))
}

/// Delete an invoice and, by cascade, its payments.
///
/// # Errors
///
/// Returns `NotFound` if nothing was deleted.
pub async fn delete_invoice(pool: &PgPool, caller: &Caller, id: Uuid) -> Result<(), StoreError> {
    authorize(caller, Table::Invoices, Action::Delete, None)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("invoice", id));
    }
    Ok(())
}

/// Re-derive every invoice and client aggregate from scratch.
/// Returns the number of clients recomputed.
///
/// # Errors
///
/// Returns `Forbidden` for anyone but a Super Admin.
pub async fn recompute_all(pool: &PgPool, caller: &Caller) -> Result<i32, StoreError> {
    if caller.role != crate::models::Role::SuperAdmin {
        return Err(StoreError::Forbidden("only a Super Admin may recompute totals".into()));
    }

    let mut tx = db::begin_scoped(pool, caller).await?;
    let touched: i32 = sqlx::query_scalar("SELECT recompute_all_totals()")
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(touched)
}

#[cfg(all(test, feature = "live-db-tests"))]
#[path = "invoices_test.rs"]
mod tests;
