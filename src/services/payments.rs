//! Payment service.
//!
//! Payments belong to an invoice; `client_id` is copied from the invoice by
//! the `payments_assign_client` trigger, so callers never supply it. Every
//! insert, update, or delete re-rolls the invoice and then the client.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::StoreError;
use crate::access::{Action, Caller, Table, authorize};
use crate::db;
use crate::models::{NewPayment, Payment, PaymentPatch, PaymentSource, PaymentStatus};

const SELECT_PAYMENT: &str =
    "SELECT id, invoice_id, client_id, amount, source, status, reference, paid_at, created_at FROM payments";

const RETURNING_PAYMENT: &str =
    "RETURNING id, invoice_id, client_id, amount, source, status, reference, paid_at, created_at";

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFilter {
    pub invoice_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
}

fn check_amount(amount: Decimal) -> Result<(), StoreError> {
    if amount <= Decimal::ZERO {
        return Err(StoreError::Invalid("amount must be positive".into()));
    }
    Ok(())
}

/// List payments visible to the caller, most recent first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_payments(pool: &PgPool, caller: &Caller, filter: &PaymentFilter) -> Result<Vec<Payment>, StoreError> {
    authorize(caller, Table::Payments, Action::Read, filter.client_id)?;

    let mut builder = QueryBuilder::<Postgres>::new(SELECT_PAYMENT);
    builder.push(" WHERE true");
    if let Some(invoice_id) = filter.invoice_id {
        builder.push(" AND invoice_id = ").push_bind(invoice_id);
    }
    if let Some(client_id) = filter.client_id {
        builder.push(" AND client_id = ").push_bind(client_id);
    }
    builder.push(" ORDER BY paid_at DESC");

    let mut tx = db::begin_scoped(pool, caller).await?;
    let rows = builder.build_query_as::<Payment>().fetch_all(&mut *tx).await?;
    tx.commit().await?;
    Ok(rows)
}

/// Fetch one payment.
///
/// # Errors
///
/// Returns `NotFound` if the row does not exist or is not visible.
pub async fn get_payment(pool: &PgPool, caller: &Caller, id: Uuid) -> Result<Payment, StoreError> {
    authorize(caller, Table::Payments, Action::Read, None)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, Payment>(&format!("{SELECT_PAYMENT} WHERE id = $1"))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    tx.commit().await?;
    row.ok_or(StoreError::NotFound("payment", id))
}

/// Record a payment against an invoice.
///
/// # Errors
///
/// Returns `Invalid` for a non-positive amount or an unknown invoice.
pub async fn create_payment(pool: &PgPool, caller: &Caller, input: &NewPayment) -> Result<Payment, StoreError> {
    authorize(caller, Table::Payments, Action::Insert, None)?;
    check_amount(input.amount)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    // client_id is filled in from the invoice by the payments_assign_client trigger.
    let row = sqlx::query_as::<_, Payment>(&format!(
        "INSERT INTO payments (invoice_id, amount, source, status, reference, paid_at) \
         VALUES ($1, $2, $3, $4, $5, COALESCE($6, now())) {RETURNING_PAYMENT}"
    ))
    .bind(input.invoice_id)
    .bind(input.amount)
    .bind(input.source.unwrap_or(PaymentSource::BankTransfer).as_str())
    .bind(input.status.unwrap_or(PaymentStatus::Paid).as_str())
    .bind(&input.reference)
    .bind(input.paid_at)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(row)
}

/// Apply a partial update and re-roll the parent invoice, or both invoices
/// when `invoice_id` moves the payment.
///
/// # Errors
///
/// Returns `NotFound` if the row is missing or not writable by the caller.
pub async fn update_payment(pool: &PgPool, caller: &Caller, id: Uuid, patch: &PaymentPatch) -> Result<Payment, StoreError> {
    authorize(caller, Table::Payments, Action::Update, None)?;
    if let Some(amount) = patch.amount {
        check_amount(amount)?;
    }

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, Payment>(&format!(
        "UPDATE payments SET \
             amount = COALESCE($2, amount), \
             source = COALESCE($3, source), \
             status = COALESCE($4, status), \
             reference = COALESCE($5, reference), \
             paid_at = COALESCE($6, paid_at), \
             invoice_id = COALESCE($7, invoice_id) \
         WHERE id = $1 {RETURNING_PAYMENT}"
    ))
    .bind(id)
    .bind(patch.amount)
    .bind(patch.source.map(PaymentSource::as_str))
    .bind(patch.status.map(PaymentStatus::as_str))
    .bind(&patch.reference)
    .bind(patch.paid_at)
    .bind(patch.invoice_id)
    .fetch_optional(&mut *tx)
    .await?;
    tx.commit().await?;
    row.ok_or(StoreError::NotFound("payment", id))
}

/// Delete a payment and re-roll the parent invoice.
///
/// # Errors
///
/// Returns `NotFound` if nothing was deleted.
pub async fn delete_payment(pool: &PgPool, caller: &Caller, id: Uuid) -> Result<(), StoreError> {
    authorize(caller, Table::Payments, Action::Delete, None)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let result = sqlx::query("DELETE FROM payments WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("payment", id));
    }
    Ok(())
}
