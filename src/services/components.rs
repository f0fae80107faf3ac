//! Package components — the line items a client's package is built from.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, require_text};
use crate::access::{Action, Caller, Table, authorize};
use crate::db;
use crate::models::{Component, ComponentPatch, NewComponent};

const COMPONENT_COLUMNS: &str = "id, client_id, name, description, price, quantity, created_at";

fn check_price_and_quantity(price: Option<Decimal>, quantity: Option<i32>) -> Result<(), StoreError> {
    if price.is_some_and(|p| p.is_sign_negative()) {
        return Err(StoreError::Invalid("price must not be negative".into()));
    }
    if quantity.is_some_and(|q| q < 1) {
        return Err(StoreError::Invalid("quantity must be at least 1".into()));
    }
    Ok(())
}

/// List a client's components in creation order.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_components(pool: &PgPool, caller: &Caller, client_id: Uuid) -> Result<Vec<Component>, StoreError> {
    authorize(caller, Table::Components, Action::Read, Some(client_id))?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let rows = sqlx::query_as::<_, Component>(&format!(
        "SELECT {COMPONENT_COLUMNS} FROM components WHERE client_id = $1 ORDER BY created_at"
    ))
    .bind(client_id)
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(rows)
}

/// Add a component to a client's package.
///
/// # Errors
///
/// Returns `Invalid` for a blank name, negative price, or zero quantity.
pub async fn create_component(pool: &PgPool, caller: &Caller, input: &NewComponent) -> Result<Component, StoreError> {
    authorize(caller, Table::Components, Action::Insert, Some(input.client_id))?;
    require_text("name", &input.name)?;
    check_price_and_quantity(input.price, input.quantity)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, Component>(&format!(
        "INSERT INTO components (client_id, name, description, price, quantity) \
         VALUES ($1, $2, $3, COALESCE($4, 0), COALESCE($5, 1)) RETURNING {COMPONENT_COLUMNS}"
    ))
    .bind(input.client_id)
    .bind(input.name.trim())
    .bind(&input.description)
    .bind(input.price)
    .bind(input.quantity)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(row)
}

/// Apply a partial update.
///
/// # Errors
///
/// Returns `NotFound` if the row is missing or not writable by the caller.
pub async fn update_component(
    pool: &PgPool,
    caller: &Caller,
    id: Uuid,
    patch: &ComponentPatch,
) -> Result<Component, StoreError> {
    authorize(caller, Table::Components, Action::Update, None)?;
    if let Some(name) = patch.name.as_deref() {
        require_text("name", name)?;
    }
    check_price_and_quantity(patch.price, patch.quantity)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, Component>(&format!(
        "UPDATE components SET \
             name = COALESCE($2, name), \
             description = COALESCE($3, description), \
             price = COALESCE($4, price), \
             quantity = COALESCE($5, quantity) \
         WHERE id = $1 RETURNING {COMPONENT_COLUMNS}"
    ))
    .bind(id)
    .bind(patch.name.as_deref().map(str::trim))
    .bind(&patch.description)
    .bind(patch.price)
    .bind(patch.quantity)
    .fetch_optional(&mut *tx)
    .await?;
    tx.commit().await?;
    row.ok_or(StoreError::NotFound("component", id))
}

/// Remove a component.
///
/// # Errors
///
/// Returns `NotFound` if nothing was deleted.
pub async fn delete_component(pool: &PgPool, caller: &Caller, id: Uuid) -> Result<(), StoreError> {
    authorize(caller, Table::Components, Action::Delete, None)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let result = sqlx::query("DELETE FROM components WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("component", id));
    }
    Ok(())
}
