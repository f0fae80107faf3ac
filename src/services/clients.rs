//! Client service — CRUD, filtering, and tag assignment.
//!
//! Client totals (`total_sales`, `total_collection`, `balance`,
//! `invoice_count`) are trigger-maintained and never written here.

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{StoreError, require_text};
use crate::access::{Action, Caller, Table, authorize};
use crate::db;
use crate::models::{Client, ClientPatch, ClientStatus, NewClient, Tag};

const SELECT_CLIENT: &str = "SELECT id, business_name, contact_name, email, phone, address, website, status, \
     package_name, notes, total_sales, total_collection, balance, invoice_count, created_at, updated_at \
     FROM clients";

const RETURNING_CLIENT: &str = "RETURNING id, business_name, contact_name, email, phone, address, website, status, \
     package_name, notes, total_sales, total_collection, balance, invoice_count, created_at, updated_at";

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ClientFilter {
    pub status: Option<ClientStatus>,
    /// Case-insensitive match on business name, contact name, or email.
    pub search: Option<String>,
}

/// List clients visible to the caller, newest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_clients(pool: &PgPool, caller: &Caller, filter: &ClientFilter) -> Result<Vec<Client>, StoreError> {
    authorize(caller, Table::Clients, Action::Read, None)?;

    let mut builder = QueryBuilder::<Postgres>::new(SELECT_CLIENT);
    builder.push(" WHERE true");
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        builder
            .push(" AND (business_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR contact_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    builder.push(" ORDER BY created_at DESC");

    let mut tx = db::begin_scoped(pool, caller).await?;
    let rows = builder.build_query_as::<Client>().fetch_all(&mut *tx).await?;
    tx.commit().await?;
    Ok(rows)
}

/// Fetch one client.
///
/// # Errors
///
/// Returns `NotFound` if the row does not exist or is not visible.
pub async fn get_client(pool: &PgPool, caller: &Caller, id: Uuid) -> Result<Client, StoreError> {
    authorize(caller, Table::Clients, Action::Read, Some(id))?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, Client>(&format!("{SELECT_CLIENT} WHERE id = $1"))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    tx.commit().await?;
    row.ok_or(StoreError::NotFound("client", id))
}

/// Create a client. Totals start at zero.
///
/// # Errors
///
/// Returns `Invalid` for a blank business name or a constraint violation.
pub async fn create_client(pool: &PgPool, caller: &Caller, input: &NewClient) -> Result<Client, StoreError> {
    authorize(caller, Table::Clients, Action::Insert, None)?;
    require_text("businessName", &input.business_name)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, Client>(&format!(
        "INSERT INTO clients (business_name, contact_name, email, phone, address, website, status, package_name, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) {RETURNING_CLIENT}"
    ))
    .bind(input.business_name.trim())
    .bind(&input.contact_name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.address)
    .bind(&input.website)
    .bind(input.status.unwrap_or(ClientStatus::Active).as_str())
    .bind(&input.package_name)
    .bind(&input.notes)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(row)
}

/// Apply a partial update. Absent fields keep their stored value.
///
/// # Errors
///
/// Returns `NotFound` if the row is missing or the caller may not update it.
pub async fn update_client(pool: &PgPool, caller: &Caller, id: Uuid, patch: &ClientPatch) -> Result<Client, StoreError> {
    authorize(caller, Table::Clients, Action::Update, Some(id))?;
    if let Some(name) = patch.business_name.as_deref() {
        require_text("businessName", name)?;
    }

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, Client>(&format!(
        "UPDATE clients SET \
             business_name = COALESCE($2, business_name), \
             contact_name = COALESCE($3, contact_name), \
             email = COALESCE($4, email), \
             phone = COALESCE($5, phone), \
             address = COALESCE($6, address), \
             website = COALESCE($7, website), \
             status = COALESCE($8, status), \
             package_name = COALESCE($9, package_name), \
             notes = COALESCE($10, notes), \
             updated_at = now() \
         WHERE id = $1 {RETURNING_CLIENT}"
    ))
    .bind(id)
    .bind(patch.business_name.as_deref().map(str::trim))
    .bind(&patch.contact_name)
    .bind(&patch.email)
    .bind(&patch.phone)
    .bind(&patch.address)
    .bind(&patch.website)
    .bind(patch.status.map(ClientStatus::as_str))
    .bind(&patch.package_name)
    .bind(&patch.notes)
    .fetch_optional(&mut *tx)
    .await?;
    tx.commit().await?;
    row.ok_or(StoreError::NotFound("client", id))
}

/// Delete a client. Invoices, payments, and every other client-owned row
/// go with it through cascading foreign keys.
///
/// # Errors
///
/// Returns `NotFound` if nothing was deleted.
pub async fn delete_client(pool: &PgPool, caller: &Caller, id: Uuid) -> Result<(), StoreError> {
    authorize(caller, Table::Clients, Action::Delete, Some(id))?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let result = sqlx::query("DELETE FROM clients WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("client", id));
    }
    Ok(())
}

// =============================================================================
// TAGS
// =============================================================================

/// Tags attached to a client, by name.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_client_tags(pool: &PgPool, caller: &Caller, client_id: Uuid) -> Result<Vec<Tag>, StoreError> {
    authorize(caller, Table::ClientTags, Action::Read, Some(client_id))?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let rows = sqlx::query_as::<_, Tag>(
        "SELECT t.id, t.name, t.color, t.created_at
         FROM client_tags ct
         JOIN tags t ON t.id = ct.tag_id
         WHERE ct.client_id = $1
         ORDER BY t.name",
    )
    .bind(client_id)
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(rows)
}

/// Attach a tag. Attaching an already-attached tag is a no-op.
///
/// # Errors
///
/// Returns `Invalid` if the client or tag does not exist.
pub async fn assign_tag(pool: &PgPool, caller: &Caller, client_id: Uuid, tag_id: Uuid) -> Result<(), StoreError> {
    authorize(caller, Table::ClientTags, Action::Insert, Some(client_id))?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    sqlx::query("INSERT INTO client_tags (client_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(client_id)
        .bind(tag_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

/// Detach a tag.
///
/// # Errors
///
/// Returns `NotFound` if the tag was not attached.
pub async fn unassign_tag(pool: &PgPool, caller: &Caller, client_id: Uuid, tag_id: Uuid) -> Result<(), StoreError> {
    authorize(caller, Table::ClientTags, Action::Delete, Some(client_id))?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let result = sqlx::query("DELETE FROM client_tags WHERE client_id = $1 AND tag_id = $2")
        .bind(client_id)
        .bind(tag_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("client tag", tag_id));
    }
    Ok(())
}
