//! Tags used to label clients.

use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, require_text};
use crate::access::{Action, Caller, Table, authorize};
use crate::db;
use crate::models::{NewTag, Tag, TagPatch};

const TAG_COLUMNS: &str = "id, name, color, created_at";

/// `#rgb` or `#rrggbb`.
fn is_hex_color(value: &str) -> bool {
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

fn check_color(color: Option<&str>) -> Result<(), StoreError> {
    match color {
        Some(c) if !is_hex_color(c) => Err(StoreError::Invalid(format!("color must be a hex value, got {c:?}"))),
        _ => Ok(()),
    }
}

/// All tags, by name.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_tags(pool: &PgPool, caller: &Caller) -> Result<Vec<Tag>, StoreError> {
    authorize(caller, Table::Tags, Action::Read, None)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let rows = sqlx::query_as::<_, Tag>(&format!("SELECT {TAG_COLUMNS} FROM tags ORDER BY name"))
        .fetch_all(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(rows)
}

/// Create a tag.
///
/// # Errors
///
/// Returns `Invalid` for a blank or duplicate name or a malformed color.
pub async fn create_tag(pool: &PgPool, caller: &Caller, input: &NewTag) -> Result<Tag, StoreError> {
    authorize(caller, Table::Tags, Action::Insert, None)?;
    require_text("name", &input.name)?;
    check_color(input.color.as_deref())?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, Tag>(&format!(
        "INSERT INTO tags (name, color) VALUES ($1, COALESCE($2, '#64748b')) RETURNING {TAG_COLUMNS}"
    ))
    .bind(input.name.trim())
    .bind(&input.color)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(row)
}

/// Rename or recolor a tag.
///
/// # Errors
///
/// Returns `NotFound` if the tag is missing.
pub async fn update_tag(pool: &PgPool, caller: &Caller, id: Uuid, patch: &TagPatch) -> Result<Tag, StoreError> {
    authorize(caller, Table::Tags, Action::Update, None)?;
    if let Some(name) = patch.name.as_deref() {
        require_text("name", name)?;
    }
    check_color(patch.color.as_deref())?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, Tag>(&format!(
        "UPDATE tags SET name = COALESCE($2, name), color = COALESCE($3, color) WHERE id = $1 RETURNING {TAG_COLUMNS}"
    ))
    .bind(id)
    .bind(patch.name.as_deref().map(str::trim))
    .bind(&patch.color)
    .fetch_optional(&mut *tx)
    .await?;
    tx.commit().await?;
    row.ok_or(StoreError::NotFound("tag", id))
}

/// Delete a tag and detach it from every client.
///
/// # Errors
///
/// Returns `NotFound` if nothing was deleted.
pub async fn delete_tag(pool: &PgPool, caller: &Caller, id: Uuid) -> Result<(), StoreError> {
    authorize(caller, Table::Tags, Action::Delete, None)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let result = sqlx::query("DELETE FROM tags WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("tag", id));
    }
    Ok(())
}
