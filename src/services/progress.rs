//! Progress steps — a client's task checklist with deadlines and comments.
//!
//! Staff own the checklist. Client-scoped callers may only append comments
//! to steps of their own client.

use chrono::Utc;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use super::{StoreError, require_text};
use crate::access::{Action, Caller, Table, authorize};
use crate::db;
use crate::models::{NewProgressStep, ProgressStep, ProgressStepPatch, StepComment};

const STEP_COLUMNS: &str =
    "id, client_id, title, description, deadline, completed, completed_at, comments, sort_order, created_at";

/// List a client's steps in display order.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_steps(pool: &PgPool, caller: &Caller, client_id: Uuid) -> Result<Vec<ProgressStep>, StoreError> {
    authorize(caller, Table::ProgressSteps, Action::Read, Some(client_id))?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let rows = sqlx::query_as::<_, ProgressStep>(&format!(
        "SELECT {STEP_COLUMNS} FROM progress_steps WHERE client_id = $1 ORDER BY sort_order, created_at"
    ))
    .bind(client_id)
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(rows)
}

async fn get_step(pool: &PgPool, caller: &Caller, id: Uuid) -> Result<ProgressStep, StoreError> {
    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, ProgressStep>(&format!("SELECT {STEP_COLUMNS} FROM progress_steps WHERE id = $1"))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    tx.commit().await?;
    row.ok_or(StoreError::NotFound("progress step", id))
}

/// Add a step. Without an explicit `sort_order` it goes to the end.
///
/// # Errors
///
/// Returns `Invalid` for a blank title or unknown client.
pub async fn create_step(pool: &PgPool, caller: &Caller, input: &NewProgressStep) -> Result<ProgressStep, StoreError> {
    authorize(caller, Table::ProgressSteps, Action::Insert, Some(input.client_id))?;
    require_text("title", &input.title)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, ProgressStep>(&format!(
        "INSERT INTO progress_steps (client_id, title, description, deadline, sort_order) \
         VALUES ($1, $2, $3, $4, COALESCE($5, \
             (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM progress_steps WHERE client_id = $1))) \
         RETURNING {STEP_COLUMNS}"
    ))
    .bind(input.client_id)
    .bind(input.title.trim())
    .bind(&input.description)
    .bind(input.deadline)
    .bind(input.sort_order)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(row)
}

/// Apply a partial update. Setting `completed` stamps or clears
/// `completed_at`; re-completing a done step keeps its original stamp.
///
/// # Errors
///
/// Returns `NotFound` if the row is missing or not writable by the caller.
pub async fn update_step(
    pool: &PgPool,
    caller: &Caller,
    id: Uuid,
    patch: &ProgressStepPatch,
) -> Result<ProgressStep, StoreError> {
    authorize(caller, Table::ProgressSteps, Action::Update, None)?;
    if let Some(title) = patch.title.as_deref() {
        require_text("title", title)?;
    }

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, ProgressStep>(&format!(
        "UPDATE progress_steps SET \
             title = COALESCE($2, title), \
             description = COALESCE($3, description), \
             deadline = COALESCE($4, deadline), \
             completed = COALESCE($5, completed), \
             completed_at = CASE \
                 WHEN $5 IS NULL THEN completed_at \
                 WHEN $5 THEN COALESCE(completed_at, now()) \
                 ELSE NULL END, \
             sort_order = COALESCE($6, sort_order) \
         WHERE id = $1 RETURNING {STEP_COLUMNS}"
    ))
    .bind(id)
    .bind(patch.title.as_deref().map(str::trim))
    .bind(&patch.description)
    .bind(patch.deadline)
    .bind(patch.completed)
    .bind(patch.sort_order)
    .fetch_optional(&mut *tx)
    .await?;
    tx.commit().await?;
    row.ok_or(StoreError::NotFound("progress step", id))
}

/// Flip a step between done and not done in a single statement, so
/// concurrent toggles serialize on the row lock instead of cancelling out.
///
/// # Errors
///
/// Returns `NotFound` if the step is missing or not writable by the caller.
pub async fn toggle_step(pool: &PgPool, caller: &Caller, id: Uuid) -> Result<ProgressStep, StoreError> {
    authorize(caller, Table::ProgressSteps, Action::Update, None)?;

    // The right-hand side of SET sees the pre-update row.
    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, ProgressStep>(&format!(
        "UPDATE progress_steps SET \
             completed = NOT completed, \
             completed_at = CASE WHEN completed THEN NULL ELSE now() END \
         WHERE id = $1 RETURNING {STEP_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;
    tx.commit().await?;
    row.ok_or(StoreError::NotFound("progress step", id))
}

/// Append a comment to a step.
///
/// # Errors
///
/// Returns `Invalid` for a blank body, `NotFound` if the step is not visible.
pub async fn add_comment(
    pool: &PgPool,
    caller: &Caller,
    id: Uuid,
    author_name: &str,
    body: &str,
) -> Result<ProgressStep, StoreError> {
    require_text("body", body)?;
    let step = get_step(pool, caller, id).await?;
    authorize(caller, Table::ProgressSteps, Action::Update, Some(step.client_id))?;

    let comment = StepComment {
        author_id: caller.user_id,
        author_name: author_name.to_owned(),
        body: body.trim().to_owned(),
        at: Utc::now(),
    };

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, ProgressStep>(&format!(
        "UPDATE progress_steps SET comments = comments || jsonb_build_array($2::jsonb) \
         WHERE id = $1 RETURNING {STEP_COLUMNS}"
    ))
    .bind(id)
    .bind(Json(&comment))
    .fetch_optional(&mut *tx)
    .await?;
    tx.commit().await?;
    row.ok_or(StoreError::NotFound("progress step", id))
}

/// Remove a step.
///
/// # Errors
///
/// Returns `NotFound` if nothing was deleted.
pub async fn delete_step(pool: &PgPool, caller: &Caller, id: Uuid) -> Result<(), StoreError> {
    authorize(caller, Table::ProgressSteps, Action::Delete, None)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let result = sqlx::query("DELETE FROM progress_steps WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("progress step", id));
    }
    Ok(())
}

#[cfg(all(test, feature = "live-db-tests"))]
#[path = "progress_test.rs"]
mod tests;
