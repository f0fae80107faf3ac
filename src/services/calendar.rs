//! Calendar events. Events may be tied to a client or be internal (no client).

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{StoreError, require_text};
use crate::access::{Action, Caller, Table, authorize};
use crate::db;
use crate::models::{CalendarEvent, CalendarEventPatch, EventKind, NewCalendarEvent};

const SELECT_EVENT: &str =
    "SELECT id, client_id, title, description, kind, starts_at, ends_at, created_by, created_at FROM calendar_events";

const RETURNING_EVENT: &str =
    "RETURNING id, client_id, title, description, kind, starts_at, ends_at, created_by, created_at";

/// Events without an explicit end last this long.
const DEFAULT_EVENT_LENGTH_MINUTES: i64 = 60;

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub client_id: Option<Uuid>,
}

fn check_span(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<(), StoreError> {
    if ends_at < starts_at {
        return Err(StoreError::Invalid("event must not end before it starts".into()));
    }
    Ok(())
}

/// List events overlapping the optional range, earliest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_events(pool: &PgPool, caller: &Caller, range: &EventRange) -> Result<Vec<CalendarEvent>, StoreError> {
    authorize(caller, Table::CalendarEvents, Action::Read, range.client_id)?;

    let mut builder = QueryBuilder::<Postgres>::new(SELECT_EVENT);
    builder.push(" WHERE true");
    if let Some(from) = range.from {
        builder.push(" AND ends_at >= ").push_bind(from);
    }
    if let Some(to) = range.to {
        builder.push(" AND starts_at < ").push_bind(to);
    }
    if let Some(client_id) = range.client_id {
        builder.push(" AND client_id = ").push_bind(client_id);
    }
    builder.push(" ORDER BY starts_at");

    let mut tx = db::begin_scoped(pool, caller).await?;
    let rows = builder.build_query_as::<CalendarEvent>().fetch_all(&mut *tx).await?;
    tx.commit().await?;
    Ok(rows)
}

async fn get_event(pool: &PgPool, caller: &Caller, id: Uuid) -> Result<CalendarEvent, StoreError> {
    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, CalendarEvent>(&format!("{SELECT_EVENT} WHERE id = $1"))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    tx.commit().await?;
    row.ok_or(StoreError::NotFound("calendar event", id))
}

/// Schedule an event.
///
/// # Errors
///
/// Returns `Invalid` for a blank title or an end before the start.
pub async fn create_event(pool: &PgPool, caller: &Caller, input: &NewCalendarEvent) -> Result<CalendarEvent, StoreError> {
    authorize(caller, Table::CalendarEvents, Action::Insert, input.client_id)?;
    require_text("title", &input.title)?;
    let ends_at = input
        .ends_at
        .unwrap_or(input.starts_at + Duration::minutes(DEFAULT_EVENT_LENGTH_MINUTES));
    check_span(input.starts_at, ends_at)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, CalendarEvent>(&format!(
        "INSERT INTO calendar_events (client_id, title, description, kind, starts_at, ends_at, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) {RETURNING_EVENT}"
    ))
    .bind(input.client_id)
    .bind(input.title.trim())
    .bind(&input.description)
    .bind(input.kind.unwrap_or(EventKind::Meeting).as_str())
    .bind(input.starts_at)
    .bind(ends_at)
    .bind(caller.user_id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(row)
}

/// Apply a partial update.
///
/// # Errors
///
/// Returns `NotFound` if the event is not visible, `Forbidden` if it is not
/// writable, `Invalid` if the result would end before it starts.
pub async fn update_event(
    pool: &PgPool,
    caller: &Caller,
    id: Uuid,
    patch: &CalendarEventPatch,
) -> Result<CalendarEvent, StoreError> {
    let current = get_event(pool, caller, id).await?;
    authorize(caller, Table::CalendarEvents, Action::Update, current.client_id)?;
    if let Some(title) = patch.title.as_deref() {
        require_text("title", title)?;
    }
    check_span(
        patch.starts_at.unwrap_or(current.starts_at),
        patch.ends_at.unwrap_or(current.ends_at),
    )?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, CalendarEvent>(&format!(
        "UPDATE calendar_events SET \
             title = COALESCE($2, title), \
             description = COALESCE($3, description), \
             kind = COALESCE($4, kind), \
             starts_at = COALESCE($5, starts_at), \
             ends_at = COALESCE($6, ends_at) \
         WHERE id = $1 {RETURNING_EVENT}"
    ))
    .bind(id)
    .bind(patch.title.as_deref().map(str::trim))
    .bind(&patch.description)
    .bind(patch.kind.map(EventKind::as_str))
    .bind(patch.starts_at)
    .bind(patch.ends_at)
    .fetch_optional(&mut *tx)
    .await?;
    tx.commit().await?;
    row.ok_or(StoreError::NotFound("calendar event", id))
}

/// Cancel an event.
///
/// # Errors
///
/// Returns `NotFound` if the event is not visible, `Forbidden` if it is not
/// writable.
pub async fn delete_event(pool: &PgPool, caller: &Caller, id: Uuid) -> Result<(), StoreError> {
    let current = get_event(pool, caller, id).await?;
    authorize(caller, Table::CalendarEvents, Action::Delete, current.client_id)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let result = sqlx::query("DELETE FROM calendar_events WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("calendar event", id));
    }
    Ok(())
}

#[cfg(all(test, feature = "live-db-tests"))]
#[path = "calendar_test.rs"]
mod tests;
