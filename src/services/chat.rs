//! Chats between staff and a client, and their messages.

use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{StoreError, require_text};
use crate::access::{Action, Caller, Table, authorize};
use crate::db;
use crate::models::{Chat, ChatMessage, NewChat, NewChatMessage, Role};

const CHAT_COLUMNS: &str = "id, client_id, title, created_at";
const MESSAGE_COLUMNS: &str = "id, chat_id, sender_id, body, created_at";

/// Messages returned per page when listing a chat.
pub const MESSAGE_PAGE_LIMIT: i64 = 200;

/// List chats visible to the caller, optionally for one client.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_chats(pool: &PgPool, caller: &Caller, client_id: Option<Uuid>) -> Result<Vec<Chat>, StoreError> {
    authorize(caller, Table::Chats, Action::Read, client_id)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let rows = sqlx::query_as::<_, Chat>(&format!(
        "SELECT {CHAT_COLUMNS} FROM chats WHERE ($1::uuid IS NULL OR client_id = $1) ORDER BY created_at DESC"
    ))
    .bind(client_id)
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(rows)
}

async fn get_chat(pool: &PgPool, caller: &Caller, id: Uuid) -> Result<Chat, StoreError> {
    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, Chat>(&format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = $1"))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    tx.commit().await?;
    row.ok_or(StoreError::NotFound("chat", id))
}

/// Open a chat for a client.
///
/// # Errors
///
/// Returns `Forbidden` if the caller may not open chats for this client.
pub async fn create_chat(pool: &PgPool, caller: &Caller, input: &NewChat) -> Result<Chat, StoreError> {
    authorize(caller, Table::Chats, Action::Insert, Some(input.client_id))?;
    let title = input
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("General");

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, Chat>(&format!(
        "INSERT INTO chats (client_id, title) VALUES ($1, $2) RETURNING {CHAT_COLUMNS}"
    ))
    .bind(input.client_id)
    .bind(title)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(row)
}

/// Delete a chat and all of its messages.
///
/// # Errors
///
/// Returns `NotFound` if nothing was deleted.
pub async fn delete_chat(pool: &PgPool, caller: &Caller, id: Uuid) -> Result<(), StoreError> {
    authorize(caller, Table::Chats, Action::Delete, None)?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let result = sqlx::query("DELETE FROM chats WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("chat", id));
    }
    Ok(())
}

// =============================================================================
// MESSAGES
// =============================================================================

/// The most recent messages of a chat, oldest first.
///
/// # Errors
///
/// Returns `NotFound` if the chat is not visible.
pub async fn list_messages(pool: &PgPool, caller: &Caller, chat_id: Uuid) -> Result<Vec<ChatMessage>, StoreError> {
    let chat = get_chat(pool, caller, chat_id).await?;
    authorize(caller, Table::ChatMessages, Action::Read, Some(chat.client_id))?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let rows = sqlx::query_as::<_, ChatMessage>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM ( \
             SELECT {MESSAGE_COLUMNS} FROM chat_messages WHERE chat_id = $1 \
             ORDER BY created_at DESC LIMIT $2 \
         ) recent ORDER BY created_at"
    ))
    .bind(chat_id)
    .bind(MESSAGE_PAGE_LIMIT)
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(rows)
}

/// Post a message as the caller.
///
/// # Errors
///
/// Returns `Invalid` for an empty body, `NotFound` if the chat is not visible.
pub async fn post_message(
    pool: &PgPool,
    caller: &Caller,
    chat_id: Uuid,
    input: &NewChatMessage,
) -> Result<ChatMessage, StoreError> {
    require_text("body", &input.body)?;
    let chat = get_chat(pool, caller, chat_id).await?;
    authorize(caller, Table::ChatMessages, Action::Insert, Some(chat.client_id))?;

    let mut tx = db::begin_scoped(pool, caller).await?;
    let row = sqlx::query_as::<_, ChatMessage>(&format!(
        "INSERT INTO chat_messages (chat_id, sender_id, body) VALUES ($1, $2, $3) RETURNING {MESSAGE_COLUMNS}"
    ))
    .bind(chat_id)
    .bind(caller.user_id)
    .bind(input.body.trim())
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(row)
}

/// Delete a message. Senders delete their own; a Super Admin deletes any.
///
/// # Errors
///
/// Returns `NotFound` if the message is not visible, `Forbidden` otherwise
/// when the caller is neither sender nor Super Admin.
pub async fn delete_message(pool: &PgPool, caller: &Caller, id: Uuid) -> Result<(), StoreError> {
    let mut tx = db::begin_scoped(pool, caller).await?;
    let owner = sqlx::query(
        "SELECT c.client_id, m.sender_id
         FROM chat_messages m
         JOIN chats c ON c.id = m.chat_id
         WHERE m.id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(StoreError::NotFound("chat message", id))?;

    let client_id: Uuid = owner.get("client_id");
    let sender_id: Option<Uuid> = owner.get("sender_id");
    authorize(caller, Table::ChatMessages, Action::Delete, Some(client_id))?;
    if caller.role != Role::SuperAdmin && sender_id != Some(caller.user_id) {
        return Err(StoreError::Forbidden("only the sender may delete a message".into()));
    }

    sqlx::query("DELETE FROM chat_messages WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

#[cfg(all(test, feature = "live-db-tests"))]
#[path = "chat_test.rs"]
mod tests;
