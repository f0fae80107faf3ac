//! Observable, typed row collections.
//!
//! DESIGN
//! ======
//! Each collection holds its rows in a `tokio::sync::watch` channel so views
//! can subscribe and re-render on change. Mutations are applied locally
//! first and then written through to the backend.
//!
//! ERROR HANDLING
//! ==============
//! Backend failures are logged at WARN and swallowed: callers get `None` or
//! `false`. An update that fails keeps its optimistic row; a removal that
//! fails is not restored. The next `load` reconciles with the server.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tracing::warn;
use uuid::Uuid;

use super::api::{Backend, MirrorError};

/// A row type the mirror can hold.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Resource path under `/api`, used for create, update, and delete.
    const PATH: &'static str;

    /// False for append/delete-only resources that have no PATCH route.
    const UPDATABLE: bool = true;

    fn id(&self) -> Uuid;
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Value, MirrorError> {
    serde_json::to_value(value).map_err(|e| MirrorError::Parse(e.to_string()))
}

fn decode<E: DeserializeOwned>(value: Value) -> Result<E, MirrorError> {
    serde_json::from_value(value).map_err(|e| MirrorError::Parse(e.to_string()))
}

/// Overlay the top-level keys of `patch` onto `target`.
pub(crate) fn merge_patch_value(mut target: Value, patch: &Value) -> Value {
    if let (Value::Object(row), Value::Object(fields)) = (&mut target, patch) {
        for (key, value) in fields {
            row.insert(key.clone(), value.clone());
        }
    }
    target
}

/// Overlay the camelCase keys of `patch` onto `row`.
pub(crate) fn merge_patch<E: Entity>(row: &E, patch: &Value) -> Result<E, MirrorError> {
    decode(merge_patch_value(encode(row)?, patch))
}

pub struct Collection<E: Entity> {
    backend: Arc<dyn Backend>,
    rows: watch::Sender<Vec<E>>,
}

impl<E: Entity> Collection<E> {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (rows, _) = watch::channel(Vec::new());
        Self { backend, rows }
    }

    /// Receiver that observes every change to the rows.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<E>> {
        self.rows.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<E> {
        self.rows.borrow().clone()
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<E> {
        self.rows.borrow().iter().find(|row| row.id() == id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.borrow().is_empty()
    }

    /// Replace the rows with everything at the entity's path.
    pub async fn load(&self) -> bool {
        self.load_from(E::PATH).await
    }

    /// Replace the rows with the result of listing `path` (which may carry
    /// a query string). Rows are untouched on failure.
    pub async fn load_from(&self, path: &str) -> bool {
        let fetched = match self.backend.list(path).await {
            Ok(values) => values.into_iter().map(decode).collect::<Result<Vec<E>, _>>(),
            Err(e) => Err(e),
        };
        match fetched {
            Ok(rows) => {
                self.rows.send_replace(rows);
                true
            }
            Err(e) => {
                warn!(path, error = %e, "mirror load failed");
                false
            }
        }
    }

    /// Create a row at the entity's path.
    pub async fn add<B: Serialize + ?Sized>(&self, input: &B) -> Option<E> {
        self.add_at(E::PATH, input).await
    }

    /// Create a row by posting to `path`, then splice the stored row in at
    /// the front.
    pub async fn add_at<B: Serialize + ?Sized>(&self, path: &str, input: &B) -> Option<E> {
        let created = async {
            let body = encode(input)?;
            decode::<E>(self.backend.create(path, body).await?)
        }
        .await;

        match created {
            Ok(row) => {
                self.rows.send_modify(|rows| rows.insert(0, row.clone()));
                Some(row)
            }
            Err(e) => {
                warn!(path, error = %e, "mirror create failed");
                None
            }
        }
    }

    /// Merge `patch` into the local row, write it through, and replace the
    /// local row with the server's on success.
    /// Returns `None` without touching anything for append-only entities.
    pub async fn update<P: Serialize + ?Sized>(&self, id: Uuid, patch: &P) -> Option<E> {
        if !E::UPDATABLE {
            warn!(path = E::PATH, %id, "update skipped; resource is append/delete-only");
            return None;
        }

        let patch = match encode(patch) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = E::PATH, %id, error = %e, "mirror patch encode failed");
                return None;
            }
        };

        if let Some(current) = self.get(id) {
            match merge_patch(&current, &patch) {
                Ok(optimistic) => {
                    self.replace_local(optimistic);
                }
                Err(e) => warn!(path = E::PATH, %id, error = %e, "optimistic merge failed"),
            }
        }

        let stored = async { decode::<E>(self.backend.update(E::PATH, id, patch).await?) }.await;
        match stored {
            Ok(row) => {
                self.replace_local(row.clone());
                Some(row)
            }
            Err(e) => {
                warn!(path = E::PATH, %id, error = %e, "mirror update failed");
                None
            }
        }
    }

    /// Remove the row locally, then delete it on the server.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.remove_local(id);
        match self.backend.delete(E::PATH, id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(path = E::PATH, %id, error = %e, "mirror delete failed");
                false
            }
        }
    }

    /// Post `body` to an action endpoint that answers with a row of this
    /// collection, and replace the local copy with it.
    pub async fn post_action<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Option<E> {
        let stored = async {
            let body = encode(body)?;
            decode::<E>(self.backend.create(path, body).await?)
        }
        .await;

        match stored {
            Ok(row) => {
                self.replace_local(row.clone());
                Some(row)
            }
            Err(e) => {
                warn!(path, error = %e, "mirror action failed");
                None
            }
        }
    }

    /// Swap in `row` where a row with the same id exists.
    pub fn replace_local(&self, row: E) -> bool {
        self.rows.send_if_modified(|rows| match rows.iter_mut().find(|r| r.id() == row.id()) {
            Some(slot) => {
                *slot = row;
                true
            }
            None => false,
        })
    }

    /// Drop the row with `id` without contacting the backend.
    pub fn remove_local(&self, id: Uuid) -> bool {
        self.rows.send_if_modified(|rows| {
            let before = rows.len();
            rows.retain(|r| r.id() != id);
            rows.len() != before
        })
    }
}

#[cfg(test)]
#[path = "collection_test.rs"]
mod tests;
