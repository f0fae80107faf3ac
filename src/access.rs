//! Role model and the application-side copy of the row-level policies.
//!
//! DESIGN
//! ======
//! Postgres enforces access through RLS policies (see the `0003_policies`
//! migration). The same matrix is checked here before any statement runs so
//! obviously forbidden requests fail fast with a 403 instead of an empty
//! result. Row-level client matching for reads is left to the database:
//! a client-scoped caller asking for another client's row simply sees
//! nothing.

use uuid::Uuid;

pub use crate::models::Role;

// =============================================================================
// CALLER
// =============================================================================

/// The authenticated identity a request runs as. Mirrors the `app.*`
/// settings written into each database transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
    pub client_id: Option<Uuid>,
}

impl Caller {
    #[must_use]
    pub fn new(user_id: Uuid, role: Role, client_id: Option<Uuid>) -> Self {
        Self { user_id, role, client_id }
    }

    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// True when the caller is scoped to exactly this client.
    #[must_use]
    pub fn owns_client(&self, client_id: Uuid) -> bool {
        self.client_id == Some(client_id)
    }
}

// =============================================================================
// POLICY MATRIX
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Clients,
    Invoices,
    Payments,
    Components,
    ProgressSteps,
    CalendarEvents,
    Chats,
    ChatMessages,
    Tags,
    ClientTags,
    UserProfiles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{role} may not {action:?} {table:?}")]
pub struct Denied {
    pub role: &'static str,
    pub table: Table,
    pub action: Action,
}

/// Check the policy matrix for `caller`. `client_id` is the client the
/// target row belongs to, when known before the statement runs.
///
/// # Errors
///
/// Returns `Denied` when no policy admits the action.
pub fn authorize(caller: &Caller, table: Table, action: Action, client_id: Option<Uuid>) -> Result<(), Denied> {
    if allowed(caller, table, action, client_id) {
        Ok(())
    } else {
        Err(Denied { role: caller.role.as_str(), table, action })
    }
}

fn allowed(caller: &Caller, table: Table, action: Action, client_id: Option<Uuid>) -> bool {
    let role = caller.role;
    if role == Role::SuperAdmin {
        return true;
    }

    // Unknown target client: reads are narrowed by RLS, writes need a match.
    let own = client_id.map_or(action == Action::Read, |id| caller.owns_client(id));

    match (table, action) {
        (Table::Tags, Action::Read) => true,
        (Table::Clients, Action::Delete) => false,
        (_, Action::Read) => role.is_staff() || own,
        (Table::UserProfiles, Action::Insert | Action::Delete) => role == Role::ClientAdmin && own,
        (Table::UserProfiles, Action::Update) => true,
        (_, _) if role.is_staff() => true,
        (Table::Clients, Action::Update) => role == Role::ClientAdmin && own,
        (Table::ProgressSteps, Action::Update) => own,
        (Table::CalendarEvents, _) => role == Role::ClientAdmin && own,
        (Table::Chats, Action::Insert) => own,
        (Table::ChatMessages, Action::Insert | Action::Delete) => own,
        _ => false,
    }
}

#[cfg(test)]
#[path = "access_test.rs"]
mod tests;
