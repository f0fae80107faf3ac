//! Client-side state mirror.
//!
//! SYSTEM CONTEXT
//! ==============
//! A dashboard front-end keeps one observable `Collection` per entity,
//! fetches them on load, mutates them optimistically, and writes through to
//! the HTTP API. Derived invoice and client totals are recomputed locally
//! with `rollup` after payment changes; the server's triggers remain the
//! source of truth and the next load overwrites any drift.

pub mod api;
pub mod collection;

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

pub use api::{ApiClient, Backend, MirrorError};
pub use collection::{Collection, Entity};

use crate::models::{
    CalendarEvent, Chat, ChatMessage, Client, Component, Invoice, NewPayment, Payment, PaymentPatch, ProgressStep,
    Tag, UserProfile,
};
use crate::rollup;

macro_rules! entity {
    ($ty:ty, $path:literal) => {
        impl Entity for $ty {
            const PATH: &'static str = $path;

            fn id(&self) -> Uuid {
                self.id
            }
        }
    };
    ($ty:ty, $path:literal, append_only) => {
        impl Entity for $ty {
            const PATH: &'static str = $path;
            const UPDATABLE: bool = false;

            fn id(&self) -> Uuid {
                self.id
            }
        }
    };
}

entity!(Client, "clients");
entity!(Invoice, "invoices");
entity!(Payment, "payments");
entity!(Component, "components");
entity!(ProgressStep, "steps");
entity!(CalendarEvent, "events");
// Chats and messages are created and deleted, never patched.
entity!(Chat, "chats", append_only);
entity!(ChatMessage, "messages", append_only);
entity!(Tag, "tags");
entity!(UserProfile, "users");

// =============================================================================
// STORE
// =============================================================================

pub struct Store {
    pub clients: Collection<Client>,
    pub invoices: Collection<Invoice>,
    pub payments: Collection<Payment>,
    pub components: Collection<Component>,
    pub steps: Collection<ProgressStep>,
    pub events: Collection<CalendarEvent>,
    pub chats: Collection<Chat>,
    pub messages: Collection<ChatMessage>,
    pub tags: Collection<Tag>,
    pub users: Collection<UserProfile>,
}

impl Store {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            clients: Collection::new(Arc::clone(&backend)),
            invoices: Collection::new(Arc::clone(&backend)),
            payments: Collection::new(Arc::clone(&backend)),
            components: Collection::new(Arc::clone(&backend)),
            steps: Collection::new(Arc::clone(&backend)),
            events: Collection::new(Arc::clone(&backend)),
            chats: Collection::new(Arc::clone(&backend)),
            messages: Collection::new(Arc::clone(&backend)),
            tags: Collection::new(Arc::clone(&backend)),
            users: Collection::new(backend),
        }
    }

    /// Fetch every collection that is not scoped to a single client or chat.
    /// Returns false if any load failed.
    pub async fn load_all(&self) -> bool {
        let (clients, invoices, payments, events, chats, tags, users) = tokio::join!(
            self.clients.load(),
            self.invoices.load(),
            self.payments.load(),
            self.events.load(),
            self.chats.load(),
            self.tags.load(),
            self.users.load(),
        );
        clients && invoices && payments && events && chats && tags && users
    }

    /// Fetch the components and progress steps of one client.
    pub async fn load_client(&self, client_id: Uuid) -> bool {
        let components_path = format!("components?clientId={client_id}");
        let steps_path = format!("steps?clientId={client_id}");
        let (components, steps) = tokio::join!(
            self.components.load_from(&components_path),
            self.steps.load_from(&steps_path),
        );
        components && steps
    }

    /// Fetch the messages of one chat.
    pub async fn load_chat(&self, chat_id: Uuid) -> bool {
        self.messages.load_from(&format!("chats/{chat_id}/messages")).await
    }

    /// Record a payment and re-derive its invoice and client.
    pub async fn add_payment(&self, input: &NewPayment) -> Option<Payment> {
        let payment = self.payments.add(input).await?;
        self.rederive_invoice(payment.invoice_id);
        Some(payment)
    }

    /// Patch a payment and re-derive its invoice and client.
    pub async fn update_payment(&self, id: Uuid, patch: &PaymentPatch) -> Option<Payment> {
        let previous = self.payments.get(id).map(|p| p.invoice_id);
        let updated = self.payments.update(id, patch).await;
        let invoice_id = updated
            .as_ref()
            .map(|p| p.invoice_id)
            .or_else(|| self.payments.get(id).map(|p| p.invoice_id));
        if let Some(invoice_id) = invoice_id {
            self.rederive_invoice(invoice_id);
        }
        if let Some(old) = previous.filter(|old| Some(*old) != invoice_id) {
            self.rederive_invoice(old);
        }
        updated
    }

    /// Remove a payment and re-derive its invoice and client. The local
    /// removal stands even if the server delete fails.
    pub async fn remove_payment(&self, id: Uuid) -> bool {
        let invoice_id = self.payments.get(id).map(|p| p.invoice_id);
        let removed = self.payments.remove(id).await;
        if let Some(invoice_id) = invoice_id {
            self.rederive_invoice(invoice_id);
        }
        removed
    }

    /// Post a message into a chat.
    pub async fn post_message(&self, chat_id: Uuid, body: &str) -> Option<ChatMessage> {
        self.messages
            .add_at(&format!("chats/{chat_id}/messages"), &json!({ "body": body }))
            .await
    }

    /// Flip a progress step's completion.
    pub async fn toggle_step(&self, id: Uuid) -> Option<ProgressStep> {
        self.steps.post_action(&format!("steps/{id}/toggle"), &json!({})).await
    }

    /// Append a comment to a progress step.
    pub async fn comment_step(&self, id: Uuid, body: &str) -> Option<ProgressStep> {
        self.steps
            .post_action(&format!("steps/{id}/comments"), &json!({ "body": body }))
            .await
    }

    /// Recompute the local invoice from local payments, then its client from
    /// local invoices.
    fn rederive_invoice(&self, invoice_id: Uuid) {
        let Some(mut invoice) = self.invoices.get(invoice_id) else {
            return;
        };
        rollup::apply_invoice_totals(&mut invoice, &self.payments.snapshot());
        let client_id = invoice.client_id;
        self.invoices.replace_local(invoice);

        if let Some(mut client) = self.clients.get(client_id) {
            rollup::apply_client_totals(&mut client, &self.invoices.snapshot());
            self.clients.replace_local(client);
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
