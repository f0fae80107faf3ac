use rust_decimal_macros::dec;
use serde_json::{Value, json};

use super::test_helpers::MockBackend;
use super::*;
use crate::models::{InvoiceStatus, PaymentStatus};

const STAMP: &str = "2026-01-01T00:00:00Z";

fn client_json(id: Uuid) -> Value {
    json!({
        "id": id, "businessName": "Acme", "contactName": null, "email": null, "phone": null,
        "address": null, "website": null, "status": "active", "packageName": null, "notes": null,
        "totalSales": "1000", "totalCollection": "0", "balance": "1000", "invoiceCount": 1,
        "createdAt": STAMP, "updatedAt": STAMP,
    })
}

fn invoice_json(id: Uuid, client_id: Uuid) -> Value {
    json!({
        "id": id, "clientId": client_id, "invoiceNumber": "INV-1", "amount": "1000",
        "paid": "0", "due": "1000", "status": "Pending", "issueDate": "2026-01-01",
        "dueDate": null, "notes": null, "createdAt": STAMP, "updatedAt": STAMP,
    })
}

fn payment_json(id: Uuid, invoice_id: Uuid, client_id: Uuid, amount: &str) -> Value {
    json!({
        "id": id, "invoiceId": invoice_id, "clientId": client_id, "amount": amount,
        "source": "Card", "status": "Paid", "reference": null, "paidAt": STAMP, "createdAt": STAMP,
    })
}

struct Fixture {
    backend: Arc<MockBackend>,
    store: Store,
    client_id: Uuid,
    invoice_id: Uuid,
}

async fn fixture() -> Fixture {
    let (client_id, invoice_id) = (Uuid::new_v4(), Uuid::new_v4());
    let backend = Arc::new(MockBackend::default());
    backend.seed("clients", vec![client_json(client_id)]);
    backend.seed("invoices", vec![invoice_json(invoice_id, client_id)]);
    let store = Store::new(Arc::clone(&backend) as Arc<dyn Backend>);
    assert!(store.load_all().await);
    Fixture { backend, store, client_id, invoice_id }
}

#[tokio::test]
async fn load_all_fetches_unscoped_collections() {
    let f = fixture().await;
    let calls = f.backend.calls();
    for path in ["clients", "invoices", "payments", "events", "chats", "tags", "users"] {
        assert!(calls.contains(&format!("GET {path}")), "{path}");
    }
    assert_eq!(f.store.clients.len(), 1);
}

#[tokio::test]
async fn load_client_uses_client_query() {
    let f = fixture().await;
    assert!(f.store.load_client(f.client_id).await);
    let calls = f.backend.calls();
    assert!(calls.contains(&format!("GET components?clientId={}", f.client_id)));
    assert!(calls.contains(&format!("GET steps?clientId={}", f.client_id)));
}

#[tokio::test]
async fn add_payment_rederives_invoice_and_client() {
    let f = fixture().await;
    let stored = payment_json(Uuid::new_v4(), f.invoice_id, f.client_id, "400");
    *f.backend.create_response.lock().unwrap() = Some(stored);

    let input = NewPayment {
        invoice_id: f.invoice_id,
        amount: dec!(400),
        source: None,
        status: None,
        reference: None,
        paid_at: None,
    };
    let payment = f.store.add_payment(&input).await.unwrap();
    assert_eq!(payment.client_id, f.client_id);

    let invoice = f.store.invoices.get(f.invoice_id).unwrap();
    assert_eq!(invoice.paid, dec!(400));
    assert_eq!(invoice.due, dec!(600));
    assert_eq!(invoice.status, InvoiceStatus::Partial);

    let client = f.store.clients.get(f.client_id).unwrap();
    assert_eq!(client.total_collection, dec!(400));
    assert_eq!(client.balance, dec!(600));
    assert_eq!(client.invoice_count, 1);
}

#[tokio::test]
async fn add_payment_failure_leaves_totals() {
    let f = fixture().await;
    f.backend.set_failing(true);
    let input = NewPayment {
        invoice_id: f.invoice_id,
        amount: dec!(10),
        source: None,
        status: None,
        reference: None,
        paid_at: None,
    };
    assert!(f.store.add_payment(&input).await.is_none());
    assert_eq!(f.store.invoices.get(f.invoice_id).unwrap().due, dec!(1000));
}

#[tokio::test]
async fn remove_payment_rederives_even_when_delete_fails() {
    let f = fixture().await;
    let payment_id = Uuid::new_v4();
    f.backend.seed("payments", vec![payment_json(payment_id, f.invoice_id, f.client_id, "1000")]);
    f.store.payments.load().await;
    f.store.rederive_invoice(f.invoice_id);
    assert_eq!(f.store.invoices.get(f.invoice_id).unwrap().status, InvoiceStatus::Paid);

    f.backend.set_failing(true);
    assert!(!f.store.remove_payment(payment_id).await);

    let invoice = f.store.invoices.get(f.invoice_id).unwrap();
    assert_eq!(invoice.paid, dec!(0));
    assert_eq!(invoice.status, InvoiceStatus::Pending);
    assert_eq!(f.store.clients.get(f.client_id).unwrap().balance, dec!(1000));
}

#[tokio::test]
async fn failed_payment_status_drops_out_of_totals() {
    let f = fixture().await;
    let payment_id = Uuid::new_v4();
    f.backend.seed("payments", vec![payment_json(payment_id, f.invoice_id, f.client_id, "250")]);
    f.store.payments.load().await;

    let patch = PaymentPatch { status: Some(PaymentStatus::Failed), ..PaymentPatch::default() };
    let updated = f.store.update_payment(payment_id, &patch).await.unwrap();
    assert_eq!(updated.status, PaymentStatus::Failed);
    assert_eq!(f.store.invoices.get(f.invoice_id).unwrap().paid, dec!(0));
}

#[tokio::test]
async fn post_message_targets_chat_path() {
    let f = fixture().await;
    let chat_id = Uuid::new_v4();
    let stored = json!({
        "id": Uuid::new_v4(), "chatId": chat_id, "senderId": null, "body": "hello", "createdAt": STAMP,
    });
    *f.backend.create_response.lock().unwrap() = Some(stored);
    let message = f.store.post_message(chat_id, "hello").await;
    assert_eq!(message.map(|m| m.body), Some("hello".into()));
    assert!(f.backend.calls().contains(&format!("POST chats/{chat_id}/messages")));
}

#[tokio::test]
async fn moving_payment_rederives_both_invoices() {
    let f = fixture().await;
    let other_invoice = Uuid::new_v4();
    let payment_id = Uuid::new_v4();
    f.backend.seed(
        "invoices",
        vec![invoice_json(f.invoice_id, f.client_id), invoice_json(other_invoice, f.client_id)],
    );
    f.backend.seed("payments", vec![payment_json(payment_id, f.invoice_id, f.client_id, "1000")]);
    f.store.invoices.load().await;
    f.store.payments.load().await;
    f.store.rederive_invoice(f.invoice_id);
    assert_eq!(f.store.invoices.get(f.invoice_id).unwrap().status, InvoiceStatus::Paid);

    let patch = PaymentPatch { invoice_id: Some(other_invoice), ..PaymentPatch::default() };
    let moved = f.store.update_payment(payment_id, &patch).await.unwrap();
    assert_eq!(moved.invoice_id, other_invoice);

    assert_eq!(f.store.invoices.get(f.invoice_id).unwrap().status, InvoiceStatus::Pending);
    assert_eq!(f.store.invoices.get(other_invoice).unwrap().status, InvoiceStatus::Paid);
    assert_eq!(f.store.clients.get(f.client_id).unwrap().total_collection, dec!(1000));
}

#[tokio::test]
async fn append_only_collections_never_patch() {
    let f = fixture().await;
    assert!(f.store.messages.update(Uuid::new_v4(), &json!({ "body": "edited" })).await.is_none());
    assert!(f.store.chats.update(Uuid::new_v4(), &json!({ "title": "x" })).await.is_none());
    assert!(f.backend.calls().iter().all(|call| !call.starts_with("PATCH")));
}
