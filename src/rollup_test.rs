use super::*;
use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;

use crate::models::{ClientStatus, PaymentSource};

fn payment(invoice_id: Uuid, amount: Decimal, status: PaymentStatus) -> Payment {
    Payment {
        id: Uuid::new_v4(),
        invoice_id,
        client_id: Uuid::nil(),
        amount,
        source: PaymentSource::Card,
        status,
        reference: None,
        paid_at: Utc::now(),
        created_at: Utc::now(),
    }
}

fn invoice(client_id: Uuid, amount: Decimal, paid: Decimal) -> Invoice {
    Invoice {
        id: Uuid::new_v4(),
        client_id,
        invoice_number: format!("INV-{}", Uuid::new_v4().simple()),
        amount,
        paid,
        due: amount - paid,
        status: invoice_status(amount, paid),
        issue_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        due_date: None,
        notes: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn client(id: Uuid) -> Client {
    Client {
        id,
        business_name: "Acme".into(),
        contact_name: None,
        email: None,
        phone: None,
        address: None,
        website: None,
        status: ClientStatus::Active,
        package_name: None,
        notes: None,
        total_sales: Decimal::ZERO,
        total_collection: Decimal::ZERO,
        balance: Decimal::ZERO,
        invoice_count: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

// =============================================================================
// invoice_status
// =============================================================================

#[test]
fn status_pending_when_nothing_paid() {
    assert_eq!(invoice_status(dec!(100), dec!(0)), InvoiceStatus::Pending);
}

#[test]
fn status_partial_when_some_paid() {
    assert_eq!(invoice_status(dec!(100), dec!(0.01)), InvoiceStatus::Partial);
}

#[test]
fn status_paid_when_settled_or_overpaid() {
    assert_eq!(invoice_status(dec!(100), dec!(100)), InvoiceStatus::Paid);
    assert_eq!(invoice_status(dec!(100), dec!(150)), InvoiceStatus::Paid);
}

#[test]
fn zero_amount_invoice_is_paid() {
    assert_eq!(invoice_status(dec!(0), dec!(0)), InvoiceStatus::Paid);
}

// =============================================================================
// invoice_totals
// =============================================================================

#[test]
fn totals_only_count_paid_payments_for_this_invoice() {
    let id = Uuid::new_v4();
    let payments = vec![
        payment(id, dec!(30), PaymentStatus::Paid),
        payment(id, dec!(20), PaymentStatus::Pending),
        payment(id, dec!(10), PaymentStatus::Failed),
        payment(Uuid::new_v4(), dec!(500), PaymentStatus::Paid),
    ];
    let totals = invoice_totals(id, dec!(100), &payments);
    assert_eq!(totals.paid, dec!(30));
    assert_eq!(totals.due, dec!(70));
    assert_eq!(totals.status, InvoiceStatus::Partial);
}

#[test]
fn overpayment_leaves_negative_due() {
    let id = Uuid::new_v4();
    let payments = vec![payment(id, dec!(120), PaymentStatus::Paid)];
    let totals = invoice_totals(id, dec!(100), &payments);
    assert_eq!(totals.due, dec!(-20));
    assert_eq!(totals.status, InvoiceStatus::Paid);
}

#[test]
fn apply_invoice_totals_rewrites_derived_columns() {
    let mut inv = invoice(Uuid::new_v4(), dec!(200), dec!(0));
    let payments = vec![payment(inv.id, dec!(200), PaymentStatus::Paid)];
    apply_invoice_totals(&mut inv, &payments);
    assert_eq!(inv.paid, dec!(200));
    assert_eq!(inv.due, dec!(0));
    assert_eq!(inv.status, InvoiceStatus::Paid);
}

// =============================================================================
// client_totals
// =============================================================================

#[test]
fn client_totals_sum_only_own_invoices() {
    let id = Uuid::new_v4();
    let invoices = vec![
        invoice(id, dec!(100), dec!(100)),
        invoice(id, dec!(250), dec!(50)),
        invoice(Uuid::new_v4(), dec!(999), dec!(0)),
    ];
    let totals = client_totals(id, &invoices);
    assert_eq!(totals.total_sales, dec!(350));
    assert_eq!(totals.total_collection, dec!(150));
    assert_eq!(totals.balance, dec!(200));
    assert_eq!(totals.invoice_count, 2);
}

#[test]
fn client_without_invoices_has_zero_totals() {
    assert_eq!(client_totals(Uuid::new_v4(), &[]), ClientTotals::default());
}

#[test]
fn apply_client_totals_rewrites_aggregates() {
    let id = Uuid::new_v4();
    let mut c = client(id);
    let invoices = vec![invoice(id, dec!(80), dec!(30))];
    apply_client_totals(&mut c, &invoices);
    assert_eq!(c.total_sales, dec!(80));
    assert_eq!(c.total_collection, dec!(30));
    assert_eq!(c.balance, dec!(50));
    assert_eq!(c.invoice_count, 1);
}
