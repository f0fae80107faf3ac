//! Invoice and client aggregate rules.
//!
//! The database owns these numbers through triggers (`0002_rollups`). This
//! module states the same rules in Rust so the mirror can re-derive local
//! rows after a payment mutation without waiting for a refetch.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{Client, Invoice, InvoiceStatus, Payment, PaymentStatus};

/// Paid if nothing is due, Partial if anything was paid, else Pending.
#[must_use]
pub fn invoice_status(amount: Decimal, paid: Decimal) -> InvoiceStatus {
    let due = amount - paid;
    if due <= Decimal::ZERO {
        InvoiceStatus::Paid
    } else if paid > Decimal::ZERO {
        InvoiceStatus::Partial
    } else {
        InvoiceStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub paid: Decimal,
    pub due: Decimal,
    pub status: InvoiceStatus,
}

/// Derive an invoice's totals from the payments recorded against it.
/// Payments for other invoices and non-`Paid` payments are ignored.
#[must_use]
pub fn invoice_totals(invoice_id: Uuid, amount: Decimal, payments: &[Payment]) -> InvoiceTotals {
    let paid = payments
        .iter()
        .filter(|p| p.invoice_id == invoice_id && p.status == PaymentStatus::Paid)
        .map(|p| p.amount)
        .sum::<Decimal>();
    InvoiceTotals { paid, due: amount - paid, status: invoice_status(amount, paid) }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientTotals {
    pub total_sales: Decimal,
    pub total_collection: Decimal,
    pub balance: Decimal,
    pub invoice_count: i32,
}

/// Sum the invoices belonging to `client_id`.
#[must_use]
pub fn client_totals(client_id: Uuid, invoices: &[Invoice]) -> ClientTotals {
    invoices
        .iter()
        .filter(|inv| inv.client_id == client_id)
        .fold(ClientTotals::default(), |mut acc, inv| {
            acc.total_sales += inv.amount;
            acc.total_collection += inv.paid;
            acc.balance += inv.due;
            acc.invoice_count += 1;
            acc
        })
}

/// Overwrite an invoice's derived columns in place.
pub fn apply_invoice_totals(invoice: &mut Invoice, payments: &[Payment]) {
    let totals = invoice_totals(invoice.id, invoice.amount, payments);
    invoice.paid = totals.paid;
    invoice.due = totals.due;
    invoice.status = totals.status;
}

/// Overwrite a client's derived columns in place.
pub fn apply_client_totals(client: &mut Client, invoices: &[Invoice]) {
    let totals = client_totals(client.id, invoices);
    client.total_sales = totals.total_sales;
    client.total_collection = totals.total_collection;
    client.balance = totals.balance;
    client.invoice_count = totals.invoice_count;
}

#[cfg(test)]
#[path = "rollup_test.rs"]
mod tests;
