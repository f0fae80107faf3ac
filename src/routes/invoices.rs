//! Invoice and payment routes, plus the Super Admin totals repair.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
use uuid::Uuid;

use super::{ApiError, store_error};
use crate::models::{Invoice, InvoicePatch, NewInvoice, NewPayment, Payment, PaymentPatch};
use crate::routes::auth::AuthUser;
use crate::services::invoices::{self as svc, InvoiceFilter};
use crate::services::payments::{self as payment_svc, PaymentFilter};
use crate::state::AppState;

/// `GET /api/invoices?clientId=`
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<InvoiceFilter>,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    let rows = svc::list_invoices(&state.pool, &auth.caller, &filter)
        .await
        .map_err(store_error)?;
    Ok(Json(rows))
}

/// `GET /api/invoices/:id`
pub async fn get(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> Result<Json<Invoice>, ApiError> {
    let row = svc::get_invoice(&state.pool, &auth.caller, id).await.map_err(store_error)?;
    Ok(Json(row))
}

/// `POST /api/invoices`
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewInvoice>,
) -> Result<(StatusCode, Json<Invoice>), ApiError> {
    let row = svc::create_invoice(&state.pool, &auth.caller, &body)
        .await
        .map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `PATCH /api/invoices/:id`
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<InvoicePatch>,
) -> Result<Json<Invoice>, ApiError> {
    let row = svc::update_invoice(&state.pool, &auth.caller, id, &body)
        .await
        .map_err(store_error)?;
    Ok(Json(row))
}

/// `DELETE /api/invoices/:id`
pub async fn delete(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    svc::delete_invoice(&state.pool, &auth.caller, id).await.map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/payments?invoiceId=&clientId=`
pub async fn list_payments(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<PaymentFilter>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    let rows = payment_svc::list_payments(&state.pool, &auth.caller, &filter)
        .await
        .map_err(store_error)?;
    Ok(Json(rows))
}

/// `GET /api/payments/:id`
pub async fn get_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Payment>, ApiError> {
    let row = payment_svc::get_payment(&state.pool, &auth.caller, id)
        .await
        .map_err(store_error)?;
    Ok(Json(row))
}

/// `POST /api/payments`
pub async fn create_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewPayment>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    let row = payment_svc::create_payment(&state.pool, &auth.caller, &body)
        .await
        .map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `PATCH /api/payments/:id`
pub async fn update_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<PaymentPatch>,
) -> Result<Json<Payment>, ApiError> {
    let row = payment_svc::update_payment(&state.pool, &auth.caller, id, &body)
        .await
        .map_err(store_error)?;
    Ok(Json(row))
}

/// `DELETE /api/payments/:id`
pub async fn delete_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    payment_svc::delete_payment(&state.pool, &auth.caller, id)
        .await
        .map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeResponse {
    pub clients_recomputed: i32,
}

/// `POST /api/admin/recompute` — rebuild every invoice and client total.
pub async fn recompute(State(state): State<AppState>, auth: AuthUser) -> Result<Json<RecomputeResponse>, ApiError> {
    let clients_recomputed = svc::recompute_all(&state.pool, &auth.caller)
        .await
        .map_err(store_error)?;
    tracing::info!(user_id = %auth.caller.user_id, clients_recomputed, "totals recomputed");
    Ok(Json(RecomputeResponse { clients_recomputed }))
}
