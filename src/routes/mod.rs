//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every endpoint lives under `/api` and speaks camelCase JSON. Handlers
//! authenticate through the `AuthUser` extractor, hand the resolved caller
//! to a service, and translate `StoreError` into a status code. The built
//! dashboard is served from `STATIC_DIR` as the fallback service.

pub mod auth;
pub mod calendar;
pub mod chat;
pub mod clients;
pub mod components;
pub mod dashboard;
pub mod invoices;
pub mod progress;
pub mod tags;
pub mod users;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, patch, post, put};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::services::StoreError;
use crate::state::AppState;

/// Status plus a short message for the response body.
pub type ApiError = (StatusCode, String);

/// Map a service error onto a response. Database failures are logged and
/// their detail withheld.
pub(crate) fn store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(..) => (StatusCode::NOT_FOUND, err.to_string()),
        StoreError::Forbidden(_) => (StatusCode::FORBIDDEN, err.to_string()),
        StoreError::Invalid(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        StoreError::Database(e) => {
            tracing::error!(error = %e, "database request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
        }
    }
}

/// All `/api` routes plus `/healthz`.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/dashboard", get(dashboard::summary))
        .route("/api/clients", get(clients::list).post(clients::create))
        .route("/api/clients/{id}", get(clients::get).patch(clients::update).delete(clients::delete))
        .route("/api/clients/{id}/tags", get(clients::list_tags))
        .route("/api/clients/{id}/tags/{tag_id}", put(clients::assign_tag).delete(clients::unassign_tag))
        .route("/api/components", get(components::list).post(components::create))
        .route("/api/components/{id}", patch(components::update).delete(components::delete))
        .route("/api/invoices", get(invoices::list).post(invoices::create))
        .route("/api/invoices/{id}", get(invoices::get).patch(invoices::update).delete(invoices::delete))
        .route("/api/payments", get(invoices::list_payments).post(invoices::create_payment))
        .route(
            "/api/payments/{id}",
            get(invoices::get_payment)
                .patch(invoices::update_payment)
                .delete(invoices::delete_payment),
        )
        .route("/api/admin/recompute", post(invoices::recompute))
        .route("/api/steps", get(progress::list).post(progress::create))
        .route("/api/steps/{id}", patch(progress::update).delete(progress::delete))
        .route("/api/steps/{id}/toggle", post(progress::toggle))
        .route("/api/steps/{id}/comments", post(progress::comment))
        .route("/api/events", get(calendar::list).post(calendar::create))
        .route("/api/events/{id}", patch(calendar::update).delete(calendar::delete))
        .route("/api/chats", get(chat::list).post(chat::create))
        .route("/api/chats/{id}", axum::routing::delete(chat::delete))
        .route("/api/chats/{id}/messages", get(chat::list_messages).post(chat::post_message))
        .route("/api/messages/{id}", axum::routing::delete(chat::delete_message))
        .route("/api/tags", get(tags::list).post(tags::create))
        .route("/api/tags/{id}", patch(tags::update).delete(tags::delete))
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/{id}", get(users::get).patch(users::update).delete(users::delete))
        .route("/healthz", get(healthz))
}

/// Full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = state.config.static_dir.clone();
    let router = api_routes()
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    match static_dir {
        Some(dir) => {
            // Unknown paths fall through to the dashboard's index for client routing.
            let index = ServeFile::new(dir.join("index.html"));
            router.fallback_service(ServeDir::new(dir).fallback(index))
        }
        None => router,
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
