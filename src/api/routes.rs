//! REST API routes configuration

use crate::api::handlers::{self, ApiState};
use crate::api::websocket::ws_handler;
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

/// JSON 404 for unknown routes
async fn fallback_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "application/json")],
        Body::from(r#"{"error":"Not Found"}"#),
    )
        .into_response()
}

/// Create the API router with all routes
pub fn create_router(state: ApiState) -> Router {
    // Configure CORS for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Event stream
        .route("/ws", get(ws_handler))
        // Queries
        .route("/api/ledger", get(handlers::get_ledger_info))
        .route("/api/balances/{address}", get(handlers::get_balance))
        .route("/api/allowances", get(handlers::get_allowance))
        .route("/api/holders", get(handlers::get_holders))
        .route("/api/denylist", get(handlers::list_denylist))
        .route("/api/denylist/{address}", get(handlers::get_denylist_status))
        .route("/api/history", get(handlers::get_history))
        // Transfers and burns
        .route("/api/transfer", post(handlers::transfer))
        .route("/api/approve", post(handlers::approve))
        .route("/api/transfer-from", post(handlers::transfer_from))
        .route("/api/burn", post(handlers::burn))
        .route("/api/burn-from", post(handlers::burn_from))
        // Owner operations
        .route("/api/mint", post(handlers::mint))
        .route("/api/denylist/add", post(handlers::add_to_denylist))
        .route("/api/denylist/remove", post(handlers::remove_from_denylist))
        .route("/api/retrieve", post(handlers::retrieve))
        .route(
            "/api/ownership/transfer",
            post(handlers::transfer_ownership),
        )
        .fallback(fallback_handler)
        .with_state(state)
        .layer(cors)
}
