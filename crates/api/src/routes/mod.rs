//! API routes

pub mod admin;
pub mod billing;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::{
    auth::{require_auth, require_superadmin},
    state::AppState,
};

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    let partner_routes = Router::new()
        .route("/estimate", get(billing::get_estimate))
        .route("/subscription", get(billing::get_subscription))
        .route("/payments", get(billing::list_payments));

    let admin_routes = Router::new()
        .route(
            "/partners/{partner_id}/billing",
            get(admin::get_partner_billing),
        )
        .route(
            "/partners/{partner_id}/payments",
            post(admin::record_payment),
        )
        .route(
            "/partners/{partner_id}/subscriptions",
            get(admin::list_subscriptions).post(admin::create_subscription),
        )
        .route_layer(middleware::from_fn(require_superadmin));

    let api_routes = Router::new()
        .nest("/billing", partner_routes)
        .nest("/admin", admin_routes)
        .route_layer(middleware::from_fn_with_state(
            state.auth_state(),
            require_auth,
        ));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
