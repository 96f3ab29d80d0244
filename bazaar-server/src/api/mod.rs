//! HTTP API
//!
//! Thin routers and handlers over the domain services. Validation of shapes
//! happens here; every business rule lives in the services.

pub mod accounts;
pub mod cart;
pub mod orders;
pub mod payments;

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::server::AppState;

/// Build the full API router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(cart::router())
        .merge(orders::router())
        .merge(payments::router())
        .merge(accounts::router())
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// 基础健康检查 (公共路由，无需认证)
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
