//! Payment API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders/{id}/payment", post(handler::submit_payment))
        .route(
            "/api/payments/receiving-account/{method}",
            get(handler::receiving_account),
        )
}
