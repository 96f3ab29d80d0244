//! Order API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/orders", order_routes())
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list_mine))
        .route("/selling", get(handler::list_selling))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/acknowledge", post(handler::acknowledge_payment))
        .route("/{id}/release", post(handler::release_items))
        .route("/{id}/complete", post(handler::complete))
}
