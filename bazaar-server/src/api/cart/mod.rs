//! Cart API 模块

mod handler;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/cart", cart_routes())
}

fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list).delete(handler::clear))
        .route("/items", post(handler::add_item))
        .route("/items/{product_id}", delete(handler::remove_item))
        .route("/items/{product_id}/increase", post(handler::increase))
        .route("/items/{product_id}/decrease", post(handler::decrease))
}
