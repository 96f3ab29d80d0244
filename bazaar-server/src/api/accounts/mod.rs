//! Account / Withdrawal API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/api/accounts", account_routes())
        .nest("/api/withdrawals", withdrawal_routes())
}

fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::open))
        .route(
            "/me",
            get(handler::get_mine).delete(handler::close),
        )
        .route("/me/ledger", get(handler::ledger))
        .route("/me/withdrawal-details", put(handler::update_withdrawal_details))
        .route("/{user_id}", get(handler::get_by_user))
}

fn withdrawal_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::request_withdrawal))
        .route("/{entry_id}/complete", post(handler::complete_withdrawal))
}
