//! Cart API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::cart::CartMutation;
use crate::models::CartLine;
use crate::server::{AppState, Caller};
use crate::utils::{AppResponse, AppResult, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct DecreaseResponse {
    pub removed: bool,
    pub quantity: Option<i32>,
}

/// GET /api/cart - 当前用户购物车
pub async fn list(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<Vec<CartLine>>> {
    let lines = state.carts.list(&caller.user_id)?;
    Ok(Json(lines))
}

/// POST /api/cart/items - 添加商品
pub async fn add_item(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<AddItemRequest>,
) -> AppResult<Json<CartLine>> {
    let line = state
        .carts
        .add_item(&caller.user_id, &body.product_id, body.quantity)
        .await?;
    Ok(Json(line))
}

/// DELETE /api/cart/items/{product_id} - 移除商品
pub async fn remove_item(
    State(state): State<AppState>,
    caller: Caller,
    Path(product_id): Path<String>,
) -> AppResult<Json<AppResponse<bool>>> {
    let removed = state.carts.remove_item(&caller.user_id, &product_id)?;
    Ok(ok(removed))
}

/// DELETE /api/cart - 清空购物车
pub async fn clear(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<AppResponse<usize>>> {
    let removed = state.carts.clear(&caller.user_id)?;
    Ok(ok_with_message(removed, "Cart cleared"))
}

/// POST /api/cart/items/{product_id}/increase - 增加数量
pub async fn increase(
    State(state): State<AppState>,
    caller: Caller,
    Path(product_id): Path<String>,
    Json(body): Json<QuantityRequest>,
) -> AppResult<Json<CartLine>> {
    let line = state
        .carts
        .increase(&caller.user_id, &product_id, body.quantity)?;
    Ok(Json(line))
}

/// POST /api/cart/items/{product_id}/decrease - 减少数量 (减到 0 即删除)
pub async fn decrease(
    State(state): State<AppState>,
    caller: Caller,
    Path(product_id): Path<String>,
    Json(body): Json<QuantityRequest>,
) -> AppResult<Json<DecreaseResponse>> {
    let result = state
        .carts
        .decrease(&caller.user_id, &product_id, body.quantity)?;
    let response = match result {
        CartMutation::Updated(quantity) => DecreaseResponse {
            removed: false,
            quantity: Some(quantity),
        },
        CartMutation::Removed => DecreaseResponse {
            removed: true,
            quantity: None,
        },
    };
    Ok(Json(response))
}
