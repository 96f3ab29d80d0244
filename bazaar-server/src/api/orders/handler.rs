//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::models::{DeliveryAddress, Order, PaymentMethod};
use crate::server::{AppState, Caller};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub delivery_address: DeliveryAddress,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize)]
pub struct AcknowledgeRequest {
    pub payment_received: bool,
}

/// A caller may read an order as its buyer, as one of its sellers, or as admin
fn authorize_read(order: &Order, caller: &Caller) -> Result<(), AppError> {
    if caller.is_admin()
        || order.buyer_id == caller.user_id
        || order.seller_line_count(&caller.user_id) > 0
    {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You are not a party to this order".to_string(),
        ))
    }
}

/// POST /api/orders - 从购物车下单
pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<CreateOrderRequest>,
) -> AppResult<Json<Order>> {
    let order = state
        .orders
        .create_order(&caller.user_id, body.delivery_address, body.payment_method)
        .await?;
    Ok(Json(order))
}

/// GET /api/orders - 当前用户 (买家) 的订单
pub async fn list_mine(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state.orders.orders_for_buyer(&caller.user_id)?;
    Ok(Json(orders))
}

/// GET /api/orders/selling - 当前用户 (卖家) 参与的订单
pub async fn list_selling(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state.orders.orders_for_seller(&caller.user_id)?;
    Ok(Json(orders))
}

/// GET /api/orders/{id} - 订单详情
pub async fn get_by_id(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state.orders.get_order(&id)?;
    authorize_read(&order, &caller)?;
    Ok(Json(order))
}

/// POST /api/orders/{id}/acknowledge - 结算确认 (管理员)
///
/// 平台收款账户由管理员核对到账后调用；资金在这里一次性分账给所有卖家。
pub async fn acknowledge_payment(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(body): Json<AcknowledgeRequest>,
) -> AppResult<Json<Order>> {
    caller.require_admin()?;
    let order = state
        .settlement
        .acknowledge_payment(&id, body.payment_received, &caller.user_id)?;
    Ok(Json(order))
}

/// POST /api/orders/{id}/release - 卖家释放自己的商品行
pub async fn release_items(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state.orders.release_items(&id, &caller.user_id)?;
    Ok(Json(order))
}

/// POST /api/orders/{id}/complete - 买家确认收货，订单完结
pub async fn complete(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state.orders.get_order(&id)?;
    if !caller.is_admin() && order.buyer_id != caller.user_id {
        return Err(AppError::Forbidden(
            "Only the buyer may complete this order".to_string(),
        ));
    }
    let order = state.orders.complete_order(&id)?;
    Ok(Json(order))
}
