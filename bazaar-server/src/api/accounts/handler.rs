//! Account / Withdrawal API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Account, LedgerEntry, PayoutDestination};
use crate::server::{AppState, Caller};
use crate::utils::{AppResponse, AppResult, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct WithdrawalDetailsRequest {
    pub withdrawal_details: Vec<PayoutDestination>,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawalRequest {
    pub destination: PayoutDestination,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct WithdrawalResponse {
    pub entry: LedgerEntry,
    pub account: Account,
}

#[derive(Debug, Deserialize)]
pub struct CompleteWithdrawalRequest {
    pub is_completed: bool,
}

/// POST /api/accounts - 为当前用户开户 (注册钩子)
pub async fn open(State(state): State<AppState>, caller: Caller) -> AppResult<Json<Account>> {
    let account = state.accounts.open_account(&caller.user_id).await?;
    Ok(Json(account))
}

/// GET /api/accounts/me - 当前用户账户
pub async fn get_mine(State(state): State<AppState>, caller: Caller) -> AppResult<Json<Account>> {
    let account = state.accounts.get_account(&caller.user_id)?;
    Ok(Json(account))
}

/// GET /api/accounts/{user_id} - 查询任意账户 (管理员)
pub async fn get_by_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> AppResult<Json<Account>> {
    caller.require_admin()?;
    let account = state.accounts.get_account(&user_id)?;
    Ok(Json(account))
}

/// GET /api/accounts/me/ledger - 当前用户流水 (新到旧)
pub async fn ledger(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<Vec<LedgerEntry>>> {
    let entries = state.accounts.ledger_history(&caller.user_id)?;
    Ok(Json(entries))
}

/// PUT /api/accounts/me/withdrawal-details - 更新提现目的地
pub async fn update_withdrawal_details(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<WithdrawalDetailsRequest>,
) -> AppResult<Json<Account>> {
    let account = state
        .accounts
        .update_withdrawal_details(&caller.user_id, body.withdrawal_details)?;
    Ok(Json(account))
}

/// DELETE /api/accounts/me - 关闭账户 (余额必须为零)
pub async fn close(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<AppResponse<()>>> {
    state.accounts.close_account(&caller.user_id)?;
    Ok(ok_with_message((), "Account closed"))
}

/// POST /api/withdrawals - 发起提现 (立即冻结余额)
pub async fn request_withdrawal(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<WithdrawalRequest>,
) -> AppResult<Json<WithdrawalResponse>> {
    let (entry, account) =
        state
            .accounts
            .request_withdrawal(&caller.user_id, body.destination, body.amount)?;
    Ok(Json(WithdrawalResponse { entry, account }))
}

/// POST /api/withdrawals/{entry_id}/complete - 管理员终审提现
pub async fn complete_withdrawal(
    State(state): State<AppState>,
    caller: Caller,
    Path(entry_id): Path<String>,
    Json(body): Json<CompleteWithdrawalRequest>,
) -> AppResult<Json<LedgerEntry>> {
    caller.require_admin()?;
    let entry =
        state
            .accounts
            .complete_withdrawal(&caller.user_id, &entry_id, body.is_completed)?;
    Ok(Json(entry))
}
