//! Wallet API Handlers

use axum::{Json, extract::State};

use crate::core::ServerState;
use crate::identity::CurrentShopper;
use crate::rewards::ledger::WalletProfile;
use crate::utils::AppResult;
use shared::models::{AwardRequest, AwardResult, WalletLedgerEntry};

/// GET /api/wallet/balance - 余额与当前等级
pub async fn balance(
    State(state): State<ServerState>,
    shopper: CurrentShopper,
) -> AppResult<Json<WalletProfile>> {
    let profile = state.wallet.profile(shopper.id).await?;
    Ok(Json(profile))
}

/// GET /api/wallet/ledger - 最近流水
pub async fn ledger(
    State(state): State<ServerState>,
    shopper: CurrentShopper,
) -> AppResult<Json<Vec<WalletLedgerEntry>>> {
    let entries = state.wallet.recent_entries(shopper.id).await?;
    Ok(Json(entries))
}

/// POST /api/wallet/award - 领取奖励（幂等）
///
/// A duplicated claim (double click, retried request) replays as a no-op
/// with `already_claimed = true` and the original amount.
pub async fn award(
    State(state): State<ServerState>,
    shopper: CurrentShopper,
    Json(payload): Json<AwardRequest>,
) -> AppResult<Json<AwardResult>> {
    let result = state
        .wallet
        .award(shopper.id, &payload.source_key, payload.base_amount)
        .await?;
    Ok(Json(result))
}
