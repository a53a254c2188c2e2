//! Checkout API Handlers

use axum::{Json, extract::State};

use crate::core::ServerState;
use crate::identity::CurrentShopper;
use crate::utils::AppResult;
use shared::models::{CheckoutBreakdown, CheckoutReceipt, CheckoutRequest};

/// POST /api/checkout/quote - 试算（无副作用）
pub async fn quote(
    State(state): State<ServerState>,
    shopper: CurrentShopper,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<CheckoutBreakdown>> {
    let breakdown = state.checkout.quote(shopper.id, &payload).await?;
    Ok(Json(breakdown))
}

/// POST /api/checkout/pay - 支付并提交全部奖励副作用
pub async fn pay(
    State(state): State<ServerState>,
    shopper: CurrentShopper,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<CheckoutReceipt>> {
    let receipt = state.checkout.pay(shopper.id, &payload).await?;
    Ok(Json(receipt))
}
