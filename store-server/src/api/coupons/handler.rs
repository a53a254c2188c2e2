//! Coupon API Handlers

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::core::ServerState;
use crate::identity::CurrentShopper;
use crate::utils::AppResult;
use shared::models::AvailableCoupon;

#[derive(Deserialize)]
pub struct SelectRequest {
    pub user_coupon_id: i64,
}

/// GET /api/coupons - 可用优惠券列表
pub async fn list(
    State(state): State<ServerState>,
    shopper: CurrentShopper,
) -> AppResult<Json<Vec<AvailableCoupon>>> {
    let coupons = state.coupons.list_available(shopper.id).await?;
    Ok(Json(coupons))
}

/// GET /api/coupons/selected - 当前选中的优惠券
pub async fn selected(
    State(state): State<ServerState>,
    shopper: CurrentShopper,
) -> AppResult<Json<Option<AvailableCoupon>>> {
    let selection = state.coupons.selected(shopper.id).await?;
    Ok(Json(selection))
}

/// POST /api/coupons/select - 选择优惠券（替换原有选择）
pub async fn select(
    State(state): State<ServerState>,
    shopper: CurrentShopper,
    Json(payload): Json<SelectRequest>,
) -> AppResult<Json<AvailableCoupon>> {
    let voucher = state.coupons.select(shopper.id, payload.user_coupon_id).await?;
    Ok(Json(voucher))
}

/// POST /api/coupons/deselect - 清除选择
pub async fn deselect(
    State(state): State<ServerState>,
    shopper: CurrentShopper,
) -> AppResult<Json<bool>> {
    let cleared = state.coupons.deselect(shopper.id).await?;
    Ok(Json(cleared))
}
