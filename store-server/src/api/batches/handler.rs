//! Batch API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::identity::CurrentShopper;
use crate::utils::AppResult;
use shared::models::{BatchFinalizeResult, DeliveryBatch, OrderInput};

#[derive(Deserialize)]
pub struct AttachRequest {
    pub order: OrderInput,
}

#[derive(Deserialize, Default)]
pub struct FinalizeRequest {
    pub shipping_method: Option<String>,
}

/// GET /api/batches/active - 当前 pending 批次
pub async fn get_active(
    State(state): State<ServerState>,
    shopper: CurrentShopper,
) -> AppResult<Json<Option<DeliveryBatch>>> {
    let batch = state.batches.get_active(shopper.id).await?;
    Ok(Json(batch))
}

/// POST /api/batches/attach - 挂单到批次（不存在则开启）
pub async fn attach_order(
    State(state): State<ServerState>,
    shopper: CurrentShopper,
    Json(payload): Json<AttachRequest>,
) -> AppResult<Json<DeliveryBatch>> {
    let batch = state.batches.open_or_attach(shopper.id, &payload.order).await?;
    Ok(Json(batch))
}

/// POST /api/batches/:id/finalize - 批次定稿，产出配送订单
pub async fn finalize(
    State(state): State<ServerState>,
    shopper: CurrentShopper,
    Path(id): Path<i64>,
    payload: Option<Json<FinalizeRequest>>,
) -> AppResult<Json<BatchFinalizeResult>> {
    let shipping_method = payload
        .and_then(|Json(p)| p.shipping_method)
        .unwrap_or_else(|| "standard".to_string());
    let result = state.batches.finalize(id, shopper.id, &shipping_method).await?;
    Ok(Json(result))
}

/// POST /api/batches/:id/cancel - 取消批次
pub async fn cancel(
    State(state): State<ServerState>,
    shopper: CurrentShopper,
    Path(id): Path<i64>,
) -> AppResult<Json<DeliveryBatch>> {
    let batch = state.batches.cancel(id, shopper.id).await?;
    Ok(Json(batch))
}
