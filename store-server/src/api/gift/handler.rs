//! Gift Threshold API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::identity::CurrentShopper;
use crate::utils::AppResult;
use shared::models::GiftStatus;

#[derive(Deserialize)]
pub struct StatusQuery {
    pub batch_id: Option<i64>,
    #[serde(default)]
    pub cart_subtotal: f64,
}

/// GET /api/gift/status?batch_id=&cart_subtotal= - 满额赠品进度
///
/// Recomputed on every cart mutation and order attachment; within an open
/// batch `remaining` only ever shrinks.
pub async fn status(
    State(state): State<ServerState>,
    shopper: CurrentShopper,
    Query(query): Query<StatusQuery>,
) -> AppResult<Json<GiftStatus>> {
    let status = state
        .gift
        .status(shopper.id, query.batch_id, query.cart_subtotal)
        .await?;
    Ok(Json(status))
}
