//! Identity API Handlers

use axum::{Json, extract::State};
use serde::Serialize;

use crate::core::ServerState;
use crate::db::repository::shopper;
use crate::utils::{AppError, AppResult};

#[derive(Serialize)]
pub struct AnonymousIdentity {
    pub shopper_id: i64,
    /// Bearer token the client sends on every subsequent request
    pub token: String,
}

/// POST /api/identity/anonymous - 创建匿名身份并签发令牌
///
/// The returned token is the only thing the client holds; the shopper row
/// stays the authority for points, balance and entitlements.
pub async fn create_anonymous(
    State(state): State<ServerState>,
) -> AppResult<Json<AnonymousIdentity>> {
    let created = shopper::create(&state.pool, "").await?;
    let token = state
        .tokens
        .issue(created.id, true)
        .map_err(|e| AppError::internal(format!("Token issuance failed: {e}")))?;

    tracing::info!(shopper_id = created.id, "Anonymous identity issued");
    Ok(Json(AnonymousIdentity {
        shopper_id: created.id,
        token,
    }))
}
