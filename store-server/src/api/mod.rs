//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`identity`] - 匿名身份签发
//! - [`batches`] - 配送批次接口
//! - [`wallet`] - 钱包接口
//! - [`coupons`] - 优惠券接口
//! - [`gift`] - 满额赠品接口
//! - [`checkout`] - 结算接口

pub mod batches;
pub mod checkout;
pub mod coupons;
pub mod gift;
pub mod health;
pub mod identity;
pub mod wallet;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// Compose every domain router with the shared middleware stack
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(identity::router())
        .merge(batches::router())
        .merge(wallet::router())
        .merge(coupons::router())
        .merge(gift::router())
        .merge(checkout::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};
