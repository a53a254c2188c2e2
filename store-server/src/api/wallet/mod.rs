//! Wallet API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/wallet", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/balance", get(handler::balance))
        .route("/ledger", get(handler::ledger))
        .route("/award", post(handler::award))
}
