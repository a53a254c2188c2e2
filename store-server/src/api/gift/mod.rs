//! Gift Threshold API 模块

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/gift", routes())
}

fn routes() -> Router<ServerState> {
    Router::new().route("/status", get(handler::status))
}
