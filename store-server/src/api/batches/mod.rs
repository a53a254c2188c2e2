//! Batch API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/batches", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/active", get(handler::get_active))
        .route("/attach", post(handler::attach_order))
        .route("/{id}/finalize", post(handler::finalize))
        .route("/{id}/cancel", post(handler::cancel))
}
