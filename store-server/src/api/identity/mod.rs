//! Identity API 模块

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/identity", routes())
}

fn routes() -> Router<ServerState> {
    // 匿名身份签发：唯一无需令牌的业务接口
    Router::new().route("/anonymous", post(handler::create_anonymous))
}
