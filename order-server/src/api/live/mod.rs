//! Live updates over WebSocket
//!
//! GET /api/live/ws?token=<JWT>[&branch_id=<id>]
//! 浏览器 WebSocket 不支持自定义 headers，令牌通过 query 传递

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/live/ws", get(handler::live_ws))
}
