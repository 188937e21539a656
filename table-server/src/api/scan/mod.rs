//! 扫码 API
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/scan | POST | 扫码解析 (开台 / 入座 / 续用会话) | 可选 |
//! | /api/session | GET | 当前客人会话与口令 | 客人令牌 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/scan", post(handler::scan))
        .route("/api/session", get(handler::current_session))
}
