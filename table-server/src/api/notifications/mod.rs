//! Staff notification stream
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/notifications/stream | GET | SSE 推送本门店桌台通知 | 员工 |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/notifications/stream", get(handler::stream))
}
