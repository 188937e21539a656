//! Dining Table API 模块
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/tables | GET | 本门店桌台列表 | 员工 |
//! | /api/tables/status | PUT | 变更桌台状态 (清台 / 开台 / 预订) | 客人 / 员工 |
//! | /api/tables/{id}/salt | POST | 更换桌台二维码密钥 | 员工 |
//! | /api/tables/{id}/disabled | PUT | 启用 / 停用桌台 | 员工 |
//! | /api/tables/{id}/notifications | GET, DELETE | 待处理通知 / 清除 | 员工 |
//! | /api/tables/{id}/orders | GET | 桌台订单 | 客人 / 员工 |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tables", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/status", put(handler::change_status))
        .route("/{id}/salt", post(handler::rotate_salt))
        .route("/{id}/disabled", put(handler::set_disabled))
        .route(
            "/{id}/notifications",
            get(handler::pending_notifications).delete(handler::clear_notifications),
        )
        .route("/{id}/orders", get(handler::list_orders))
}
