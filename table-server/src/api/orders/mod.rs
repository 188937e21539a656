//! Order API 模块
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/orders | POST | 下单 | 客人 / 员工 |
//! | /api/orders/{id} | GET, PUT, DELETE | 查询 / 改单 / 删除 (仅已取消) | 客人 / 员工 |
//! | /api/orders/{id}/status | PUT | 状态流转 | 客人 / 员工 |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/status", put(handler::change_status))
}
