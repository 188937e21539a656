//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`scan`] - 扫码入座、当前会话
//! - [`tables`] - 桌台状态与员工桌台管理
//! - [`orders`] - 订单
//! - [`notifications`] - 员工通知流 (SSE)
//!
//! 存储操作是同步的 redb 事务，处理器通过 [`blocking`] 放到阻塞线程池执行。

pub mod health;
pub mod notifications;
pub mod orders;
pub mod scan;
pub mod tables;

use std::time::Duration;

use axum::Router;
use http::HeaderName;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(scan::router())
        .merge(tables::router())
        .merge(orders::router())
        .merge(notifications::router())
}

/// Build the fully configured application (used by the server and by tests)
pub fn build_app(state: &ServerState) -> Router {
    let timeout = Duration::from_millis(state.config.request_timeout_ms);

    build_router()
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Timeout - per request, headers only (SSE bodies keep streaming)
        .layer(TimeoutLayer::new(timeout))
        // Trace - Request tracing
        .layer(TraceLayer::new_for_http())
        // Request ID - generate, then echo on the response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            MakeRequestUuid,
        ))
        .with_state(state.clone())
}

/// Run a synchronous storage operation on the blocking pool
pub async fn blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::internal(format!("Blocking task failed: {}", e)))?
}
