//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Order, OrderDetail, OrderDraft, OrderStatusChange};

use crate::api::blocking;
use crate::auth::Caller;
use crate::core::ServerState;
use crate::utils::AppResult;

/// POST /api/orders - 下单
pub async fn create(
    State(state): State<ServerState>,
    caller: Caller,
    Json(payload): Json<OrderDraft>,
) -> AppResult<Json<OrderDetail>> {
    let detail = blocking(move || state.orders.add(payload, &caller)).await?;
    Ok(Json(detail))
}

/// GET /api/orders/:id - 获取订单
pub async fn get_by_id(
    State(state): State<ServerState>,
    caller: Caller,
    Path(id): Path<String>,
) -> AppResult<Json<OrderDetail>> {
    let detail = blocking(move || state.orders.get(&id, &caller)).await?;
    Ok(Json(detail))
}

/// PUT /api/orders/:id - 改单
pub async fn update(
    State(state): State<ServerState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(payload): Json<OrderDraft>,
) -> AppResult<Json<OrderDetail>> {
    let detail = blocking(move || state.orders.update(&id, payload, &caller)).await?;
    Ok(Json(detail))
}

/// PUT /api/orders/:id/status - 状态流转
pub async fn change_status(
    State(state): State<ServerState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(payload): Json<OrderStatusChange>,
) -> AppResult<Json<Order>> {
    let order = blocking(move || state.orders.change_status(&id, payload, &caller)).await?;
    Ok(Json(order))
}

/// DELETE /api/orders/:id - 删除已取消订单
pub async fn delete(
    State(state): State<ServerState>,
    caller: Caller,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    blocking(move || state.orders.delete(&id, &caller)).await?;
    Ok(Json(true))
}
