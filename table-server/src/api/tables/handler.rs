//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use shared::message::TableNotification;
use shared::models::{OrderDetail, TableDisabledUpdate, TableStatusUpdate, TableView};

use crate::api::blocking;
use crate::auth::Caller;
use crate::core::ServerState;
use crate::notifications::NotificationSink;
use crate::utils::AppResult;

#[derive(Debug, Serialize)]
pub struct SaltResponse {
    pub table_id: String,
    pub salt: String,
}

/// GET /api/tables - 本门店桌台
pub async fn list(State(state): State<ServerState>, caller: Caller) -> AppResult<Json<Vec<TableView>>> {
    let staff = caller.require_staff()?.clone();
    let tables = blocking(move || state.tables.list_place_tables(&staff)).await?;
    Ok(Json(tables))
}

/// PUT /api/tables/status - 变更桌台状态
pub async fn change_status(
    State(state): State<ServerState>,
    caller: Caller,
    Json(payload): Json<TableStatusUpdate>,
) -> AppResult<Json<bool>> {
    blocking(move || state.tables.change_status(&payload.salt, payload.status, &caller)).await?;
    Ok(Json(true))
}

/// POST /api/tables/:id/salt - 更换二维码密钥
pub async fn rotate_salt(
    State(state): State<ServerState>,
    caller: Caller,
    Path(id): Path<String>,
) -> AppResult<Json<SaltResponse>> {
    let staff = caller.require_staff()?.clone();
    let table_id = id.clone();
    let salt = blocking(move || state.tables.rotate_salt(&id, &staff)).await?;
    Ok(Json(SaltResponse { table_id, salt }))
}

/// PUT /api/tables/:id/disabled - 启用 / 停用
pub async fn set_disabled(
    State(state): State<ServerState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(payload): Json<TableDisabledUpdate>,
) -> AppResult<Json<TableView>> {
    let staff = caller.require_staff()?.clone();
    let table = blocking(move || state.tables.set_disabled(&id, payload.disabled, &staff)).await?;
    Ok(Json(table))
}

/// GET /api/tables/:id/notifications - 待处理通知
pub async fn pending_notifications(
    State(state): State<ServerState>,
    caller: Caller,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<TableNotification>>> {
    let staff = caller.require_staff()?.clone();
    let pending = blocking(move || {
        let table = state.tables.staff_table(&id, &staff)?;
        Ok(state.notifications.pending(&table.id))
    })
    .await?;
    Ok(Json(pending))
}

/// DELETE /api/tables/:id/notifications - 清除通知
pub async fn clear_notifications(
    State(state): State<ServerState>,
    caller: Caller,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let staff = caller.require_staff()?.clone();
    blocking(move || {
        let table = state.tables.staff_table(&id, &staff)?;
        state.notifications.clear(&table.id);
        Ok(())
    })
    .await?;
    Ok(Json(true))
}

/// GET /api/tables/:id/orders - 桌台订单
pub async fn list_orders(
    State(state): State<ServerState>,
    caller: Caller,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<OrderDetail>>> {
    let orders = blocking(move || state.orders.list_for_table(&id, &caller)).await?;
    Ok(Json(orders))
}
