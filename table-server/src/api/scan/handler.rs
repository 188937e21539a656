//! Scan API Handlers

use axum::{Json, extract::State};
use shared::models::{ScanOutcome, ScanRequest, SessionPayload};

use crate::api::blocking;
use crate::auth::Caller;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ErrorCode};

/// POST /api/scan - 扫码
///
/// An expired guest token is treated as no token: the guest simply scans
/// again as a newcomer.
pub async fn scan(
    State(state): State<ServerState>,
    caller: Result<Caller, AppError>,
    Json(payload): Json<ScanRequest>,
) -> AppResult<Json<ScanOutcome>> {
    let caller = match caller {
        Ok(caller) => caller,
        Err(e) if e.is(ErrorCode::TokenExpired) => Caller::Anonymous,
        Err(e) => return Err(e),
    };

    let outcome = blocking(move || {
        state
            .tables
            .resolve(&payload.salt, payload.passphrase.as_deref(), &caller)
    })
    .await?;
    Ok(Json(outcome))
}

/// GET /api/session - 当前客人会话
pub async fn current_session(
    State(state): State<ServerState>,
    caller: Caller,
) -> AppResult<Json<SessionPayload>> {
    let guest = caller
        .as_guest()
        .cloned()
        .ok_or_else(|| AppError::with_message(ErrorCode::NotAuthenticated, "Guest token required"))?;

    let payload = blocking(move || state.sessions.current_session(&guest)).await?;
    Ok(Json(payload))
}
