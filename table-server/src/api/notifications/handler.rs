//! Notification stream handler

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use shared::message::TableNotification;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::auth::Caller;
use crate::core::ServerState;
use crate::utils::AppResult;

struct Subscription {
    rx: broadcast::Receiver<TableNotification>,
    place_id: String,
    shutdown: CancellationToken,
}

/// GET /api/notifications/stream - 本门店通知 (SSE)
pub async fn stream(
    State(state): State<ServerState>,
    caller: Caller,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let staff = caller.require_staff()?;
    tracing::info!(staff_id = %staff.staff_id, place_id = %staff.place_id, "Notification stream opened");

    let subscription = Subscription {
        rx: state.notifications.subscribe(),
        place_id: staff.place_id.clone(),
        shutdown: state.notifications.shutdown_token(),
    };

    let events = stream::unfold(subscription, |mut sub| async move {
        loop {
            tokio::select! {
                _ = sub.shutdown.cancelled() => return None,
                result = sub.rx.recv() => match result {
                    Ok(notification) => {
                        if notification.place_id != sub.place_id {
                            continue;
                        }
                        let event = Event::default()
                            .event(notification.kind.to_string())
                            .json_data(&notification)
                            .unwrap_or_else(|e| {
                                tracing::warn!("Failed to encode notification: {e}");
                                Event::default().comment("encode error")
                            });
                        return Some((Ok(event), sub));
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("Notification stream lagged {n} messages");
                        let event = Event::default().event("lagged").data(n.to_string());
                        return Some((Ok(event), sub));
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                },
            }
        }
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
