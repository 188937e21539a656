//! Notification hub
//!
//! ```text
//!   controllers ──push()──▶ NotificationHub ──▶ pending[table_id]  (staff screen polls / clears)
//!                                  │
//!                                  └──▶ broadcast::Sender ──▶ SSE subscribers
//! ```
//!
//! Pushes happen after the state change has committed. Delivery failures are
//! logged and swallowed; they never undo the change.
//!
//! A table holds at most one pending `StaffNeeded`; repeated calls for help
//! are dropped until staff clear the table. The pending list is capped at
//! [`MAX_PENDING_PER_TABLE`], oldest first out.

use std::sync::Arc;

use dashmap::DashMap;
use shared::message::{NotificationType, TableNotification};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Pending notifications kept per table
pub const MAX_PENDING_PER_TABLE: usize = 100;

/// Receiver of table notifications
pub trait NotificationSink: Send + Sync + std::fmt::Debug {
    /// Deliver a notification (fire-and-forget)
    fn push(&self, notification: TableNotification);

    /// Drop every pending notification of a table
    fn clear(&self, table_id: &str);
}

/// In-memory notification hub
#[derive(Debug, Clone)]
pub struct NotificationHub {
    /// table_id -> notifications not yet acknowledged by staff
    pending: Arc<DashMap<String, Vec<TableNotification>>>,
    tx: broadcast::Sender<TableNotification>,
    shutdown_token: CancellationToken,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            pending: Arc::new(DashMap::new()),
            tx,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Pending notifications of a table, oldest first
    pub fn pending(&self, table_id: &str) -> Vec<TableNotification> {
        self.pending
            .get(table_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Live feed of every notification pushed from now on
    pub fn subscribe(&self) -> broadcast::Receiver<TableNotification> {
        self.tx.subscribe()
    }

    /// Cancelled on server shutdown; ends open streams
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn shutdown(&self) {
        self.shutdown_token.cancel();
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for NotificationHub {
    fn push(&self, notification: TableNotification) {
        {
            let mut pending = self.pending.entry(notification.table_id.clone()).or_default();
            if notification.kind == NotificationType::StaffNeeded
                && pending.iter().any(|n| n.kind == NotificationType::StaffNeeded)
            {
                tracing::debug!(table_id = %notification.table_id, "Staff already called, skipped");
                return;
            }
            pending.push(notification.clone());
            if pending.len() > MAX_PENDING_PER_TABLE {
                let overflow = pending.len() - MAX_PENDING_PER_TABLE;
                pending.drain(..overflow);
            }
        }

        tracing::debug!(
            table_id = %notification.table_id,
            kind = %notification.kind,
            "Table notification"
        );
        // No subscribers is fine
        if self.tx.send(notification).is_err() {
            tracing::trace!("No live notification subscribers");
        }
    }

    fn clear(&self, table_id: &str) {
        self.pending.remove(table_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_clear() {
        let hub = NotificationHub::new();
        hub.push(TableNotification::new("t-1", "p-1", NotificationType::StaffNeeded, "help"));
        hub.push(TableNotification::new("t-1", "p-1", NotificationType::OrderCreated, "order"));
        hub.push(TableNotification::new("t-2", "p-1", NotificationType::StaffNeeded, "help"));

        let pending = hub.pending("t-1");
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].kind, NotificationType::StaffNeeded);

        hub.clear("t-1");
        assert!(hub.pending("t-1").is_empty());
        assert_eq!(hub.pending("t-2").len(), 1);
    }

    #[test]
    fn test_staff_needed_collapses_until_cleared() {
        let hub = NotificationHub::new();
        let mut rx = hub.subscribe();
        for _ in 0..3 {
            hub.push(TableNotification::new("t-1", "p-1", NotificationType::StaffNeeded, "help"));
        }
        hub.push(TableNotification::new("t-2", "p-1", NotificationType::StaffNeeded, "help"));

        assert_eq!(hub.pending("t-1").len(), 1);
        assert_eq!(hub.pending("t-2").len(), 1);
        assert_eq!(rx.try_recv().unwrap().table_id, "t-1");
        assert_eq!(rx.try_recv().unwrap().table_id, "t-2");
        assert!(rx.try_recv().is_err());

        hub.clear("t-1");
        hub.push(TableNotification::new("t-1", "p-1", NotificationType::StaffNeeded, "again"));
        assert_eq!(hub.pending("t-1")[0].message, "again");
    }

    #[test]
    fn test_pending_drops_oldest_over_cap() {
        let hub = NotificationHub::new();
        for i in 0..MAX_PENDING_PER_TABLE + 5 {
            hub.push(TableNotification::new(
                "t-1",
                "p-1",
                NotificationType::OrderCreated,
                format!("order {i}"),
            ));
        }

        let pending = hub.pending("t-1");
        assert_eq!(pending.len(), MAX_PENDING_PER_TABLE);
        assert_eq!(pending[0].message, "order 5");
        assert_eq!(
            pending.last().unwrap().message,
            format!("order {}", MAX_PENDING_PER_TABLE + 4)
        );
    }

    #[tokio::test]
    async fn test_subscribers_receive_pushes() {
        let hub = NotificationHub::new();
        let mut rx = hub.subscribe();

        hub.push(TableNotification::new("t-1", "p-1", NotificationType::GuestJoinedTable, "joined"));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.table_id, "t-1");
        assert_eq!(received.kind, NotificationType::GuestJoinedTable);
    }

    #[test]
    fn test_shutdown_cancels_token() {
        let hub = NotificationHub::new();
        let token = hub.shutdown_token();
        assert!(!token.is_cancelled());
        hub.shutdown();
        assert!(token.is_cancelled());
    }
}
