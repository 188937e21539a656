//! 桌台通知消息类型
//!
//! Pushed by the table service to staff screens. Delivery is fire-and-forget:
//! a dropped notification never rolls back the state change behind it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// A guest scanned a disabled table
    StaffNeeded,
    /// A guest started or joined a seating
    GuestJoinedTable,
    /// The table was freed
    GuestLeftTable,
    /// A new order was placed
    OrderCreated,
    /// An order changed status
    OrderStatusUpdated,
    /// An order's items changed
    OrderContentUpdated,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotificationType::StaffNeeded => "staff_needed",
            NotificationType::GuestJoinedTable => "guest_joined_table",
            NotificationType::GuestLeftTable => "guest_left_table",
            NotificationType::OrderCreated => "order_created",
            NotificationType::OrderStatusUpdated => "order_status_updated",
            NotificationType::OrderContentUpdated => "order_content_updated",
        };
        f.write_str(s)
    }
}

/// A notification addressed to one table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableNotification {
    pub table_id: String,
    /// Owning place, used to route notifications to that place's staff
    pub place_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub message: String,
    /// Unix millis
    pub timestamp: i64,
}

impl TableNotification {
    pub fn new(
        table_id: impl Into<String>,
        place_id: impl Into<String>,
        kind: NotificationType,
        message: impl Into<String>,
    ) -> Self {
        Self {
            table_id: table_id.into(),
            place_id: place_id.into(),
            kind,
            message: message.into(),
            timestamp: crate::util::now_millis(),
        }
    }
}
