//! Order Model

use serde::{Deserialize, Serialize};

/// Order status
///
/// `created → delivered → payment_requested → closed`, with `cancelled`
/// reachable from `created` or `delivered`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Created,
    Delivered,
    PaymentRequested,
    Closed,
    Cancelled,
}

impl OrderStatus {
    /// Closed and cancelled orders never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Closed | OrderStatus::Cancelled)
    }

    /// Still running against the table (closed when the table is freed)
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            OrderStatus::Created | OrderStatus::Delivered | OrderStatus::PaymentRequested
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Created => "created",
            OrderStatus::Delivered => "delivered",
            OrderStatus::PaymentRequested => "payment_requested",
            OrderStatus::Closed => "closed",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Payment method chosen when requesting the bill
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Other,
}

/// Order entity (items stored separately, keyed by `(order_id, line_no)`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub table_id: String,
    pub place_id: String,
    pub customer_id: Option<String>,
    pub guest_session_id: Option<String>,
    pub status: OrderStatus,
    /// Server-computed total (currency unit)
    pub total_price: f64,
    pub payment_method: Option<PaymentMethod>,
    pub note: Option<String>,
    /// Set once staff edited the contents; guests can no longer edit
    #[serde(default)]
    pub modified_by_staff: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line with price snapshot taken from the menu at order time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub line_no: u32,
    pub menu_item_id: String,
    pub name: String,
    /// Unit price in currency unit
    pub unit_price: f64,
    /// Discount percentage (0-100)
    pub discount_percent: f64,
    pub quantity: i32,
}

/// Order with its lines
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Requested line of an order draft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineInput {
    pub menu_item_id: String,
    pub quantity: i32,
}

/// Create / update order payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderDraft {
    /// Required for staff; guests order for the table of their session
    #[serde(default)]
    pub table_id: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderLineInput>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Accepted for client compatibility, never trusted
    #[serde(default)]
    pub total_price: Option<f64>,
}

/// Status change payload (`PUT /api/orders/{id}/status`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusChange {
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_and_open_partition() {
        for status in [
            OrderStatus::Created,
            OrderStatus::Delivered,
            OrderStatus::PaymentRequested,
            OrderStatus::Closed,
            OrderStatus::Cancelled,
        ] {
            assert_ne!(status.is_terminal(), status.is_open(), "{status}");
        }
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&OrderStatus::PaymentRequested).unwrap();
        assert_eq!(json, "\"payment_requested\"");
    }

    #[test]
    fn test_detail_flattens_order_fields() {
        let detail = OrderDetail {
            order: Order {
                id: "o-1".into(),
                table_id: "t-1".into(),
                place_id: "p-1".into(),
                customer_id: None,
                guest_session_id: None,
                status: OrderStatus::Created,
                total_price: 15.0,
                payment_method: None,
                note: None,
                modified_by_staff: false,
                created_at: 0,
                updated_at: 0,
            },
            items: vec![],
        };
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["id"], "o-1");
        assert_eq!(value["status"], "created");
        assert!(value["items"].as_array().unwrap().is_empty());
    }
}
