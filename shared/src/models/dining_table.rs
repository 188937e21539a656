//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Table occupancy state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    #[default]
    Empty,
    Occupied,
    Reserved,
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableStatus::Empty => write!(f, "empty"),
            TableStatus::Occupied => write!(f, "occupied"),
            TableStatus::Reserved => write!(f, "reserved"),
        }
    }
}

/// Dining table entity (桌台)
///
/// `salt` is the rotating secret printed into the table's QR code.
/// `disabled` is independent of `status`: a disabled table keeps its
/// occupancy but rejects guest scans.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiningTable {
    pub id: String,
    pub place_id: String,
    pub name: String,
    pub seats: i32,
    pub salt: String,
    #[serde(default)]
    pub status: TableStatus,
    #[serde(default)]
    pub disabled: bool,
    /// Live guest session group seated at this table
    #[serde(default)]
    pub current_group_id: Option<String>,
    /// Soft-delete timestamp (millis)
    #[serde(default)]
    pub deleted_at: Option<i64>,
}

impl DiningTable {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Public view of a table (no secret, no group id)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableView {
    pub id: String,
    pub place_id: String,
    pub name: String,
    pub seats: i32,
    pub status: TableStatus,
    pub disabled: bool,
}

impl From<&DiningTable> for TableView {
    fn from(table: &DiningTable) -> Self {
        Self {
            id: table.id.clone(),
            place_id: table.place_id.clone(),
            name: table.name.clone(),
            seats: table.seats,
            status: table.status,
            disabled: table.disabled,
        }
    }
}

/// Change table status payload (`PUT /api/tables/status`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStatusUpdate {
    pub salt: String,
    pub status: TableStatus,
}

/// Enable / disable payload (`PUT /api/tables/{id}/disabled`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDisabledUpdate {
    pub disabled: bool,
}
