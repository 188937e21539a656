//! Place & Menu Models (read-only for the table service)

use serde::{Deserialize, Serialize};

/// A venue belonging to a business
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Place {
    pub id: String,
    pub business_id: String,
    pub name: String,
}

/// Live menu entry of a place
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    pub id: String,
    pub place_id: String,
    pub name: String,
    /// Price in currency unit
    pub price: f64,
    /// Discount percentage (0-100)
    #[serde(default)]
    pub discount_percent: f64,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}
