//! Data models
//!
//! Shared between table-server and clients (via API).
//! All IDs are `String`; timestamps are Unix millis (`i64`).

pub mod dining_table;
pub mod guest_session;
pub mod menu;
pub mod order;

// Re-exports
pub use dining_table::*;
pub use guest_session::*;
pub use menu::*;
pub use order::*;
