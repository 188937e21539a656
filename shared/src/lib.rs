//! Shared types for the table service
//!
//! Domain models, notification messages and the unified error system used by
//! `table-server` and its clients.

pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use message::{NotificationType, TableNotification};
