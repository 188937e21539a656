//! Unified error system for the table service
//!
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ApiResponse`]: Error body rendered for failed requests
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication / guest session errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 6xxx: Menu errors
//! - 7xxx: Table errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let disabled = AppError::new(ErrorCode::TableDisabled);
//! assert_eq!(disabled.http_status().as_u16(), 403);
//! let err = AppError::with_message(ErrorCode::MenuItemUnavailable, "Not available: Soup")
//!     .with_detail("items", vec!["Soup"]);
//! let response = ApiResponse::error(&err);
//! assert_eq!(response.code, 6003);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
