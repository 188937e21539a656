//! Unified error codes for the table service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication / guest session errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 6xxx: Menu / place errors
//! - 7xxx: Table errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Guest session has expired or was ended
    SessionExpired = 1005,
    /// Guest session not found
    SessionNotFound = 1006,
    /// Guest already holds a live session on another table
    SessionConflict = 1007,
    /// Group passphrase does not match
    PassphraseInvalid = 1008,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Staff token required
    StaffRequired = 2002,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no items
    OrderEmpty = 4007,
    /// Order content can no longer be changed by this caller
    OrderLocked = 4008,
    /// Requested status change is not a legal transition
    InvalidStatusTransition = 4009,
    /// Requested status is not reachable by this caller
    OrderTransitionUnavailable = 4010,
    /// Only cancelled orders can be deleted
    OrderNotCancelled = 4011,
    /// Payment method required when requesting payment
    PaymentMethodRequired = 4012,

    // ==================== 6xxx: Menu ====================
    /// Menu item not found
    MenuItemNotFound = 6001,
    /// One or more menu items cannot be ordered
    MenuItemUnavailable = 6003,
    /// Place not found
    PlaceNotFound = 6101,

    // ==================== 7xxx: Table ====================
    /// Table not found
    TableNotFound = 7001,
    /// Table is disabled for guest scans
    TableDisabled = 7004,
    /// Table is not occupied
    TableNotOccupied = 7005,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",

            // Auth
            ErrorCode::NotAuthenticated => "Caller is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::SessionExpired => "Guest session has expired",
            ErrorCode::SessionNotFound => "Guest session not found",
            ErrorCode::SessionConflict => "Guest already has a live session at another table",
            ErrorCode::PassphraseInvalid => "Table passphrase is incorrect",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::StaffRequired => "Staff authentication is required",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order must contain at least one item",
            ErrorCode::OrderLocked => "Order can no longer be modified",
            ErrorCode::InvalidStatusTransition => "Invalid order status transition",
            ErrorCode::OrderTransitionUnavailable => "Order status is not available",
            ErrorCode::OrderNotCancelled => "Only cancelled orders can be deleted",
            ErrorCode::PaymentMethodRequired => "Payment method is required",

            // Menu
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::MenuItemUnavailable => "Menu items are not available",
            ErrorCode::PlaceNotFound => "Place not found",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableDisabled => "Table is disabled, staff has been notified",
            ErrorCode::TableNotOccupied => "Table is not occupied",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown numeric code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => ErrorCode::Success,
            1 => ErrorCode::Unknown,
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::AlreadyExists,
            5 => ErrorCode::InvalidRequest,

            1001 => ErrorCode::NotAuthenticated,
            1003 => ErrorCode::TokenExpired,
            1004 => ErrorCode::TokenInvalid,
            1005 => ErrorCode::SessionExpired,
            1006 => ErrorCode::SessionNotFound,
            1007 => ErrorCode::SessionConflict,
            1008 => ErrorCode::PassphraseInvalid,

            2001 => ErrorCode::PermissionDenied,
            2002 => ErrorCode::StaffRequired,

            4001 => ErrorCode::OrderNotFound,
            4007 => ErrorCode::OrderEmpty,
            4008 => ErrorCode::OrderLocked,
            4009 => ErrorCode::InvalidStatusTransition,
            4010 => ErrorCode::OrderTransitionUnavailable,
            4011 => ErrorCode::OrderNotCancelled,
            4012 => ErrorCode::PaymentMethodRequired,

            6001 => ErrorCode::MenuItemNotFound,
            6003 => ErrorCode::MenuItemUnavailable,
            6101 => ErrorCode::PlaceNotFound,

            7001 => ErrorCode::TableNotFound,
            7004 => ErrorCode::TableDisabled,
            7005 => ErrorCode::TableNotOccupied,

            9001 => ErrorCode::InternalError,
            9002 => ErrorCode::DatabaseError,
            9005 => ErrorCode::ConfigError,

            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}
