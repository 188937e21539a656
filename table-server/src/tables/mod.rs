//! 桌台状态控制
//!
//! 扫码解析、桌台状态变更、清台 (ApplyEmptyStatus)，以及员工的桌台管理操作。

pub mod controller;

pub use controller::TableController;
