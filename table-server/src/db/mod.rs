//! 数据库层
//!
//! - [`PosStorage`] - redb 存储 (桌台、会话、订单)
//! - [`seed`] - 启动时导入门店/菜单/桌台数据

pub mod seed;
pub mod storage;

pub use storage::{PosStorage, StorageError, StorageResult};
