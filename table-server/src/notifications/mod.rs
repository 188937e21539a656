//! 桌台通知
//!
//! - [`NotificationSink`] - 状态变化后推送通知的接口
//! - [`NotificationHub`] - 内存实现: 每桌待处理列表 + 广播通道

pub mod hub;

pub use hub::{NotificationHub, NotificationSink};
