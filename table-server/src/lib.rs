//! Table Server - 餐桌占用 / 客人会话 / 订单生命周期
//!
//! # 架构概述
//!
//! - **扫码入座** (`tables`): 扫描桌台二维码, 开台、加入同桌、员工接管
//! - **客人会话** (`sessions`): 会话组、入座口令、JWT 客人令牌
//! - **订单** (`orders`): 下单、改单、状态流转、取消与删除
//! - **通知** (`notifications`): 员工屏幕的待处理通知与 SSE 推送
//! - **数据库** (`db`): 嵌入式 redb 存储, 单写事务串行化所有变更
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! table-server/src/
//! ├── core/           # 配置、状态、错误、服务器
//! ├── auth/           # JWT、调用者身份
//! ├── db/             # redb 存储、种子数据
//! ├── sessions/       # 客人会话管理
//! ├── tables/         # 桌台状态控制
//! ├── orders/         # 订单生命周期、金额计算
//! ├── notifications/  # 通知中心
//! ├── api/            # HTTP 路由和处理器
//! └── utils/          # 日志
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod notifications;
pub mod orders;
pub mod sessions;
pub mod tables;
pub mod utils;

// Re-export 公共类型
pub use auth::{Caller, JwtService};
pub use core::{Config, Server, ServerState};
pub use db::PosStorage;
pub use notifications::{NotificationHub, NotificationSink};
pub use orders::OrderManager;
pub use sessions::GuestSessionManager;
pub use tables::TableController;
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
  _____     _     _
 |_   _|_ _| |__ | | ___
   | |/ _` | '_ \| |/ _ \
   | | (_| | |_) | |  __/
   |_|\__,_|_.__/|_|\___|
    "#
    );
}
