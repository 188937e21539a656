use std::sync::Arc;

use crate::auth::JwtService;
use crate::core::{Config, Result};
use crate::db::{PosStorage, seed};
use crate::notifications::{NotificationHub, NotificationSink};
use crate::orders::OrderManager;
use crate::sessions::GuestSessionManager;
use crate::tables::TableController;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 所有字段都是 `Arc` 或内部 `Arc` 的句柄，克隆成本极低。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | storage | redb 存储 |
/// | jwt_service | JWT 令牌服务 |
/// | notifications | 桌台通知中心 |
/// | sessions | 客人会话管理 |
/// | tables | 桌台状态控制 |
/// | orders | 订单生命周期 |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub storage: PosStorage,
    pub jwt_service: Arc<JwtService>,
    pub notifications: NotificationHub,
    pub sessions: GuestSessionManager,
    pub tables: TableController,
    pub orders: OrderManager,
}

impl ServerState {
    /// 用已打开的存储组装服务
    pub fn new(config: Config, storage: PosStorage) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let notifications = NotificationHub::new();
        let sink: Arc<dyn NotificationSink> = Arc::new(notifications.clone());

        let sessions = GuestSessionManager::new(
            storage.clone(),
            jwt_service.clone(),
            config.passphrase_length,
        );
        let tables = TableController::new(storage.clone(), sessions.clone(), sink.clone());
        let orders = OrderManager::new(storage.clone(), sessions.clone(), sink);

        Self {
            config,
            storage,
            jwt_service,
            notifications,
            sessions,
            tables,
            orders,
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database/tables.redb)
    /// 3. 可选的种子数据导入 (SEED_FILE)
    pub fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;

        let storage = PosStorage::open(config.database_path())?;
        tracing::info!(path = %config.database_path().display(), "Database opened");

        if let Some(seed_file) = &config.seed_file {
            seed::load_seed_file(&storage, seed_file)?;
        }

        Ok(Self::new(config.clone(), storage))
    }

    /// 内存数据库状态 (测试)
    pub fn in_memory(config: Config) -> Result<Self> {
        Ok(Self::new(config, PosStorage::open_in_memory()?))
    }
}
