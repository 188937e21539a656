use std::path::PathBuf;

use crate::auth::{JwtConfig, JwtError};

/// 服务器配置 - 桌台服务的所有配置项
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/crab/tables | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 日志格式 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | SEED_FILE | (none) | 启动时导入的门店/菜单/桌台 JSON |
/// | PASSPHRASE_LENGTH | 6 | 入座口令长度 |
/// | JWT_SECRET | (dev: random) | JWT 密钥, 至少 32 字符 |
/// | GUEST_SESSION_TTL_MINUTES | 30 | 客人会话有效期 |
/// | STAFF_TOKEN_TTL_MINUTES | 540 | 员工令牌有效期 |
/// | JWT_ISSUER / JWT_AUDIENCE | table-server / table-clients | 令牌签发者/受众 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/tables HTTP_PORT=8080 cargo run -p table-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库和日志
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// Optional seed import at startup
    pub seed_file: Option<String>,
    pub passphrase_length: usize,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值。JWT 密钥缺失在生产环境是错误。
    pub fn from_env() -> Result<Self, JwtError> {
        Ok(Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/crab/tables".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt: JwtConfig::from_env()?,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            seed_file: std::env::var("SEED_FILE").ok().filter(|s| !s.is_empty()),
            passphrase_length: std::env::var("PASSPHRASE_LENGTH")
                .ok()
                .and_then(|p| p.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(6),
        })
    }

    /// 测试用配置: 临时目录 + 固定密钥
    pub fn for_tests(work_dir: impl Into<String>) -> Self {
        Self {
            work_dir: work_dir.into(),
            http_port: 0,
            jwt: JwtConfig::with_secret("test-secret-test-secret-test-secret-0123"),
            environment: "test".into(),
            log_level: "debug".into(),
            log_json: false,
            request_timeout_ms: 30000,
            seed_file: None,
            passphrase_length: 6,
        }
    }

    /// 数据库目录: work_dir/database
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 数据库文件: work_dir/database/tables.redb
    pub fn database_path(&self) -> PathBuf {
        self.database_dir().join("tables.redb")
    }

    /// 日志目录: work_dir/logs
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_follow_work_dir() {
        let config = Config::for_tests("/tmp/tables");
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/tables/database/tables.redb")
        );
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/tables/logs"));
        assert!(!config.is_production());
    }

    #[test]
    fn test_ensure_work_dir_structure() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_tests(dir.path().to_string_lossy().to_string());
        config.ensure_work_dir_structure().unwrap();
        assert!(config.database_dir().is_dir());
        assert!(config.log_dir().is_dir());
    }
}
