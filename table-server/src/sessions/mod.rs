//! 客人会话管理
//!
//! 一桌一组 (group)，组内每位客人一个会话 (session)。
//! 第一位扫码的客人创建组并获得口令，其余客人凭口令加入。

pub mod manager;
pub mod passphrase;

pub use manager::GuestSessionManager;
pub use passphrase::{generate_passphrase, passphrase_matches};
