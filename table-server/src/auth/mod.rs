//! 认证模块
//!
//! - [`JwtService`] - JWT 令牌服务 (客人令牌 / 员工令牌)
//! - [`Caller`] - 当前调用者: 匿名、客人或员工
//! - [`extractor`] - axum 提取器, 从 Authorization 头解析 [`Caller`]

pub mod caller;
pub mod extractor;
pub mod jwt;

pub use caller::{Caller, GuestContext, StaffContext};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService, StaffRole, SubjectKind};
