//! 订单生命周期
//!
//! - [`OrderManager`] - 下单、改单、状态流转、删除
//! - [`transitions`] - 客人/员工的状态流转规则
//! - [`money`] - 金额计算 (rust_decimal)

pub mod manager;
pub mod money;
pub mod transitions;


pub use manager::OrderManager;
