//! API 路由模块
//!
//! - [`health`] - 健康检查
//! - [`orders`] - 员工订单接口
//! - [`customer_orders`] - 顾客订单接口
//! - [`kitchen`] - 厨房看板 (KDS)
//! - [`notifications`] - 通知发送 / 重试
//! - [`payments`] - 支付回调
//! - [`live`] - 实时推送 WebSocket

pub mod customer_orders;
pub mod health;
pub mod kitchen;
pub mod live;
pub mod notifications;
pub mod orders;
pub mod payments;
