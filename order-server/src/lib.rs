//! Order Server - 多租户餐厅订单编排核心
//!
//! # 模块结构
//!
//! ```text
//! order-server/src/
//! ├── core/           # 配置、状态、服务器启动、后台任务
//! ├── auth/           # JWT、租户作用域 (Actor / AuthScope)
//! ├── db/             # SQLite 连接池与仓储
//! ├── orders/         # 订单生命周期 (创建、状态机、支付、取消)
//! ├── tables/         # 桌台与预订分配
//! ├── kitchen/        # 厨房看板 (KDS)
//! ├── notifications/  # 通知分发与重试
//! ├── payments/       # 支付回调验签
//! ├── live/           # 实时事件推送
//! ├── api/            # HTTP 路由和处理器
//! └── utils/          # 日志
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod kitchen;
pub mod live;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod tables;
pub mod utils;

// Re-export 公共类型
pub use auth::{Actor, AuthScope, JwtService};
pub use core::{Config, Server, ServerState};
pub use kitchen::KitchenService;
pub use notifications::NotificationDispatcher;
pub use orders::OrderManager;

pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
  ____          _
 / __ \________/ /__  _____
/ / / / ___/ __  / _ \/ ___/
/ /_/ / /  / /_/ /  __/ /
\____/_/   \__,_/\___/_/
    "#
    );
}
