//! 启动期错误
//!
//! Request-path errors are `shared::error::AppError`; this type only covers
//! bringing the server up.

use shared::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据库初始化失败: {0}")]
    Database(#[from] AppError),

    #[error("通知网关初始化失败: {0}")]
    Transport(#[from] crate::notifications::TransportError),

    #[error("网络错误: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
