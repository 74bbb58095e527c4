use order_server::core::ServerError;
use order_server::{Config, Server, init_logger_with_file, print_banner};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 环境变量 (.env 可选)
    let _ = dotenvy::dotenv();

    // 2. 加载配置
    let config = Config::from_env().map_err(|e| ServerError::Config(e.to_string()))?;

    // 3. 日志
    init_logger_with_file(&config.log_level, config.log_json, config.log_dir.as_deref())?;

    print_banner();
    tracing::info!("🦀 Order server starting...");

    // 4. 启动 HTTP 服务器 (后台任务随之启动)
    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
