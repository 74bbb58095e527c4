type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | DATABASE_URL | sqlite://data/orders.db | SQLite 数据库 |
/// | HTTP_PORT | 8080 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | JWT_SECRET | (dev fallback) | 非 development 环境必须设置 |
/// | PAYMENT_WEBHOOK_SECRET | (dev fallback) | 非 development 环境必须设置 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 格式日志 |
/// | LOG_DIR | - | 文件日志目录 |
/// | NOTIFY_MAX_RETRIES | 3 | 通知最大重试次数 |
/// | NOTIFY_QUEUE_CAPACITY | 1024 | 通知队列容量 |
/// | NOTIFY_CONCURRENCY | 8 | 通知并发发送数 |
/// | EMAIL_GATEWAY_URL | - | 邮件网关 (未设置时只记录日志) |
/// | SMS_GATEWAY_URL | - | 短信网关 (未设置时只记录日志) |
/// | KDS_POLL_INTERVAL_SECS | 10 | 厨房看板轮询间隔 |
/// | RESERVATION_MINUTES | 90 | 堂食预订时长 |
/// | WEBHOOK_TOLERANCE_SECS | 300 | Webhook 时间戳容差 |
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    pub jwt_secret: String,
    pub payment_webhook_secret: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    pub notify_max_retries: i32,
    pub notify_queue_capacity: usize,
    pub notify_concurrency: usize,
    pub email_gateway_url: Option<String>,
    pub sms_gateway_url: Option<String>,
    pub kds_poll_interval_secs: u64,
    pub reservation_minutes: i64,
    pub webhook_tolerance_secs: i64,
}

impl Config {
    /// Require a secret env var: must be set and non-empty outside development.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn optional(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|s| !s.is_empty())
    }

    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let notify_max_retries: i32 = Self::parsed("NOTIFY_MAX_RETRIES", 3);
        if notify_max_retries < 1 {
            return Err("NOTIFY_MAX_RETRIES must be at least 1".into());
        }

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://data/orders.db".into()),
            http_port: Self::parsed("HTTP_PORT", 8080),
            environment: environment.clone(),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            payment_webhook_secret: Self::require_secret("PAYMENT_WEBHOOK_SECRET", &environment)?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: Self::parsed("LOG_JSON", false),
            log_dir: Self::optional("LOG_DIR"),
            notify_max_retries,
            notify_queue_capacity: Self::parsed("NOTIFY_QUEUE_CAPACITY", 1024),
            notify_concurrency: Self::parsed("NOTIFY_CONCURRENCY", 8),
            email_gateway_url: Self::optional("EMAIL_GATEWAY_URL"),
            sms_gateway_url: Self::optional("SMS_GATEWAY_URL"),
            kds_poll_interval_secs: Self::parsed("KDS_POLL_INTERVAL_SECS", 10),
            reservation_minutes: Self::parsed("RESERVATION_MINUTES", 90),
            webhook_tolerance_secs: Self::parsed("WEBHOOK_TOLERANCE_SECS", 300),
        })
    }

    /// Deterministic configuration for tests (in-memory database, log-only transports)
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            http_port: 0,
            environment: "development".into(),
            jwt_secret: "test-jwt-secret".into(),
            payment_webhook_secret: "test-webhook-secret".into(),
            log_level: "debug".into(),
            log_json: false,
            log_dir: None,
            notify_max_retries: 3,
            notify_queue_capacity: 64,
            notify_concurrency: 4,
            email_gateway_url: None,
            sms_gateway_url: None,
            kds_poll_interval_secs: 10,
            reservation_minutes: 90,
            webhook_tolerance_secs: 300,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
