use crate::identity::TokenConfig;

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | DB_PATH | ./data/store.db | SQLite 数据库路径 |
/// | ENVIRONMENT | development | 运行环境 |
/// | BATCH_WINDOW_HOURS | 72 | 批次促销窗口（小时） |
/// | EXPIRY_SWEEP_INTERVAL_SECS | 60 | 过期扫描间隔（秒） |
/// | PAYMENT_BASE_URL | (未设置 = 内置 mock) | 支付网关地址 |
/// | ORDER_SERVICE_BASE_URL | (未设置 = 内置 mock) | 订单服务地址 |
/// | COLLABORATOR_TIMEOUT_MS | 10000 | 协作方请求超时（毫秒） |
/// | CURRENCY | EUR | 默认币种 |
///
/// # 示例
///
/// ```ignore
/// HTTP_PORT=8080 DB_PATH=/data/store.db cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// SQLite 数据库路径
    pub db_path: String,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 批次促销窗口长度（毫秒）
    pub batch_window_ms: i64,
    /// 过期扫描间隔（毫秒）
    pub expiry_sweep_interval_ms: u64,
    /// 支付网关地址；未设置时使用内置 mock（仅限开发）
    pub payment_base_url: Option<String>,
    /// 订单服务地址；未设置时使用内置 mock（仅限开发）
    pub order_service_base_url: Option<String>,
    /// 协作方请求超时（毫秒）
    pub collaborator_timeout_ms: u64,
    /// 默认币种
    pub currency: String,
    /// 匿名身份令牌配置
    pub token: TokenConfig,
}

impl Config {
    /// 从环境变量加载配置，未设置时使用默认值
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "./data/store.db".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            batch_window_ms: std::env::var("BATCH_WINDOW_HOURS")
                .ok()
                .and_then(|h| h.parse::<i64>().ok())
                .unwrap_or(72)
                * 3_600_000,
            expiry_sweep_interval_ms: std::env::var("EXPIRY_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60)
                * 1000,
            payment_base_url: std::env::var("PAYMENT_BASE_URL").ok(),
            order_service_base_url: std::env::var("ORDER_SERVICE_BASE_URL").ok(),
            collaborator_timeout_ms: std::env::var("COLLABORATOR_TIMEOUT_MS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(10_000),
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "EUR".into()),
            token: TokenConfig::default(),
        }
    }
}
