use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;

/// 初始化日志：级别取 RUST_LOG 或配置，格式取 LOG_FORMAT 或配置（text/json）
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| config.format.clone());

    let stdout_layer = if format.eq_ignore_ascii_case("json") {
        fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    };

    // 重复初始化（例如测试中）时忽略
    let _ = Registry::default()
        .with(filter)
        .with(stdout_layer)
        .try_init();
}
