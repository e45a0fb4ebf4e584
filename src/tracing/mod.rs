//! # 日志初始化模块
//!
//! 为各个服务模块提供统一的 tracing 日志初始化能力。

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// 从配置初始化日志系统
///
/// # 参数
/// * `logging_config` - 日志配置（可选），如果为 None 则使用默认配置
///
/// # 示例
/// ```rust,ignore
/// use inbox_core::config::LoggingConfig;
///
/// init_tracing_from_config(None);
///
/// let config = LoggingConfig {
///     level: "debug".to_string(),
///     with_target: false,
///     with_thread_ids: true,
///     with_file: true,
///     with_line_number: true,
/// };
/// init_tracing_from_config(Some(&config));
/// ```
pub fn init_tracing_from_config(logging_config: Option<&LoggingConfig>) {
    // 优先使用环境变量 RUST_LOG，如果没有则使用配置文件的日志级别
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let level_str = logging_config.map(|c| c.level.as_str()).unwrap_or("info");
            EnvFilter::new(level_str)
        }
    };

    let default_config = LoggingConfig::default();
    let config = logging_config.unwrap_or(&default_config);

    let builder = fmt::Subscriber::builder()
        .with_target(config.with_target)
        .with_thread_ids(config.with_thread_ids)
        .with_file(config.with_file)
        .with_line_number(config.with_line_number)
        .with_env_filter(env_filter);

    // 测试或重复初始化时全局 subscriber 可能已存在
    let _ = builder.try_init();
}

/// 初始化服务日志
///
/// # 参数
/// * `service_name` - 服务名称（如 "inbox-message"）
/// * `logging_config` - 日志配置
pub fn init_tracing(service_name: &str, logging_config: Option<&LoggingConfig>) {
    init_tracing_from_config(logging_config);

    info!(service_name = %service_name, "Tracing initialized");
}
