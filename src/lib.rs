//! Inbox Core 公共库
//!
//! 提供统一的配置加载、日志初始化和通用工具函数

pub mod config;
pub mod tracing;
pub mod utils;

pub use config::{
    ConfigManager, InboxAppConfig, LoggingConfig, MessageStoreServiceConfig,
    MongoInstanceConfig, ServicesConfig, load_config,
};
pub use utils::*;
