//! 服务模块 - 包含服务启动和依赖构建

use anyhow::Result;
use tracing::info;

mod wire;

pub use wire::{ApplicationContext, initialize};

/// 应用启动器
pub struct ApplicationBootstrap;

impl ApplicationBootstrap {
    /// 运行应用的主入口点
    ///
    /// 加载配置、初始化日志、连接 MongoDB 并确保集合索引存在
    pub async fn run(config_path: Option<&str>) -> Result<()> {
        let app_config = inbox_core::utils::ServiceHelper::load_config(config_path, false)?;

        inbox_core::tracing::init_tracing(&app_config.service_name, Some(&app_config.logging));

        let context = initialize(app_config).await?;

        info!(
            database = %context.config.mongo_database,
            in_memory = context.in_memory,
            "Message store ready"
        );

        Ok(())
    }
}
