//! 配置管理器 - 负责处理不同环境下的配置覆盖
//!
//! 该模块提供了配置管理功能，包括：
//! - 获取当前运行环境
//! - 加载环境特定配置
//! - 合并 MongoDB 与日志配置值

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use toml::Value;

use super::{InboxAppConfig, LoggingConfig, MongoInstanceConfig};

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取当前环境名称
    ///
    /// 从环境变量 INBOX_ENV 获取当前环境名称，
    /// 如果未设置则默认为 "development"
    pub fn get_environment() -> String {
        env::var("INBOX_ENV").unwrap_or_else(|_| "development".to_string())
    }

    /// 根据环境加载特定配置
    ///
    /// 加载 config/environments/{environment}.toml 文件中的配置，
    /// 并将其合并到基础配置中
    pub fn load_environment_config(base_config: &mut InboxAppConfig) -> Result<()> {
        let env = Self::get_environment();
        let env_config_path = format!("config/environments/{}.toml", env);

        if Path::new(&env_config_path).exists() {
            let env_config_content = fs::read_to_string(&env_config_path)
                .with_context(|| format!("无法读取环境配置文件: {}", env_config_path))?;
            let env_config: Value = toml::from_str(&env_config_content)
                .with_context(|| format!("无效的环境配置格式: {}", env_config_path))?;

            Self::apply_environment_values(base_config, &env_config);
        }

        Ok(())
    }

    /// 将环境配置值合并到基础配置中
    pub(crate) fn apply_environment_values(base_config: &mut InboxAppConfig, env_config: &Value) {
        Self::merge_mongodb_values(&mut base_config.mongodb, env_config);
        Self::merge_logging_values(&mut base_config.logging, env_config);
    }

    /// 合并 MongoDB 配置
    ///
    /// 只有包含 url 的条目才会覆盖同名配置
    fn merge_mongodb_values(
        mongodb: &mut HashMap<String, MongoInstanceConfig>,
        env_config: &Value,
    ) {
        let Some(tables) = env_config.get("mongodb").and_then(|v| v.as_table()) else {
            return;
        };

        for (key, value) in tables {
            if let Some(url) = value.get("url").and_then(|v| v.as_str()) {
                let mut config = MongoInstanceConfig {
                    url: url.to_string(),
                    database: None,
                };
                if let Some(database) = value.get("database").and_then(|v| v.as_str()) {
                    config.database = Some(database.to_string());
                }
                mongodb.insert(key.clone(), config);
            }
        }
    }

    /// 合并日志配置
    fn merge_logging_values(logging: &mut LoggingConfig, env_config: &Value) {
        let Some(value) = env_config.get("logging") else {
            return;
        };

        if let Some(level) = value.get("level").and_then(|v| v.as_str()) {
            logging.level = level.to_string();
        }
        if let Some(with_target) = value.get("with_target").and_then(|v| v.as_bool()) {
            logging.with_target = with_target;
        }
        if let Some(with_thread_ids) = value.get("with_thread_ids").and_then(|v| v.as_bool()) {
            logging.with_thread_ids = with_thread_ids;
        }
        if let Some(with_file) = value.get("with_file").and_then(|v| v.as_bool()) {
            logging.with_file = with_file;
        }
        if let Some(with_line_number) = value.get("with_line_number").and_then(|v| v.as_bool()) {
            logging.with_line_number = with_line_number;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_values_override_profiles_and_logging() {
        let mut cfg = super::super::default_config();
        cfg.mongodb.insert(
            "primary".to_string(),
            MongoInstanceConfig {
                url: "mongodb://localhost:27017".to_string(),
                database: Some("inbox".to_string()),
            },
        );

        let env_config: Value = toml::from_str(
            r#"
            [logging]
            level = "warn"
            with_file = true

            [mongodb.primary]
            url = "mongodb://prod:27017"

            [mongodb.broken]
            database = "ignored"
            "#,
        )
        .unwrap();

        ConfigManager::apply_environment_values(&mut cfg, &env_config);

        let primary = cfg.mongodb_profile("primary").unwrap();
        assert_eq!(primary.url, "mongodb://prod:27017");
        assert_eq!(primary.database, None);
        assert!(cfg.mongodb_profile("broken").is_none());
        assert_eq!(cfg.logging.level, "warn");
        assert!(cfg.logging.with_file);
    }
}
