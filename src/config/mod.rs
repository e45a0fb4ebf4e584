//! Inbox Core 配置模块
//!
//! 该模块提供了应用程序配置管理功能，包括：
//! - 配置文件加载和解析
//! - 环境特定配置覆盖
//! - 日志、MongoDB 与消息存储服务配置定义

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::sync::OnceLock;
use toml::Value;
use tracing::warn;

// 导入配置管理器模块
mod manager;
pub use manager::ConfigManager;

/// 全局应用配置实例，使用 OnceLock 确保只初始化一次
static APP_CONFIG: OnceLock<InboxAppConfig> = OnceLock::new();

const DEFAULT_SERVICE_NAME: &str = "inbox";

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（RUST_LOG 优先）
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 是否输出 target
    #[serde(default = "default_true")]
    pub with_target: bool,
    /// 是否输出线程 ID
    #[serde(default)]
    pub with_thread_ids: bool,
    /// 是否输出文件名
    #[serde(default)]
    pub with_file: bool,
    /// 是否输出行号
    #[serde(default)]
    pub with_line_number: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            with_target: true,
            with_thread_ids: false,
            with_file: false,
            with_line_number: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

/// MongoDB 实例配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MongoInstanceConfig {
    /// MongoDB 连接 URL
    pub url: String,
    /// 数据库名称
    #[serde(default)]
    pub database: Option<String>,
}

/// 消息存储服务配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MessageStoreServiceConfig {
    /// 引用的 MongoDB 配置名称
    #[serde(default)]
    pub mongodb: Option<String>,
    /// 消息集合名称
    #[serde(default)]
    pub message_collection: Option<String>,
    /// 会话集合名称
    #[serde(default)]
    pub conversation_collection: Option<String>,
}

/// 服务配置集合
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServicesConfig {
    /// 消息存储服务配置
    #[serde(default)]
    pub message_store: Option<MessageStoreServiceConfig>,
}

/// Inbox 应用配置主结构体
#[derive(Debug, Clone, Deserialize)]
pub struct InboxAppConfig {
    /// 服务名称
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
    /// MongoDB 配置映射
    #[serde(default)]
    pub mongodb: HashMap<String, MongoInstanceConfig>,
    /// 服务配置
    #[serde(default)]
    pub services: ServicesConfig,
}

impl InboxAppConfig {
    /// 获取 MongoDB 配置
    pub fn mongodb_profile(&self, name: &str) -> Option<&MongoInstanceConfig> {
        self.mongodb.get(name)
    }

    /// 获取消息存储服务配置
    pub fn message_store_service(&self) -> MessageStoreServiceConfig {
        self.services.message_store.clone().unwrap_or_default()
    }

    /// 校验服务配置引用的基础设施配置是否存在
    pub fn validate_references(&self) -> Result<()> {
        let service = self.message_store_service();
        if let Some(name) = service.mongodb.as_deref() {
            if self.mongodb_profile(name).is_none() {
                return Err(anyhow!(
                    "services.message_store references unknown mongodb profile '{}'",
                    name
                ));
            }
        }
        Ok(())
    }

    /// 确保配置有默认值
    fn ensure_defaults(&mut self) {
        if self.service_name.is_empty() {
            self.service_name = default_service_name();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
    }
}

/// 加载配置
pub fn load_config(path: Option<&str>) -> &'static InboxAppConfig {
    let candidates: Vec<PathBuf> = match path {
        Some(p) => vec![PathBuf::from(p)],
        None => vec![PathBuf::from("config"), PathBuf::from("config.toml")],
    };

    APP_CONFIG.get_or_init(|| {
        let mut cfg = load_with_fallback(&candidates);
        // 加载环境特定配置
        if let Err(e) = manager::ConfigManager::load_environment_config(&mut cfg) {
            warn!("failed to load environment config: {}", e);
        }
        cfg
    })
}

/// 使用备选方案加载配置
fn load_with_fallback(candidates: &[PathBuf]) -> InboxAppConfig {
    for path in candidates {
        match load_config_from_source(path) {
            Ok(mut cfg) => {
                cfg.ensure_defaults();
                return cfg;
            }
            Err(err) => {
                warn!("failed to load config from {}: {err}", path.display());
            }
        }
    }

    warn!("no configuration source succeeded, falling back to defaults");
    default_config()
}

/// 从源加载配置
fn load_config_from_source(path: &Path) -> Result<InboxAppConfig> {
    if !path.exists() {
        return Err(anyhow!(
            "configuration path {} does not exist",
            path.display()
        ));
    }

    let metadata = path
        .metadata()
        .with_context(|| format!("unable to read metadata for {}", path.display()))?;

    if metadata.is_dir() {
        load_config_from_directory(path)
    } else {
        load_config_from_file(path)
    }
}

/// 从文件加载配置
fn load_config_from_file(path: &Path) -> Result<InboxAppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read config file: {}", path.display()))?;
    let mut cfg: InboxAppConfig = toml::from_str(&content)
        .with_context(|| format!("invalid config format: {}", path.display()))?;
    cfg.ensure_defaults();
    Ok(cfg)
}

/// 从目录加载配置
fn load_config_from_directory(path: &Path) -> Result<InboxAppConfig> {
    let base_file = path.join("base.toml");
    if !base_file.exists() {
        return Err(anyhow!(
            "missing base configuration: {}",
            base_file.display()
        ));
    }

    let mut merged = load_toml_value(&base_file)?;

    if !merged.is_table() {
        return Err(anyhow!(
            "base configuration must be a table: {}",
            base_file.display()
        ));
    }

    merge_directory(&mut merged, &path.join("shared"))?;
    merge_directory(&mut merged, &path.join("services"))?;
    merge_directory(&mut merged, &path.join("overrides"))?;

    let mut cfg: InboxAppConfig = merged
        .try_into()
        .with_context(|| format!("invalid configuration after merging {}", path.display()))?;
    cfg.ensure_defaults();

    Ok(cfg)
}

/// 合并目录中的配置
fn merge_directory(root: &mut Value, dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }

    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("unable to read config directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(OsStr::to_str)
                .map(|ext| ext.eq_ignore_ascii_case("toml"))
                .unwrap_or(false)
        })
        .collect::<Vec<_>>();

    entries.sort_by_key(|entry| entry.path());

    for entry in entries {
        let value = load_toml_value(&entry.path())?;
        merge_value(root, value);
    }

    Ok(())
}

/// 加载 TOML 值
fn load_toml_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read config fragment {}", path.display()))?;
    let value: Value = toml::from_str(&content)
        .with_context(|| format!("invalid TOML content in fragment {}", path.display()))?;
    Ok(value)
}

/// 合并值
fn merge_value(base: &mut Value, overlay: Value) {
    match overlay {
        Value::Table(overlay_table) => {
            if let Value::Table(base_table) = base {
                for (key, overlay_value) in overlay_table.into_iter() {
                    match base_table.get_mut(&key) {
                        Some(base_value) => merge_value(base_value, overlay_value),
                        None => {
                            base_table.insert(key, overlay_value);
                        }
                    }
                }
            } else {
                *base = Value::Table(overlay_table);
            }
        }
        other => {
            *base = other;
        }
    }
}

/// 默认配置
fn default_config() -> InboxAppConfig {
    InboxAppConfig {
        service_name: default_service_name(),
        logging: LoggingConfig::default(),
        mongodb: HashMap::new(),
        services: ServicesConfig::default(),
    }
}
