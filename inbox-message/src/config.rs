use anyhow::Result;
use inbox_core::config::InboxAppConfig;
use std::env;

const DEFAULT_DATABASE: &str = "inbox";
const DEFAULT_MESSAGE_COLLECTION: &str = "conversation_messages";
const DEFAULT_CONVERSATION_COLLECTION: &str = "conversations";

#[derive(Clone, Debug)]
pub struct MessageStoreConfig {
    pub mongo_url: Option<String>,
    pub mongo_database: String,
    pub message_collection: String,
    pub conversation_collection: String,
}

impl MessageStoreConfig {
    /// 从应用配置加载，环境变量优先
    pub fn from_app_config(app: &InboxAppConfig) -> Result<Self> {
        let service_config = app.message_store_service();

        // 解析 MongoDB 配置引用
        let profile = service_config
            .mongodb
            .as_ref()
            .and_then(|name| app.mongodb_profile(name));

        let mongo_url = env::var("INBOX_MONGO_URL")
            .ok()
            .or_else(|| profile.map(|p| p.url.clone()))
            .filter(|url| !url.is_empty());

        let mongo_database = env::var("INBOX_MONGO_DATABASE")
            .ok()
            .or_else(|| profile.and_then(|p| p.database.clone()))
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let message_collection = env::var("INBOX_MESSAGE_COLLECTION")
            .ok()
            .or_else(|| service_config.message_collection.clone())
            .unwrap_or_else(|| DEFAULT_MESSAGE_COLLECTION.to_string());

        let conversation_collection = env::var("INBOX_CONVERSATION_COLLECTION")
            .ok()
            .or_else(|| service_config.conversation_collection.clone())
            .unwrap_or_else(|| DEFAULT_CONVERSATION_COLLECTION.to_string());

        Ok(Self {
            mongo_url,
            mongo_database,
            message_collection,
            conversation_collection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_profile_and_defaults() {
        let app: InboxAppConfig = toml::from_str(
            r#"
            [mongodb.primary]
            url = "mongodb://db:27017"
            database = "support"

            [services.message_store]
            mongodb = "primary"
            conversation_collection = "threads"
            "#,
        )
        .unwrap();

        let config = MessageStoreConfig::from_app_config(&app).unwrap();
        if env::var("INBOX_MONGO_URL").is_err() {
            assert_eq!(config.mongo_url.as_deref(), Some("mongodb://db:27017"));
        }
        if env::var("INBOX_MONGO_DATABASE").is_err() {
            assert_eq!(config.mongo_database, "support");
        }
        if env::var("INBOX_MESSAGE_COLLECTION").is_err() {
            assert_eq!(config.message_collection, DEFAULT_MESSAGE_COLLECTION);
        }
        if env::var("INBOX_CONVERSATION_COLLECTION").is_err() {
            assert_eq!(config.conversation_collection, "threads");
        }
    }
}
