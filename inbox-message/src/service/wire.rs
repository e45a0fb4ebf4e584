//! Wire 风格的依赖注入模块
//!
//! 按照依赖顺序构建仓储、领域服务和处理器

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::application::handlers::{MessageCommandHandler, MessageQueryHandler};
use crate::config::MessageStoreConfig;
use crate::domain::repository::{ConversationRepository, MessageRepository};
use crate::domain::service::MessageDomainService;
use crate::infrastructure::persistence::memory::{
    InMemoryConversationRepository, InMemoryMessageRepository,
};
use crate::infrastructure::persistence::mongo_client;
use crate::infrastructure::persistence::mongo_conversation_repo::MongoConversationRepository;
use crate::infrastructure::persistence::mongo_message_repo::MongoMessageRepository;

/// 应用上下文 - 包含所有已初始化的服务
pub struct ApplicationContext {
    pub config: Arc<MessageStoreConfig>,
    pub command_handler: Arc<MessageCommandHandler>,
    pub query_handler: Arc<MessageQueryHandler>,
    /// 是否为内存存储（未配置 MongoDB）
    pub in_memory: bool,
}

/// 构建应用上下文
///
/// # 参数
/// * `app_config` - 应用配置
pub async fn initialize(
    app_config: &inbox_core::config::InboxAppConfig,
) -> Result<ApplicationContext> {
    // 1. 加载消息存储配置
    let config = Arc::new(
        MessageStoreConfig::from_app_config(app_config)
            .context("Failed to load message store service configuration")?,
    );

    // 2. 创建仓储（MongoDB，未配置时使用内存实现）
    let database = mongo_client::connect(&config)
        .await
        .context("Failed to create MongoDB client")?;

    let (messages, conversations, in_memory): (
        Arc<dyn MessageRepository + Send + Sync>,
        Arc<dyn ConversationRepository + Send + Sync>,
        bool,
    ) = match database {
        Some(database) => {
            let messages = MongoMessageRepository::new(&database, &config.message_collection)
                .await
                .context("Failed to prepare message collection")?;
            let conversations =
                MongoConversationRepository::new(&database, &config.conversation_collection);
            info!(
                message_collection = %config.message_collection,
                conversation_collection = %config.conversation_collection,
                "Using MongoDB message store"
            );
            (
                Arc::new(messages) as Arc<dyn MessageRepository + Send + Sync>,
                Arc::new(conversations) as Arc<dyn ConversationRepository + Send + Sync>,
                false,
            )
        }
        None => {
            warn!("MongoDB is not configured, falling back to in-memory message store");
            (
                Arc::new(InMemoryMessageRepository::default())
                    as Arc<dyn MessageRepository + Send + Sync>,
                Arc::new(InMemoryConversationRepository::default())
                    as Arc<dyn ConversationRepository + Send + Sync>,
                true,
            )
        }
    };

    // 3. 创建领域服务
    let domain_service = Arc::new(MessageDomainService::new(messages, conversations));

    // 4. 创建处理器
    let command_handler = Arc::new(MessageCommandHandler::new(domain_service.clone()));
    let query_handler = Arc::new(MessageQueryHandler::new(domain_service));

    Ok(ApplicationContext {
        config,
        command_handler,
        query_handler,
        in_memory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn falls_back_to_memory_without_mongodb() {
        if std::env::var("INBOX_MONGO_URL").is_ok()
            || std::env::var("INBOX_MESSAGE_COLLECTION").is_ok()
        {
            return;
        }

        let app: inbox_core::config::InboxAppConfig = toml::from_str("").unwrap();
        let context = initialize(&app).await.unwrap();
        assert!(context.in_memory);
        assert_eq!(context.config.message_collection, "conversation_messages");
    }
}
