//! 内存版存储实现
//!
//! 语义与 Mongo 实现保持一致，用于测试和未配置 MongoDB 的本地开发环境。

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::model::{Conversation, ConversationUpdate, Message, MessageFilter, SortOrder};
use crate::domain::repository::{ConversationRepository, MessageRepository};

#[derive(Default)]
pub struct InMemoryMessageRepository {
    // 按写入顺序保存，排序时创建时间相同的消息保持写入顺序
    messages: Arc<RwLock<Vec<Message>>>,
}

impl InMemoryMessageRepository {
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(&self, message: &Message) -> Result<()> {
        self.messages.write().await.push(message.clone());
        Ok(())
    }

    async fn find_by_id(&self, message_id: &str) -> Result<Option<Message>> {
        let messages = self.messages.read().await;
        Ok(messages.iter().find(|m| m.id == message_id).cloned())
    }

    async fn find(
        &self,
        filter: &MessageFilter,
        sort: SortOrder,
        limit: Option<i64>,
    ) -> Result<Vec<Message>> {
        let messages = self.messages.read().await;
        let mut matched: Vec<Message> = messages
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();

        match sort {
            SortOrder::Ascending => matched.sort_by_key(|m| m.created_at),
            SortOrder::Descending => {
                matched.reverse();
                matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            }
        }

        if let Some(limit) = limit.filter(|l| *l > 0) {
            matched.truncate(limit as usize);
        }
        Ok(matched)
    }

    async fn count(&self, filter: &MessageFilter) -> Result<u64> {
        let messages = self.messages.read().await;
        Ok(messages.iter().filter(|m| filter.matches(m)).count() as u64)
    }

    async fn mark_customer_read(&self, filter: &MessageFilter) -> Result<u64> {
        let mut messages = self.messages.write().await;
        let mut modified = 0u64;
        for message in messages.iter_mut().filter(|m| filter.matches(m)) {
            if !message.is_customer_read {
                message.is_customer_read = true;
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn set_customer(&self, filter: &MessageFilter, customer_id: &str) -> Result<u64> {
        let mut messages = self.messages.write().await;
        let mut modified = 0u64;
        for message in messages.iter_mut().filter(|m| filter.matches(m)) {
            if message.customer_id.as_deref() != Some(customer_id) {
                message.customer_id = Some(customer_id.to_string());
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn delete(&self, filter: &MessageFilter) -> Result<u64> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|m| !filter.matches(m));
        Ok((before - messages.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryConversationRepository {
    conversations: Arc<RwLock<HashMap<String, Conversation>>>,
}

impl InMemoryConversationRepository {
    /// 写入会话（会话由外部服务创建，这里用于测试和本地开发）
    pub async fn insert(&self, conversation: Conversation) {
        self.conversations
            .write()
            .await
            .insert(conversation.id.clone(), conversation);
    }

    pub async fn get(&self, conversation_id: &str) -> Option<Conversation> {
        self.conversations.read().await.get(conversation_id).cloned()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn find_by_id(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        Ok(self.get(conversation_id).await)
    }

    async fn update_by_id(&self, conversation_id: &str, update: &ConversationUpdate) -> Result<()> {
        let mut conversations = self.conversations.write().await;
        if let Some(conversation) = conversations.get_mut(conversation_id) {
            update.apply_to(conversation);
        }
        Ok(())
    }

    async fn add_participants(&self, conversation_id: &str, user_ids: &[String]) -> Result<()> {
        let mut conversations = self.conversations.write().await;
        if let Some(conversation) = conversations.get_mut(conversation_id) {
            conversation
                .participated_user_ids
                .extend(user_ids.iter().cloned());
        }
        Ok(())
    }
}
