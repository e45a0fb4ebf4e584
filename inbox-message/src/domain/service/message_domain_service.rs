//! 会话消息领域服务 - 包含消息存储的全部业务规则
//!
//! 职责：
//! - 校验消息内容与所属会话
//! - 写入/删除消息后同步会话的冗余字段（message_count、参与者、最后内容）
//! - 客户已读状态、客户合并等消息维护操作

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use inbox_core::utils::is_blank_content;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::model::{
    Attachment, Conversation, ConversationUpdate, Message, MessageFilter, NewMessage, SortOrder,
};
use crate::domain::repository::{ConversationRepository, MessageRepository};
use crate::error::{MessageStoreError, Result};

/// 会话消息领域服务
pub struct MessageDomainService {
    messages: Arc<dyn MessageRepository + Send + Sync>,
    conversations: Arc<dyn ConversationRepository + Send + Sync>,
}

impl MessageDomainService {
    pub fn new(
        messages: Arc<dyn MessageRepository + Send + Sync>,
        conversations: Arc<dyn ConversationRepository + Send + Sync>,
    ) -> Self {
        Self {
            messages,
            conversations,
        }
    }

    /// 创建消息
    ///
    /// 写入后重新统计会话消息数，并把发送者和被提及用户加入参与者
    #[instrument(skip(self, draft), fields(conversation_id = %draft.conversation_id))]
    pub async fn create_message(&self, draft: NewMessage) -> Result<Message> {
        self.require_conversation(&draft.conversation_id).await?;
        self.persist(draft).await
    }

    /// 向会话追加消息
    ///
    /// `user_id` 为发送消息的客服，覆盖 draft 中的 user_id
    #[instrument(skip(self, draft), fields(conversation_id = %draft.conversation_id))]
    pub async fn add_message(&self, mut draft: NewMessage, user_id: Option<&str>) -> Result<Message> {
        let conversation = self.require_conversation(&draft.conversation_id).await?;

        let content = draft.content.take().unwrap_or_default();
        let attachments = draft.attachments.take().unwrap_or_default();
        ensure_content(&content, &attachments)?;

        if let Some(user_id) = user_id {
            draft.user_id = Some(user_id.to_string());
        }

        let now = Utc::now();
        let mut update = ConversationUpdate {
            content: Some(content.clone()),
            updated_at: Some(now),
            ..Default::default()
        };

        // 首个回复的客服（内部备注和机器人消息不算回复）
        if conversation.first_responded_user_id.is_none()
            && !draft.from_bot
            && !draft.internal.unwrap_or(false)
        {
            if let Some(author) = &draft.user_id {
                update.first_responded_user_id = Some(author.clone());
                update.first_responded_date = Some(now);
            }
        }

        draft.content = Some(content);
        draft.attachments = Some(attachments);
        let message = self.persist(draft).await?;

        // 会话字段只在消息写入成功后更新
        self.conversations
            .update_by_id(&conversation.id, &update)
            .await?;

        Ok(message)
    }

    /// 批量删除消息，并重新统计受影响会话的消息数
    #[instrument(skip(self))]
    pub async fn remove_messages(&self, filter: &MessageFilter) -> Result<u64> {
        let matched = self.messages.find(filter, SortOrder::Ascending, None).await?;
        let deleted = self.messages.delete(filter).await?;

        let conversation_ids: BTreeSet<&str> = matched
            .iter()
            .map(|message| message.conversation_id.as_str())
            .collect();
        for conversation_id in conversation_ids {
            self.sync_message_count(conversation_id).await?;
        }

        debug!(deleted, "Removed conversation messages");
        Ok(deleted)
    }

    /// 会话中最近一条客户消息（尚未被回答的客户消息）
    #[instrument(skip(self))]
    pub async fn latest_customer_message(&self, conversation_id: &str) -> Result<Option<Message>> {
        self.require_conversation(conversation_id).await?;

        let filter = MessageFilter::by_conversation(conversation_id).sent_by_customer();
        let mut latest = self
            .messages
            .find(&filter, SortOrder::Descending, Some(1))
            .await?;
        Ok(latest.pop())
    }

    /// 客户尚未阅读的客服消息（不含内部备注），按时间升序
    #[instrument(skip(self))]
    pub async fn unread_agent_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        self.require_conversation(conversation_id).await?;

        let filter = unread_agent_filter(conversation_id);
        Ok(self
            .messages
            .find(&filter, SortOrder::Ascending, None)
            .await?)
    }

    /// 将客服消息标记为客户已读，返回修改条数
    #[instrument(skip(self))]
    pub async fn mark_agent_messages_read(&self, conversation_id: &str) -> Result<u64> {
        self.require_conversation(conversation_id).await?;

        let modified = self
            .messages
            .mark_customer_read(&unread_agent_filter(conversation_id))
            .await?;
        debug!(conversation_id = %conversation_id, modified, "Marked agent messages as read");
        Ok(modified)
    }

    /// 将旧客户的消息迁移到新客户，返回新客户的全部消息
    #[instrument(skip(self))]
    pub async fn change_customer(
        &self,
        new_customer_id: &str,
        customer_ids: &[String],
    ) -> Result<Vec<Message>> {
        let modified = self
            .messages
            .set_customer(&MessageFilter::by_customers(customer_ids.iter().cloned()), new_customer_id)
            .await?;
        debug!(new_customer_id = %new_customer_id, modified, "Reassigned customer messages");

        Ok(self
            .messages
            .find(
                &MessageFilter::by_customers([new_customer_id]),
                SortOrder::Ascending,
                None,
            )
            .await?)
    }

    /// 删除客户的全部消息
    #[instrument(skip(self))]
    pub async fn remove_customer_messages(&self, customer_id: &str) -> Result<u64> {
        self.remove_messages(&MessageFilter::by_customers([customer_id]))
            .await
    }

    pub async fn get_message(&self, message_id: &str) -> Result<Option<Message>> {
        Ok(self.messages.find_by_id(message_id).await?)
    }

    /// 会话消息列表，按时间升序
    #[instrument(skip(self))]
    pub async fn conversation_messages(
        &self,
        conversation_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>> {
        self.require_conversation(conversation_id).await?;

        Ok(self
            .messages
            .find(
                &MessageFilter::by_conversation(conversation_id),
                SortOrder::Ascending,
                limit,
            )
            .await?)
    }

    async fn require_conversation(&self, conversation_id: &str) -> Result<Conversation> {
        self.conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or_else(|| MessageStoreError::ConversationNotFound(conversation_id.to_string()))
    }

    async fn persist(&self, draft: NewMessage) -> Result<Message> {
        let content = draft.content.unwrap_or_default();
        let attachments = draft.attachments.unwrap_or_default();
        ensure_content(&content, &attachments)?;

        let message = Message {
            id: Uuid::new_v4().to_string(),
            content,
            attachments,
            mentioned_user_ids: draft.mentioned_user_ids,
            conversation_id: draft.conversation_id,
            internal: draft.internal.unwrap_or(false),
            customer_id: draft.customer_id,
            user_id: draft.user_id,
            created_at: Utc::now(),
            is_customer_read: false,
            from_bot: draft.from_bot,
            engage_data: draft.engage_data,
            form_widget_data: draft.form_widget_data,
            messenger_app_data: draft.messenger_app_data,
            facebook_data: draft.facebook_data,
            twitter_data: draft.twitter_data,
        };

        self.messages.insert(&message).await?;
        self.sync_message_count(&message.conversation_id).await?;

        let participants = message.participant_ids();
        if !participants.is_empty() {
            self.conversations
                .add_participants(&message.conversation_id, &participants)
                .await?;
        }

        debug!(
            message_id = %message.id,
            conversation_id = %message.conversation_id,
            internal = message.internal,
            "Created conversation message"
        );

        Ok(message)
    }

    /// 按真实条数回写会话的 message_count
    async fn sync_message_count(&self, conversation_id: &str) -> Result<()> {
        let count = self
            .messages
            .count(&MessageFilter::by_conversation(conversation_id))
            .await?;
        let count = i64::try_from(count).unwrap_or(i64::MAX);

        self.conversations
            .update_by_id(conversation_id, &ConversationUpdate::message_count(count))
            .await?;
        Ok(())
    }
}

/// 客户可见（非内部备注）且未读的客服消息
fn unread_agent_filter(conversation_id: &str) -> MessageFilter {
    MessageFilter::by_conversation(conversation_id)
        .sent_by_agent()
        .with_internal(false)
        .unread_by_customer()
}

fn ensure_content(content: &str, attachments: &[Attachment]) -> Result<()> {
    if attachments.is_empty() && is_blank_content(content) {
        return Err(MessageStoreError::ContentRequired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::memory::{
        InMemoryConversationRepository, InMemoryMessageRepository,
    };

    fn service() -> (
        MessageDomainService,
        Arc<InMemoryMessageRepository>,
        Arc<InMemoryConversationRepository>,
    ) {
        let messages = Arc::new(InMemoryMessageRepository::default());
        let conversations = Arc::new(InMemoryConversationRepository::default());
        let service = MessageDomainService::new(messages.clone(), conversations.clone());
        (service, messages, conversations)
    }

    fn attachment() -> Attachment {
        Attachment {
            url: "https://cdn.example.com/a.png".to_string(),
            name: "a.png".to_string(),
            size: Some(120),
            mime_type: "image/png".to_string(),
        }
    }

    #[test]
    fn content_or_attachment_is_required() {
        assert!(matches!(
            ensure_content("", &[]),
            Err(MessageStoreError::ContentRequired)
        ));
        assert!(ensure_content("", &[attachment()]).is_ok());
        assert!(ensure_content("hello", &[]).is_ok());
    }

    #[tokio::test]
    async fn create_message_defaults_internal_to_false() {
        let (service, _, conversations) = service();
        conversations.insert(Conversation::new("c1")).await;

        let message = service
            .create_message(NewMessage::new("c1", "hello").from_customer("cus1"))
            .await
            .unwrap();

        assert!(!message.internal);
        assert!(!message.is_customer_read);
        assert_eq!(message.customer_id.as_deref(), Some("cus1"));
        assert_eq!(conversations.get("c1").await.unwrap().message_count, 1);
    }

    #[tokio::test]
    async fn create_message_requires_conversation() {
        let (service, messages, _) = service();

        let err = service
            .create_message(NewMessage::new("missing", "hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, MessageStoreError::ConversationNotFound(id) if id == "missing"));
        assert_eq!(messages.len().await, 0);
    }

    /// 写入总是失败的消息仓储
    struct RejectingMessageRepository;

    #[async_trait::async_trait]
    impl MessageRepository for RejectingMessageRepository {
        async fn insert(&self, _message: &Message) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("insert rejected"))
        }

        async fn find_by_id(&self, _message_id: &str) -> anyhow::Result<Option<Message>> {
            Ok(None)
        }

        async fn find(
            &self,
            _filter: &MessageFilter,
            _sort: SortOrder,
            _limit: Option<i64>,
        ) -> anyhow::Result<Vec<Message>> {
            Ok(Vec::new())
        }

        async fn count(&self, _filter: &MessageFilter) -> anyhow::Result<u64> {
            Ok(0)
        }

        async fn mark_customer_read(&self, _filter: &MessageFilter) -> anyhow::Result<u64> {
            Ok(0)
        }

        async fn set_customer(
            &self,
            _filter: &MessageFilter,
            _customer_id: &str,
        ) -> anyhow::Result<u64> {
            Ok(0)
        }

        async fn delete(&self, _filter: &MessageFilter) -> anyhow::Result<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn failed_insert_leaves_conversation_untouched() {
        let conversations = Arc::new(InMemoryConversationRepository::default());
        conversations.insert(Conversation::new("c1")).await;
        let service =
            MessageDomainService::new(Arc::new(RejectingMessageRepository), conversations.clone());

        let err = service
            .add_message(NewMessage::new("c1", "hello"), Some("agent1"))
            .await
            .unwrap_err();
        assert!(matches!(err, MessageStoreError::Repository(_)));

        let conversation = conversations.get("c1").await.unwrap();
        assert_eq!(conversation, Conversation::new("c1"));
    }

    #[tokio::test]
    async fn internal_notes_are_not_customer_unread() {
        let (service, _, conversations) = service();
        conversations.insert(Conversation::new("c1")).await;

        service
            .add_message(NewMessage::new("c1", "secret note").internal(true), Some("agent1"))
            .await
            .unwrap();
        let reply = service
            .add_message(NewMessage::new("c1", "visible reply"), Some("agent1"))
            .await
            .unwrap();

        let unread = service.unread_agent_messages("c1").await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, reply.id);
        assert!(unread.iter().all(|m| !m.internal));

        assert_eq!(service.mark_agent_messages_read("c1").await.unwrap(), 1);

        let notes = service.conversation_messages("c1", None).await.unwrap();
        let note = notes.iter().find(|m| m.internal).unwrap();
        assert!(!note.is_customer_read);
    }

    #[tokio::test]
    async fn internal_note_does_not_set_first_responder() {
        let (service, _, conversations) = service();
        conversations.insert(Conversation::new("c1")).await;

        service
            .add_message(NewMessage::new("c1", "note").internal(true), Some("agent1"))
            .await
            .unwrap();

        let conversation = conversations.get("c1").await.unwrap();
        assert!(conversation.first_responded_user_id.is_none());
        assert!(conversation.participated_user_ids.contains("agent1"));
    }
}
