use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::commands::{
    AddMessageCommand, ChangeCustomerCommand, MarkAgentMessagesReadCommand,
    RemoveCustomerMessagesCommand, RemoveMessagesCommand,
};
use crate::application::queries::{
    ConversationMessagesQuery, GetMessageQuery, LatestCustomerMessageQuery,
    UnreadAgentMessagesQuery,
};
use crate::domain::model::Message;
use crate::domain::service::MessageDomainService;
use crate::error::Result;

/// 消息命令处理器
pub struct MessageCommandHandler {
    domain_service: Arc<MessageDomainService>,
}

impl MessageCommandHandler {
    pub fn new(domain_service: Arc<MessageDomainService>) -> Self {
        Self { domain_service }
    }

    /// 处理追加消息命令
    #[instrument(skip(self, command), fields(conversation_id = %command.message.conversation_id))]
    pub async fn handle_add_message(&self, command: AddMessageCommand) -> Result<Message> {
        let message = self
            .domain_service
            .add_message(command.message, command.user_id.as_deref())
            .await?;

        info!(
            message_id = %message.id,
            conversation_id = %message.conversation_id,
            "Message added"
        );
        Ok(message)
    }

    /// 处理批量删除消息命令
    #[instrument(skip(self))]
    pub async fn handle_remove_messages(&self, command: RemoveMessagesCommand) -> Result<u64> {
        let deleted = self.domain_service.remove_messages(&command.filter).await?;
        info!(deleted, "Messages removed");
        Ok(deleted)
    }

    /// 处理标记已读命令
    #[instrument(skip(self), fields(conversation_id = %command.conversation_id))]
    pub async fn handle_mark_agent_messages_read(
        &self,
        command: MarkAgentMessagesReadCommand,
    ) -> Result<u64> {
        self.domain_service
            .mark_agent_messages_read(&command.conversation_id)
            .await
    }

    /// 处理合并客户命令
    #[instrument(skip(self), fields(new_customer_id = %command.new_customer_id))]
    pub async fn handle_change_customer(
        &self,
        command: ChangeCustomerCommand,
    ) -> Result<Vec<Message>> {
        debug!(
            count = command.customer_ids.len(),
            "Handling change customer command"
        );

        self.domain_service
            .change_customer(&command.new_customer_id, &command.customer_ids)
            .await
    }

    /// 处理删除客户消息命令
    #[instrument(skip(self), fields(customer_id = %command.customer_id))]
    pub async fn handle_remove_customer_messages(
        &self,
        command: RemoveCustomerMessagesCommand,
    ) -> Result<u64> {
        let deleted = self
            .domain_service
            .remove_customer_messages(&command.customer_id)
            .await?;
        info!(customer_id = %command.customer_id, deleted, "Customer messages removed");
        Ok(deleted)
    }
}

/// 消息查询处理器
pub struct MessageQueryHandler {
    domain_service: Arc<MessageDomainService>,
}

impl MessageQueryHandler {
    pub fn new(domain_service: Arc<MessageDomainService>) -> Self {
        Self { domain_service }
    }

    pub async fn handle_latest_customer_message(
        &self,
        query: LatestCustomerMessageQuery,
    ) -> Result<Option<Message>> {
        self.domain_service
            .latest_customer_message(&query.conversation_id)
            .await
    }

    pub async fn handle_unread_agent_messages(
        &self,
        query: UnreadAgentMessagesQuery,
    ) -> Result<Vec<Message>> {
        self.domain_service
            .unread_agent_messages(&query.conversation_id)
            .await
    }

    pub async fn handle_conversation_messages(
        &self,
        query: ConversationMessagesQuery,
    ) -> Result<Vec<Message>> {
        self.domain_service
            .conversation_messages(&query.conversation_id, query.limit)
            .await
    }

    pub async fn handle_get_message(&self, query: GetMessageQuery) -> Result<Option<Message>> {
        self.domain_service.get_message(&query.message_id).await
    }
}
