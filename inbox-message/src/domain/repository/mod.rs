//! 仓储接口定义（Port）

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::model::{Conversation, ConversationUpdate, Message, MessageFilter, SortOrder};

/// 消息仓储接口
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// 写入一条新消息
    async fn insert(&self, message: &Message) -> Result<()>;

    async fn find_by_id(&self, message_id: &str) -> Result<Option<Message>>;

    /// 按创建时间排序查询，`limit` 为 None 时不限制条数
    async fn find(
        &self,
        filter: &MessageFilter,
        sort: SortOrder,
        limit: Option<i64>,
    ) -> Result<Vec<Message>>;

    async fn count(&self, filter: &MessageFilter) -> Result<u64>;

    /// 将匹配消息标记为客户已读，返回修改条数
    async fn mark_customer_read(&self, filter: &MessageFilter) -> Result<u64>;

    /// 将匹配消息的 customer_id 改为新值，返回修改条数
    async fn set_customer(&self, filter: &MessageFilter, customer_id: &str) -> Result<u64>;

    /// 批量删除，返回删除条数
    async fn delete(&self, filter: &MessageFilter) -> Result<u64>;
}

/// 会话仓储接口 - 会话由外部服务维护，这里只读取并同步冗余字段
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn find_by_id(&self, conversation_id: &str) -> Result<Option<Conversation>>;

    /// 按 ID 更新会话字段
    async fn update_by_id(&self, conversation_id: &str, update: &ConversationUpdate) -> Result<()>;

    /// 追加参与者（去重）
    async fn add_participants(&self, conversation_id: &str, user_ids: &[String]) -> Result<()>;
}
