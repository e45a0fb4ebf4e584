/// 最近客户消息查询
#[derive(Debug, Clone)]
pub struct LatestCustomerMessageQuery {
    pub conversation_id: String,
}

/// 客户未读的客服消息查询
#[derive(Debug, Clone)]
pub struct UnreadAgentMessagesQuery {
    pub conversation_id: String,
}

/// 会话消息列表查询
#[derive(Debug, Clone)]
pub struct ConversationMessagesQuery {
    pub conversation_id: String,
    pub limit: Option<i64>,
}

/// 单条消息查询
#[derive(Debug, Clone)]
pub struct GetMessageQuery {
    pub message_id: String,
}
