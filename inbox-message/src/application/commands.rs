use crate::domain::model::{MessageFilter, NewMessage};

/// 追加消息命令
#[derive(Debug, Clone)]
pub struct AddMessageCommand {
    pub message: NewMessage,
    /// 发送消息的客服
    pub user_id: Option<String>,
}

/// 批量删除消息命令
#[derive(Debug, Clone)]
pub struct RemoveMessagesCommand {
    pub filter: MessageFilter,
}

/// 标记客服消息已读命令
#[derive(Debug, Clone)]
pub struct MarkAgentMessagesReadCommand {
    pub conversation_id: String,
}

/// 合并客户命令
#[derive(Debug, Clone)]
pub struct ChangeCustomerCommand {
    pub new_customer_id: String,
    pub customer_ids: Vec<String>,
}

/// 删除客户消息命令
#[derive(Debug, Clone)]
pub struct RemoveCustomerMessagesCommand {
    pub customer_id: String,
}
