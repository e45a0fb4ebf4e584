//! 统一异常处理模块

use thiserror::Error;

/// 消息存储错误类型
#[derive(Debug, Error)]
pub enum MessageStoreError {
    /// 引用的会话不存在
    #[error("Conversation not found with id {0}")]
    ConversationNotFound(String),

    /// 内容和附件都为空
    #[error("Content is required")]
    ContentRequired,

    /// 仓储（数据库驱动）错误，原样透传
    #[error(transparent)]
    Repository(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MessageStoreError>;
