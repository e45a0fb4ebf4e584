//! 会话消息存储
//!
//! 持久化客户/客服/内部备注消息，维护客户已读状态，
//! 并把消息数、参与者等冗余字段同步回所属会话。

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;

pub use domain::model::{
    Attachment, Conversation, ConversationUpdate, Message, MessageFilter, NewMessage, SortOrder,
};
pub use domain::service::MessageDomainService;
pub use error::{MessageStoreError, Result};
