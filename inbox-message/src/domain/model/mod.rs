//! 领域模型定义

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 消息附件（对存储层透明）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(rename = "type", default)]
    pub mime_type: String,
}

/// 营销活动（engage）消息元数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngageData {
    pub message_id: String,
    #[serde(default)]
    pub brand_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub from_user_id: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_as: Option<String>,
}

/// Facebook 评论/帖子/私信元数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacebookData {
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default)]
    pub is_post: bool,
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
}

/// Twitter 推文/私信元数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TwitterData {
    pub id_str: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to_status_id_str: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to_user_id_str: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to_screen_name: Option<String>,
    #[serde(default)]
    pub is_direct_message: bool,
    #[serde(default)]
    pub is_quote_status: bool,
    #[serde(default)]
    pub favorited: bool,
    #[serde(default)]
    pub retweeted: bool,
    #[serde(default)]
    pub quote_count: i64,
    #[serde(default)]
    pub reply_count: i64,
    #[serde(default)]
    pub retweet_count: i64,
    #[serde(default)]
    pub favorite_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_entities: Option<Value>,
}

/// 会话消息
///
/// `user_id` 表示客服（agent）发送，`customer_id` 表示客户发送；
/// `internal` 为内部备注，客户不可见。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub mentioned_user_ids: BTreeSet<String>,
    pub conversation_id: String,
    pub internal: bool,
    pub customer_id: Option<String>,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_customer_read: bool,
    pub from_bot: bool,
    pub engage_data: Option<EngageData>,
    pub form_widget_data: Option<Value>,
    pub messenger_app_data: Option<Value>,
    pub facebook_data: Option<FacebookData>,
    pub twitter_data: Option<TwitterData>,
}

impl Message {
    /// 客服发送的消息
    pub fn is_agent_message(&self) -> bool {
        self.user_id.is_some()
    }

    /// 客户发送的消息
    pub fn is_customer_message(&self) -> bool {
        self.customer_id.is_some()
    }

    /// 需要加入会话参与者列表的用户：发送者（机器人除外）和被提及的用户
    pub fn participant_ids(&self) -> Vec<String> {
        let mut participants: BTreeSet<String> = self.mentioned_user_ids.clone();
        if let Some(user_id) = &self.user_id {
            if !self.from_bot {
                participants.insert(user_id.clone());
            }
        }
        participants.into_iter().collect()
    }
}

/// 待创建的消息
///
/// `content` / `attachments` 为空时按空值处理，`internal` 缺省为 false。
#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    pub conversation_id: String,
    pub content: Option<String>,
    pub attachments: Option<Vec<Attachment>>,
    pub mentioned_user_ids: BTreeSet<String>,
    pub internal: Option<bool>,
    pub customer_id: Option<String>,
    pub user_id: Option<String>,
    pub from_bot: bool,
    pub engage_data: Option<EngageData>,
    pub form_widget_data: Option<Value>,
    pub messenger_app_data: Option<Value>,
    pub facebook_data: Option<FacebookData>,
    pub twitter_data: Option<TwitterData>,
}

impl NewMessage {
    pub fn new(conversation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn from_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn from_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn internal(mut self, internal: bool) -> Self {
        self.internal = Some(internal);
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = Some(attachments);
        self
    }

    pub fn mentioning<I, S>(mut self, user_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mentioned_user_ids
            .extend(user_ids.into_iter().map(Into::into));
        self
    }
}

/// 会话（外部协作方）中消息存储关心的字段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub content: Option<String>,
    pub message_count: i64,
    pub participated_user_ids: BTreeSet<String>,
    pub first_responded_user_id: Option<String>,
    pub first_responded_date: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// 会话更新（只写入 Some 字段）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationUpdate {
    pub content: Option<String>,
    pub message_count: Option<i64>,
    pub first_responded_user_id: Option<String>,
    pub first_responded_date: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ConversationUpdate {
    pub fn message_count(count: i64) -> Self {
        Self {
            message_count: Some(count),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.message_count.is_none()
            && self.first_responded_user_id.is_none()
            && self.first_responded_date.is_none()
            && self.updated_at.is_none()
    }

    /// 将更新应用到会话快照
    pub fn apply_to(&self, conversation: &mut Conversation) {
        if let Some(content) = &self.content {
            conversation.content = Some(content.clone());
        }
        if let Some(count) = self.message_count {
            conversation.message_count = count;
        }
        if let Some(user_id) = &self.first_responded_user_id {
            conversation.first_responded_user_id = Some(user_id.clone());
        }
        if let Some(date) = self.first_responded_date {
            conversation.first_responded_date = Some(date);
        }
        if let Some(updated_at) = self.updated_at {
            conversation.updated_at = Some(updated_at);
        }
    }
}

/// 按创建时间排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// 消息查询条件，所有条件取交集；None 表示不限制
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageFilter {
    pub ids: Option<Vec<String>>,
    pub conversation_id: Option<String>,
    pub customer_ids: Option<Vec<String>>,
    /// customer_id 是否存在
    pub has_customer: Option<bool>,
    /// user_id 是否存在
    pub has_user: Option<bool>,
    pub internal: Option<bool>,
    /// Some(true) 只匹配已读；Some(false) 匹配未读或未设置
    pub customer_read: Option<bool>,
}

impl MessageFilter {
    pub fn by_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: Some(ids.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn by_conversation(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: Some(conversation_id.into()),
            ..Default::default()
        }
    }

    pub fn by_customers<I, S>(customer_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            customer_ids: Some(customer_ids.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn sent_by_customer(mut self) -> Self {
        self.has_customer = Some(true);
        self
    }

    pub fn sent_by_agent(mut self) -> Self {
        self.has_user = Some(true);
        self
    }

    pub fn unread_by_customer(mut self) -> Self {
        self.customer_read = Some(false);
        self
    }

    pub fn with_internal(mut self, internal: bool) -> Self {
        self.internal = Some(internal);
        self
    }

    /// 内存匹配，语义与 Mongo 查询条件保持一致
    pub fn matches(&self, message: &Message) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.iter().any(|id| *id == message.id) {
                return false;
            }
        }
        if let Some(conversation_id) = &self.conversation_id {
            if message.conversation_id != *conversation_id {
                return false;
            }
        }
        if let Some(customer_ids) = &self.customer_ids {
            match &message.customer_id {
                Some(customer_id) if customer_ids.contains(customer_id) => {}
                _ => return false,
            }
        }
        if let Some(has_customer) = self.has_customer {
            if message.customer_id.is_some() != has_customer {
                return false;
            }
        }
        if let Some(has_user) = self.has_user {
            if message.user_id.is_some() != has_user {
                return false;
            }
        }
        if let Some(internal) = self.internal {
            if message.internal != internal {
                return false;
            }
        }
        if let Some(read) = self.customer_read {
            if message.is_customer_read != read {
                return false;
            }
        }
        true
    }
}
