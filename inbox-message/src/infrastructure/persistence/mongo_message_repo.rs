use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::{self, Document, doc};
use mongodb::options::{CreateIndexOptions, FindOptions, IndexOptions};
use mongodb::{Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::model::{
    Attachment, EngageData, FacebookData, Message, MessageFilter, SortOrder, TwitterData,
};
use crate::domain::repository::MessageRepository;

/// 消息集合中的文档结构
///
/// 可选字段为空时不写入，`$exists` 查询依赖这一点
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MessageDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    attachments: Vec<Attachment>,
    #[serde(default)]
    mentioned_user_ids: BTreeSet<String>,
    conversation_id: String,
    #[serde(default)]
    internal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    created_at: bson::DateTime,
    #[serde(default)]
    is_customer_read: bool,
    #[serde(default)]
    from_bot: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    engage_data: Option<EngageData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    form_widget_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    messenger_app_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    facebook_data: Option<FacebookData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    twitter_data: Option<TwitterData>,
}

impl From<&Message> for MessageDocument {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            content: message.content.clone(),
            attachments: message.attachments.clone(),
            mentioned_user_ids: message.mentioned_user_ids.clone(),
            conversation_id: message.conversation_id.clone(),
            internal: message.internal,
            customer_id: message.customer_id.clone(),
            user_id: message.user_id.clone(),
            created_at: to_bson_datetime(message.created_at),
            is_customer_read: message.is_customer_read,
            from_bot: message.from_bot,
            engage_data: message.engage_data.clone(),
            form_widget_data: message.form_widget_data.clone(),
            messenger_app_data: message.messenger_app_data.clone(),
            facebook_data: message.facebook_data.clone(),
            twitter_data: message.twitter_data.clone(),
        }
    }
}

impl From<MessageDocument> for Message {
    fn from(document: MessageDocument) -> Self {
        Self {
            id: document.id,
            content: document.content,
            attachments: document.attachments,
            mentioned_user_ids: document.mentioned_user_ids,
            conversation_id: document.conversation_id,
            internal: document.internal,
            customer_id: document.customer_id,
            user_id: document.user_id,
            created_at: from_bson_datetime(document.created_at),
            is_customer_read: document.is_customer_read,
            from_bot: document.from_bot,
            engage_data: document.engage_data,
            form_widget_data: document.form_widget_data,
            messenger_app_data: document.messenger_app_data,
            facebook_data: document.facebook_data,
            twitter_data: document.twitter_data,
        }
    }
}

pub(crate) fn to_bson_datetime(value: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(value.timestamp_millis())
}

pub(crate) fn from_bson_datetime(value: bson::DateTime) -> DateTime<Utc> {
    inbox_core::utils::millis_to_datetime(value.timestamp_millis()).unwrap_or_default()
}

/// 将查询条件转换为 Mongo filter
fn filter_document(filter: &MessageFilter) -> Document {
    let mut document = Document::new();

    if let Some(ids) = &filter.ids {
        document.insert("_id", doc! {"$in": ids.clone()});
    }
    if let Some(conversation_id) = &filter.conversation_id {
        document.insert("conversation_id", conversation_id.clone());
    }

    let mut customer = Document::new();
    if let Some(customer_ids) = &filter.customer_ids {
        customer.insert("$in", customer_ids.clone());
    }
    if let Some(has_customer) = filter.has_customer {
        customer.insert("$exists", has_customer);
    }
    if !customer.is_empty() {
        document.insert("customer_id", customer);
    }

    if let Some(has_user) = filter.has_user {
        document.insert("user_id", doc! {"$exists": has_user});
    }

    if let Some(internal) = filter.internal {
        document.insert("internal", internal);
    }
    match filter.customer_read {
        Some(true) => {
            document.insert("is_customer_read", true);
        }
        Some(false) => {
            document.insert("is_customer_read", doc! {"$ne": true});
        }
        None => {}
    }

    document
}

/// MongoDB 消息仓储实现
pub struct MongoMessageRepository {
    collection: Collection<MessageDocument>,
}

impl MongoMessageRepository {
    pub async fn new(database: &Database, collection_name: &str) -> Result<Self> {
        let collection = database.collection::<MessageDocument>(collection_name);

        ensure_indexes(&collection).await?;

        Ok(Self { collection })
    }
}

async fn ensure_indexes(collection: &Collection<MessageDocument>) -> Result<()> {
    let conversation_index = IndexModel::builder()
        .keys(doc! {"conversation_id": 1, "created_at": 1})
        .options(
            IndexOptions::builder()
                .name(Some("idx_conversation_created".to_string()))
                .build(),
        )
        .build();

    let single_field_indexes = ["customer_id", "user_id", "internal", "created_at"]
        .into_iter()
        .map(|field| {
            let mut keys = Document::new();
            keys.insert(field, 1);
            IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("idx_{}", field)))
                        .build(),
                )
                .build()
        });

    let indexes: Vec<IndexModel> = std::iter::once(conversation_index)
        .chain(single_field_indexes)
        .collect();

    collection
        .create_indexes(indexes, None::<CreateIndexOptions>)
        .await?;

    Ok(())
}

#[async_trait]
impl MessageRepository for MongoMessageRepository {
    #[instrument(skip(self, message), fields(message_id = %message.id, conversation_id = %message.conversation_id))]
    async fn insert(&self, message: &Message) -> Result<()> {
        self.collection
            .insert_one(MessageDocument::from(message), None)
            .await?;
        Ok(())
    }

    async fn find_by_id(&self, message_id: &str) -> Result<Option<Message>> {
        let document = self
            .collection
            .find_one(doc! {"_id": message_id}, None)
            .await?;
        Ok(document.map(Message::from))
    }

    #[instrument(skip(self))]
    async fn find(
        &self,
        filter: &MessageFilter,
        sort: SortOrder,
        limit: Option<i64>,
    ) -> Result<Vec<Message>> {
        let direction = match sort {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        };
        let options = FindOptions::builder()
            .sort(doc! {"created_at": direction})
            .limit(limit.filter(|l| *l > 0))
            .build();

        let cursor = self
            .collection
            .find(filter_document(filter), options)
            .await?;
        let documents: Vec<MessageDocument> = cursor.try_collect().await?;

        Ok(documents.into_iter().map(Message::from).collect())
    }

    async fn count(&self, filter: &MessageFilter) -> Result<u64> {
        let count = self
            .collection
            .count_documents(filter_document(filter), None)
            .await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn mark_customer_read(&self, filter: &MessageFilter) -> Result<u64> {
        let result = self
            .collection
            .update_many(
                filter_document(filter),
                doc! {"$set": {"is_customer_read": true}},
                None,
            )
            .await?;

        debug!(
            matched = result.matched_count,
            modified = result.modified_count,
            "Updated is_customer_read"
        );
        Ok(result.modified_count)
    }

    #[instrument(skip(self))]
    async fn set_customer(&self, filter: &MessageFilter, customer_id: &str) -> Result<u64> {
        let result = self
            .collection
            .update_many(
                filter_document(filter),
                doc! {"$set": {"customer_id": customer_id}},
                None,
            )
            .await?;
        Ok(result.modified_count)
    }

    #[instrument(skip(self))]
    async fn delete(&self, filter: &MessageFilter) -> Result<u64> {
        let result = self
            .collection
            .delete_many(filter_document(filter), None)
            .await?;
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unread_agent_filter_document() {
        let filter = MessageFilter::by_conversation("c1")
            .sent_by_agent()
            .with_internal(false)
            .unread_by_customer();

        assert_eq!(
            filter_document(&filter),
            doc! {
                "conversation_id": "c1",
                "user_id": {"$exists": true},
                "internal": false,
                "is_customer_read": {"$ne": true},
            }
        );
    }

    #[test]
    fn customer_conditions_share_one_field() {
        let mut filter = MessageFilter::by_customers(["a", "b"]);
        filter.has_customer = Some(true);

        assert_eq!(
            filter_document(&filter),
            doc! {"customer_id": {"$in": ["a", "b"], "$exists": true}}
        );
    }

    #[test]
    fn empty_filter_is_empty_document() {
        assert!(filter_document(&MessageFilter::default()).is_empty());
    }

    #[test]
    fn absent_author_fields_are_not_serialized() {
        let message = Message {
            id: "m1".to_string(),
            content: "hi".to_string(),
            attachments: Vec::new(),
            mentioned_user_ids: BTreeSet::new(),
            conversation_id: "c1".to_string(),
            internal: false,
            customer_id: Some("cus1".to_string()),
            user_id: None,
            created_at: Utc::now(),
            is_customer_read: false,
            from_bot: false,
            engage_data: None,
            form_widget_data: None,
            messenger_app_data: None,
            facebook_data: None,
            twitter_data: None,
        };

        let document = bson::to_document(&MessageDocument::from(&message)).unwrap();
        assert!(document.contains_key("customer_id"));
        assert!(!document.contains_key("user_id"));
        assert!(!document.contains_key("facebook_data"));
        assert_eq!(document.get_str("_id").unwrap(), "m1");
    }
}
