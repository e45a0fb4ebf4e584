//! 会话仓储实现
//!
//! 会话集合由会话服务维护，这里只读取并更新消息相关的冗余字段
//! （message_count、participated_user_ids、content 等）

use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;
use mongodb::bson::{self, Document, doc};
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::mongo_message_repo::{from_bson_datetime, to_bson_datetime};
use crate::domain::model::{Conversation, ConversationUpdate};
use crate::domain::repository::ConversationRepository;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConversationDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    message_count: i64,
    #[serde(default)]
    participated_user_ids: BTreeSet<String>,
    #[serde(default)]
    first_responded_user_id: Option<String>,
    #[serde(default)]
    first_responded_date: Option<bson::DateTime>,
    #[serde(default)]
    updated_at: Option<bson::DateTime>,
}

impl From<ConversationDocument> for Conversation {
    fn from(document: ConversationDocument) -> Self {
        Self {
            id: document.id,
            content: document.content,
            message_count: document.message_count,
            participated_user_ids: document.participated_user_ids,
            first_responded_user_id: document.first_responded_user_id,
            first_responded_date: document.first_responded_date.map(from_bson_datetime),
            updated_at: document.updated_at.map(from_bson_datetime),
        }
    }
}

fn set_document(update: &ConversationUpdate) -> Document {
    let mut set = Document::new();
    if let Some(content) = &update.content {
        set.insert("content", content.clone());
    }
    if let Some(count) = update.message_count {
        set.insert("message_count", count);
    }
    if let Some(user_id) = &update.first_responded_user_id {
        set.insert("first_responded_user_id", user_id.clone());
    }
    if let Some(date) = update.first_responded_date {
        set.insert("first_responded_date", to_bson_datetime(date));
    }
    if let Some(updated_at) = update.updated_at {
        set.insert("updated_at", to_bson_datetime(updated_at));
    }
    set
}

/// MongoDB 会话仓储实现
pub struct MongoConversationRepository {
    collection: Collection<ConversationDocument>,
}

impl MongoConversationRepository {
    pub fn new(database: &Database, collection_name: &str) -> Self {
        Self {
            collection: database.collection::<ConversationDocument>(collection_name),
        }
    }
}

#[async_trait]
impl ConversationRepository for MongoConversationRepository {
    async fn find_by_id(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        let document = self
            .collection
            .find_one(doc! {"_id": conversation_id}, None)
            .await?;
        Ok(document.map(Conversation::from))
    }

    #[instrument(skip(self, update), fields(conversation_id = %conversation_id))]
    async fn update_by_id(&self, conversation_id: &str, update: &ConversationUpdate) -> Result<()> {
        let set = set_document(update);
        if set.is_empty() {
            return Ok(());
        }

        let result = self
            .collection
            .update_one(doc! {"_id": conversation_id}, doc! {"$set": set}, None)
            .await?;

        debug!(
            conversation_id = %conversation_id,
            matched = result.matched_count,
            "Updated conversation"
        );
        Ok(())
    }

    #[instrument(skip(self), fields(conversation_id = %conversation_id))]
    async fn add_participants(&self, conversation_id: &str, user_ids: &[String]) -> Result<()> {
        if user_ids.is_empty() {
            return Ok(());
        }

        self.collection
            .update_one(
                doc! {"_id": conversation_id},
                doc! {"$addToSet": {"participated_user_ids": {"$each": user_ids.to_vec()}}},
                None,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn set_document_skips_absent_fields() {
        let update = ConversationUpdate::message_count(4);
        assert_eq!(set_document(&update), doc! {"message_count": 4_i64});
        assert!(set_document(&ConversationUpdate::default()).is_empty());
    }

    #[test]
    fn set_document_writes_dates_as_bson() {
        let now = Utc::now();
        let update = ConversationUpdate {
            content: Some("hello".to_string()),
            updated_at: Some(now),
            ..Default::default()
        };

        let set = set_document(&update);
        assert_eq!(set.get_str("content").unwrap(), "hello");
        assert_eq!(
            set.get_datetime("updated_at").unwrap().timestamp_millis(),
            now.timestamp_millis()
        );
    }
}
