use anyhow::Result;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tracing::info;

use crate::config::MessageStoreConfig;

/// 建立 MongoDB 连接，未配置连接地址时返回 None
pub async fn connect(config: &MessageStoreConfig) -> Result<Option<Database>> {
    let uri = match &config.mongo_url {
        Some(url) => url,
        None => return Ok(None),
    };

    let mut options = ClientOptions::parse(uri).await?;
    if options.app_name.is_none() {
        options.app_name = Some("inbox-message".to_string());
    }
    let client = Client::with_options(options)?;
    let database = client.database(&config.mongo_database);

    info!(database = %config.mongo_database, "MongoDB client created");

    Ok(Some(database))
}
