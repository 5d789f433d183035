use std::sync::Arc;

use mongodb::{
    bson::{doc, Document},
    options::IndexOptions,
    Client, Database, IndexModel,
};
use tokio::sync::OnceCell;

use crate::{config::Settings, error::StoreError};

/// Process-wide storage handle. The client is created on first use and
/// reused by every clone afterwards.
#[derive(Clone)]
pub struct DbHandle {
    uri: String,
    db_name: String,
    cell: Arc<OnceCell<Database>>,
}

impl DbHandle {
    pub fn new(uri: impl Into<String>, db_name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            db_name: db_name.into(),
            cell: Arc::new(OnceCell::new()),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.mongodb_uri.clone(), settings.mongodb_db.clone())
    }

    pub fn is_connected(&self) -> bool {
        self.cell.initialized()
    }

    /// Concurrent first callers share one initialization; a failed attempt
    /// leaves the cell empty so the next call tries again.
    pub async fn database(&self) -> Result<Database, StoreError> {
        let uri = self.uri.clone();
        let db_name = self.db_name.clone();

        let db = self
            .cell
            .get_or_try_init(|| async move {
                if uri.trim().is_empty() {
                    return Err(StoreError::StorageUnavailable(
                        "MONGODB_URI must be set".to_string(),
                    ));
                }

                let client = Client::with_uri_str(&uri).await?;
                tracing::info!(db = %db_name, "MongoDB connected");
                Ok(client.database(&db_name))
            })
            .await?;

        Ok(db.clone())
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        let db = self.database().await?;
        db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}

pub async fn ensure_indexes(db: &Database) -> Result<(), StoreError> {
    // watchlists: one entry per (userId, symbol)
    {
        let col = db.collection::<Document>("watchlists");
        let model = IndexModel::builder()
            .keys(doc! { "userId": 1, "symbol": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        col.create_index(model, None).await?;
    }

    // alerts: listed per user, newest first
    {
        let col = db.collection::<Document>("alerts");
        let model = IndexModel::builder()
            .keys(doc! { "userId": 1, "createdAt": -1 })
            .build();

        col.create_index(model, None).await?;
    }

    Ok(())
}
