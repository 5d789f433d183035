use async_trait::async_trait;
use futures_util::StreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, DateTime, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument, UpdateOptions},
    Collection,
};

use crate::{
    error::StoreError,
    models::{AlertFields, AlertRecord, AlertType, WatchlistEntry},
};

use super::{
    backend::{AlertBackend, WatchlistBackend},
    db::DbHandle,
};

const WATCHLISTS: &str = "watchlists";
const ALERTS: &str = "alerts";
// user collection owned by the identity provider
const USERS: &str = "user";

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoBackend {
    db: DbHandle,
}

impl MongoBackend {
    pub fn new(db: DbHandle) -> Self {
        Self { db }
    }

    async fn collection(&self, name: &str) -> Result<Collection<Document>, StoreError> {
        Ok(self.db.database().await?.collection::<Document>(name))
    }
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(we)) => we.code == DUPLICATE_KEY,
        ErrorKind::Command(ce) => ce.code == DUPLICATE_KEY,
        _ => e.to_string().contains("E11000"),
    }
}

fn malformed(collection: &str, field: &str) -> StoreError {
    StoreError::StorageUnavailable(format!("malformed {collection} document: missing {field}"))
}

fn get_string(d: &Document, collection: &str, field: &str) -> Result<String, StoreError> {
    d.get_str(field)
        .map(|s| s.to_string())
        .map_err(|_| malformed(collection, field))
}

fn get_millis(d: &Document, collection: &str, field: &str) -> Result<i64, StoreError> {
    match d.get(field) {
        Some(Bson::DateTime(dt)) => Ok(dt.timestamp_millis()),
        Some(Bson::Int64(ms)) => Ok(*ms),
        _ => Err(malformed(collection, field)),
    }
}

fn get_number(d: &Document, collection: &str, field: &str) -> Result<f64, StoreError> {
    let n = match d.get(field) {
        Some(Bson::Double(x)) => *x,
        Some(Bson::Int32(x)) => *x as f64,
        Some(Bson::Int64(x)) => *x as f64,
        _ => return Err(malformed(collection, field)),
    };

    if n.is_finite() { Ok(n) } else { Err(malformed(collection, field)) }
}

pub fn entry_from_document(d: &Document) -> Result<WatchlistEntry, StoreError> {
    Ok(WatchlistEntry {
        owner_id: get_string(d, WATCHLISTS, "userId")?,
        symbol: get_string(d, WATCHLISTS, "symbol")?,
        company: get_string(d, WATCHLISTS, "company")?,
        added_at: get_millis(d, WATCHLISTS, "addedAt")?,
    })
}

pub fn alert_from_document(d: &Document) -> Result<AlertRecord, StoreError> {
    let id = d.get_object_id("_id").map_err(|_| malformed(ALERTS, "_id"))?;
    let alert_type = d
        .get_str("alertType")
        .ok()
        .and_then(AlertType::parse)
        .ok_or_else(|| malformed(ALERTS, "alertType"))?;

    Ok(AlertRecord {
        id,
        owner_id: get_string(d, ALERTS, "userId")?,
        symbol: get_string(d, ALERTS, "symbol")?,
        company: get_string(d, ALERTS, "company")?,
        alert_name: get_string(d, ALERTS, "alertName")?,
        alert_type,
        threshold: get_number(d, ALERTS, "threshold")?,
        created_at: get_millis(d, ALERTS, "createdAt")?,
    })
}

pub fn alert_to_document(a: &AlertRecord) -> Document {
    doc! {
        "_id": a.id,
        "userId": &a.owner_id,
        "symbol": &a.symbol,
        "company": &a.company,
        "alertName": &a.alert_name,
        "alertType": a.alert_type.as_str(),
        "threshold": a.threshold,
        "createdAt": DateTime::from_millis(a.created_at),
    }
}

/// Reads a cursor to the end, dropping documents that fail `map`.
async fn collect_mapped<T>(
    mut cursor: mongodb::Cursor<Document>,
    map: fn(&Document) -> Result<T, StoreError>,
) -> Result<Vec<T>, StoreError> {
    let mut out: Vec<T> = Vec::new();
    while let Some(res) = cursor.next().await {
        let d = res?;
        match map(&d) {
            Ok(item) => out.push(item),
            Err(e) => tracing::warn!(error = %e, "skipping document"),
        }
    }
    Ok(out)
}

#[async_trait]
impl WatchlistBackend for MongoBackend {
    async fn insert_if_absent(&self, entry: &WatchlistEntry) -> Result<(), StoreError> {
        let col = self.collection(WATCHLISTS).await?;

        let res = col
            .update_one(
                doc! { "userId": &entry.owner_id, "symbol": &entry.symbol },
                doc! {
                    "$setOnInsert": {
                        "userId": &entry.owner_id,
                        "symbol": &entry.symbol,
                        "company": &entry.company,
                        "addedAt": DateTime::from_millis(entry.added_at),
                    }
                },
                UpdateOptions::builder().upsert(true).build(),
            )
            .await;

        match res {
            Ok(_) => Ok(()),
            // a concurrent add won the race; the entry exists either way
            Err(e) if is_duplicate_key(&e) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, owner_id: &str, symbol: &str) -> Result<(), StoreError> {
        let col = self.collection(WATCHLISTS).await?;
        col.delete_one(doc! { "userId": owner_id, "symbol": symbol }, None)
            .await?;
        Ok(())
    }

    async fn count(&self, owner_id: &str, symbol: &str) -> Result<u64, StoreError> {
        let col = self.collection(WATCHLISTS).await?;
        let n = col
            .count_documents(doc! { "userId": owner_id, "symbol": symbol }, None)
            .await?;
        Ok(n)
    }

    async fn find_for_owner(&self, owner_id: &str) -> Result<Vec<WatchlistEntry>, StoreError> {
        let col = self.collection(WATCHLISTS).await?;
        let find_opts = FindOptions::builder().sort(doc! { "addedAt": -1 }).build();

        let cursor = col.find(doc! { "userId": owner_id }, find_opts).await?;
        collect_mapped(cursor, entry_from_document).await
    }

    async fn symbols_for_email(&self, email: &str) -> Result<Vec<String>, StoreError> {
        let users = self.collection(USERS).await?;

        let Some(user) = users.find_one(doc! { "email": email }, None).await? else {
            return Ok(vec![]);
        };

        let user_id = match (user.get("id"), user.get("_id")) {
            (Some(Bson::String(id)), _) if !id.is_empty() => id.clone(),
            (_, Some(Bson::ObjectId(oid))) => oid.to_hex(),
            (_, Some(Bson::String(id))) => id.clone(),
            _ => String::new(),
        };
        if user_id.is_empty() {
            return Ok(vec![]);
        }

        let col = self.collection(WATCHLISTS).await?;
        let find_opts = FindOptions::builder().projection(doc! { "symbol": 1 }).build();
        let cursor = col.find(doc! { "userId": &user_id }, find_opts).await?;

        collect_mapped(cursor, |d| get_string(d, WATCHLISTS, "symbol")).await
    }
}

#[async_trait]
impl AlertBackend for MongoBackend {
    async fn insert(&self, record: &AlertRecord) -> Result<(), StoreError> {
        let col = self.collection(ALERTS).await?;
        col.insert_one(alert_to_document(record), None).await?;
        Ok(())
    }

    async fn find_and_replace(
        &self,
        id: &ObjectId,
        owner_id: &str,
        fields: &AlertFields,
    ) -> Result<Option<AlertRecord>, StoreError> {
        let col = self.collection(ALERTS).await?;
        let opts = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = col
            .find_one_and_update(
                doc! { "_id": *id, "userId": owner_id },
                doc! {
                    "$set": {
                        "symbol": &fields.symbol,
                        "company": &fields.company,
                        "alertName": &fields.alert_name,
                        "alertType": fields.alert_type.as_str(),
                        "threshold": fields.threshold,
                    }
                },
                opts,
            )
            .await?;

        updated.as_ref().map(alert_from_document).transpose()
    }

    async fn delete(&self, id: &ObjectId, owner_id: &str) -> Result<(), StoreError> {
        let col = self.collection(ALERTS).await?;
        col.delete_one(doc! { "_id": *id, "userId": owner_id }, None)
            .await?;
        Ok(())
    }

    async fn find_for_owner(&self, owner_id: &str) -> Result<Vec<AlertRecord>, StoreError> {
        let col = self.collection(ALERTS).await?;
        let find_opts = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();

        let cursor = col.find(doc! { "userId": owner_id }, find_opts).await?;
        collect_mapped(cursor, alert_from_document).await
    }
}
