use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::{
    error::StoreError,
    models::{AlertFields, AlertRecord, WatchlistEntry},
};

/// Storage primitives behind the watchlist. Each store operation issues
/// exactly one of these.
#[async_trait]
pub trait WatchlistBackend: Send + Sync {
    /// Inserts `entry` unless one already exists for its (owner, symbol).
    /// An existing entry is left untouched.
    async fn insert_if_absent(&self, entry: &WatchlistEntry) -> Result<(), StoreError>;

    async fn delete(&self, owner_id: &str, symbol: &str) -> Result<(), StoreError>;

    async fn count(&self, owner_id: &str, symbol: &str) -> Result<u64, StoreError>;

    /// All entries of `owner_id`, newest `added_at` first.
    async fn find_for_owner(&self, owner_id: &str) -> Result<Vec<WatchlistEntry>, StoreError>;

    /// Watchlist symbols of the user registered under `email`; empty when
    /// no such user exists.
    async fn symbols_for_email(&self, email: &str) -> Result<Vec<String>, StoreError>;
}

#[async_trait]
pub trait AlertBackend: Send + Sync {
    async fn insert(&self, record: &AlertRecord) -> Result<(), StoreError>;

    /// Overwrites the mutable fields of the alert matching both `id` and
    /// `owner_id`, returning the updated record or `None` if nothing matched.
    async fn find_and_replace(
        &self,
        id: &ObjectId,
        owner_id: &str,
        fields: &AlertFields,
    ) -> Result<Option<AlertRecord>, StoreError>;

    async fn delete(&self, id: &ObjectId, owner_id: &str) -> Result<(), StoreError>;

    /// All alerts of `owner_id`, newest `created_at` first.
    async fn find_for_owner(&self, owner_id: &str) -> Result<Vec<AlertRecord>, StoreError>;
}
