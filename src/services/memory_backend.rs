use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::{
    error::StoreError,
    models::{AlertFields, AlertRecord, WatchlistEntry},
};

use super::backend::{AlertBackend, WatchlistBackend};

#[derive(Default)]
struct State {
    seq: u64,
    // (insertion seq, entry); seq breaks ties between equal timestamps
    watchlist: Vec<(u64, WatchlistEntry)>,
    alerts: Vec<(u64, AlertRecord)>,
    // email -> user id
    users: HashMap<String, String>,
}

impl State {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

/// In-process backend with the same observable semantics as the Mongo one.
/// Clones share state.
#[derive(Clone)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
    available: Arc<AtomicBool>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// While unavailable every call fails with `StorageUnavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn register_user(&self, email: &str, user_id: &str) {
        if let Ok(mut st) = self.state.lock() {
            st.users.insert(email.to_string(), user_id.to_string());
        }
    }

    pub fn watchlist_len(&self) -> usize {
        self.state.lock().map(|st| st.watchlist.len()).unwrap_or(0)
    }

    pub fn alert_count(&self) -> usize {
        self.state.lock().map(|st| st.alerts.len()).unwrap_or(0)
    }

    /// Looks a stored alert up by id regardless of owner.
    pub fn alert(&self, id: &ObjectId) -> Option<AlertRecord> {
        let st = self.state.lock().ok()?;
        let found = st
            .alerts
            .iter()
            .find(|(_, a)| &a.id == id)
            .map(|(_, a)| a.clone());
        found
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::StorageUnavailable(
                "memory backend switched off".to_string(),
            ));
        }

        self.state
            .lock()
            .map_err(|_| StoreError::StorageUnavailable("memory backend poisoned".to_string()))
    }
}

#[async_trait]
impl WatchlistBackend for MemoryBackend {
    async fn insert_if_absent(&self, entry: &WatchlistEntry) -> Result<(), StoreError> {
        let mut st = self.lock()?;

        let exists = st
            .watchlist
            .iter()
            .any(|(_, e)| e.owner_id == entry.owner_id && e.symbol == entry.symbol);

        if !exists {
            let seq = st.next_seq();
            st.watchlist.push((seq, entry.clone()));
        }
        Ok(())
    }

    async fn delete(&self, owner_id: &str, symbol: &str) -> Result<(), StoreError> {
        let mut st = self.lock()?;
        st.watchlist
            .retain(|(_, e)| !(e.owner_id == owner_id && e.symbol == symbol));
        Ok(())
    }

    async fn count(&self, owner_id: &str, symbol: &str) -> Result<u64, StoreError> {
        let st = self.lock()?;
        let n = st
            .watchlist
            .iter()
            .filter(|(_, e)| e.owner_id == owner_id && e.symbol == symbol)
            .count();
        Ok(n as u64)
    }

    async fn find_for_owner(&self, owner_id: &str) -> Result<Vec<WatchlistEntry>, StoreError> {
        let st = self.lock()?;

        let mut items: Vec<&(u64, WatchlistEntry)> = st
            .watchlist
            .iter()
            .filter(|(_, e)| e.owner_id == owner_id)
            .collect();
        items.sort_by(|(sa, a), (sb, b)| b.added_at.cmp(&a.added_at).then(sb.cmp(sa)));

        Ok(items.into_iter().map(|(_, e)| e.clone()).collect())
    }

    async fn symbols_for_email(&self, email: &str) -> Result<Vec<String>, StoreError> {
        let st = self.lock()?;

        let Some(user_id) = st.users.get(email) else {
            return Ok(vec![]);
        };

        let symbols = st
            .watchlist
            .iter()
            .filter(|(_, e)| &e.owner_id == user_id)
            .map(|(_, e)| e.symbol.clone())
            .collect();
        Ok(symbols)
    }
}

#[async_trait]
impl AlertBackend for MemoryBackend {
    async fn insert(&self, record: &AlertRecord) -> Result<(), StoreError> {
        let mut st = self.lock()?;

        if st.alerts.iter().any(|(_, a)| a.id == record.id) {
            return Err(StoreError::StorageUnavailable(format!(
                "duplicate alert id {}",
                record.id
            )));
        }

        let seq = st.next_seq();
        st.alerts.push((seq, record.clone()));
        Ok(())
    }

    async fn find_and_replace(
        &self,
        id: &ObjectId,
        owner_id: &str,
        fields: &AlertFields,
    ) -> Result<Option<AlertRecord>, StoreError> {
        let mut st = self.lock()?;

        let found = st
            .alerts
            .iter_mut()
            .find(|(_, a)| &a.id == id && a.owner_id == owner_id);

        Ok(found.map(|(_, a)| {
            a.apply(fields);
            a.clone()
        }))
    }

    async fn delete(&self, id: &ObjectId, owner_id: &str) -> Result<(), StoreError> {
        let mut st = self.lock()?;
        st.alerts
            .retain(|(_, a)| !(&a.id == id && a.owner_id == owner_id));
        Ok(())
    }

    async fn find_for_owner(&self, owner_id: &str) -> Result<Vec<AlertRecord>, StoreError> {
        let st = self.lock()?;

        let mut items: Vec<&(u64, AlertRecord)> = st
            .alerts
            .iter()
            .filter(|(_, a)| a.owner_id == owner_id)
            .collect();
        items.sort_by(|(sa, a), (sb, b)| b.created_at.cmp(&a.created_at).then(sb.cmp(sa)));

        Ok(items.into_iter().map(|(_, a)| a.clone()).collect())
    }
}
