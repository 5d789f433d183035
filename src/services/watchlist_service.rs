use std::sync::Arc;

use crate::{
    error::{ActionResult, StoreError},
    models::{Session, WatchlistEntry},
};

use super::{backend::WatchlistBackend, diagnostics::Diagnostics, Clock};

pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

#[derive(Clone)]
pub struct WatchlistStore {
    backend: Arc<dyn WatchlistBackend>,
    diagnostics: Diagnostics,
    clock: Clock,
}

impl WatchlistStore {
    pub fn new(backend: Arc<dyn WatchlistBackend>, diagnostics: Diagnostics, clock: Clock) -> Self {
        Self {
            backend,
            diagnostics,
            clock,
        }
    }

    fn fail<T>(&self, op: &'static str, err: StoreError, storage_msg: &str) -> ActionResult<T> {
        self.diagnostics.report(op, &err);

        let msg = match &err {
            StoreError::NotAuthenticated => "Not authenticated",
            StoreError::InvalidInput(_) => "Invalid symbol",
            StoreError::NotFound | StoreError::StorageUnavailable(_) => storage_msg,
        };
        ActionResult::failure(err.kind(), msg)
    }

    async fn try_add(&self, session: &Session, symbol: &str, company: &str) -> Result<(), StoreError> {
        let owner_id = session.owner_id().ok_or(StoreError::NotAuthenticated)?;

        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(StoreError::InvalidInput("symbol"));
        }

        let company = match company.trim() {
            "" => symbol.clone(),
            c => c.to_string(),
        };

        let entry = WatchlistEntry {
            owner_id: owner_id.to_string(),
            symbol,
            company,
            added_at: (self.clock)(),
        };

        self.backend.insert_if_absent(&entry).await
    }

    /// Adds `symbol` to the caller's watchlist. Adding a symbol that is
    /// already there succeeds and keeps the original entry.
    pub async fn add(&self, session: &Session, symbol: &str, company: &str) -> ActionResult<()> {
        match self.try_add(session, symbol, company).await {
            Ok(()) => ActionResult::done(),
            Err(e) => self.fail("watchlist.add", e, "Failed to add to watchlist"),
        }
    }

    async fn try_remove(&self, session: &Session, symbol: &str) -> Result<(), StoreError> {
        let owner_id = session.owner_id().ok_or(StoreError::NotAuthenticated)?;
        self.backend.delete(owner_id, &normalize_symbol(symbol)).await
    }

    /// Removing a symbol that is not on the watchlist is a success.
    pub async fn remove(&self, session: &Session, symbol: &str) -> ActionResult<()> {
        match self.try_remove(session, symbol).await {
            Ok(()) => ActionResult::done(),
            Err(e) => self.fail("watchlist.remove", e, "Failed to remove from watchlist"),
        }
    }

    async fn try_is_member(&self, session: &Session, symbol: &str) -> Result<bool, StoreError> {
        let owner_id = session.owner_id().ok_or(StoreError::NotAuthenticated)?;
        let n = self.backend.count(owner_id, &normalize_symbol(symbol)).await?;
        Ok(n > 0)
    }

    pub async fn is_member(&self, session: &Session, symbol: &str) -> bool {
        self.try_is_member(session, symbol)
            .await
            .unwrap_or_else(|e| {
                self.diagnostics.report("watchlist.is_member", &e);
                false
            })
    }

    async fn try_list(&self, session: &Session) -> Result<Vec<WatchlistEntry>, StoreError> {
        let owner_id = session.owner_id().ok_or(StoreError::NotAuthenticated)?;
        self.backend.find_for_owner(owner_id).await
    }

    /// Newest first; empty when anonymous or when storage fails.
    pub async fn list_for_owner(&self, session: &Session) -> Vec<WatchlistEntry> {
        self.try_list(session).await.unwrap_or_else(|e| {
            self.diagnostics.report("watchlist.list", &e);
            vec![]
        })
    }

    /// Symbols on the watchlist of the user registered under `email`. Not
    /// gated by the caller's session.
    pub async fn symbols_for_email(&self, email: &str) -> Vec<String> {
        let email = email.trim();
        if email.is_empty() {
            return vec![];
        }

        self.backend
            .symbols_for_email(email)
            .await
            .unwrap_or_else(|e| {
                self.diagnostics.report("watchlist.symbols_for_email", &e);
                vec![]
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_symbol(" aapl "), "AAPL");
        assert_eq!(normalize_symbol("brk.b"), "BRK.B");
        assert_eq!(normalize_symbol("   "), "");
    }
}
