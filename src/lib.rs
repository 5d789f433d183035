//! Library entrypoint for the stock watchlist service.
//!
//! Integration tests under `tests/` build an [`AppState`] on the in-memory
//! backend and drive the stores and routers directly.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod models;

#[path = "middleware/auth.rs"]
pub mod auth;

pub mod services;

pub mod controllers;
pub mod routes;

use config::{Settings, StorageKind};
use services::{
    alerts_service::AlertStore,
    db::DbHandle,
    diagnostics::Diagnostics,
    memory_backend::MemoryBackend,
    mongo_backend::MongoBackend,
    presentation_service::{NewsSource, NoNews, NoQuotes, QuoteSource},
    system_clock,
    watchlist_service::WatchlistStore,
    Clock,
};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    // None when running on the in-memory backend
    pub db: Option<DbHandle>,
    pub sessions: auth::SessionResolver,
    pub watchlist: WatchlistStore,
    pub alerts: AlertStore,
    pub quotes: Arc<dyn QuoteSource>,
    pub news: Arc<dyn NewsSource>,
    pub diagnostics: Diagnostics,
}

impl AppState {
    /// Wires stores to the backend selected in `settings`. Nothing connects
    /// here; the Mongo client is created on first use.
    pub fn build(settings: Settings) -> Self {
        let diagnostics = Diagnostics::with_channel(64);

        match settings.storage {
            StorageKind::Mongo => {
                let db = DbHandle::from_settings(&settings);
                let backend = Arc::new(MongoBackend::new(db.clone()));
                Self::assemble(settings, Some(db), backend.clone(), backend, diagnostics, system_clock())
            }
            StorageKind::Memory => {
                let backend = Arc::new(MemoryBackend::new());
                Self::assemble(settings, None, backend.clone(), backend, diagnostics, system_clock())
            }
        }
    }

    pub fn in_memory(settings: Settings, backend: MemoryBackend, clock: Clock) -> Self {
        let backend = Arc::new(backend);
        Self::assemble(settings, None, backend.clone(), backend, Diagnostics::with_channel(64), clock)
    }

    fn assemble(
        settings: Settings,
        db: Option<DbHandle>,
        watchlist_backend: Arc<dyn services::backend::WatchlistBackend>,
        alert_backend: Arc<dyn services::backend::AlertBackend>,
        diagnostics: Diagnostics,
        clock: Clock,
    ) -> Self {
        Self {
            sessions: auth::SessionResolver::from_settings(&settings),
            watchlist: WatchlistStore::new(watchlist_backend, diagnostics.clone(), clock.clone()),
            alerts: AlertStore::new(alert_backend, diagnostics.clone(), clock),
            quotes: Arc::new(NoQuotes),
            news: Arc::new(NoNews),
            diagnostics,
            settings,
            db,
        }
    }

    pub fn with_quotes(mut self, quotes: Arc<dyn QuoteSource>) -> Self {
        self.quotes = quotes;
        self
    }

    pub fn with_news(mut self, news: Arc<dyn NewsSource>) -> Self {
        self.news = news;
        self
    }
}
