use crate::application::fetch::ReportFetcher;
use crate::domain::error::ScoreError;
use crate::domain::model::TabId;
use crate::domain::traits::{BrowserHost, Clock, KeyValueStore, ReportSource};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::config::Config;
use crate::infrastructure::network::client::ApiClient;
use crate::infrastructure::network::http::create_client;
use crate::infrastructure::storage::cache::ScoreCache;
use crate::infrastructure::storage::db::SqliteStore;
use crate::presentation::icon::IconRenderer;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_rusqlite::Connection;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
    pub host: Arc<dyn BrowserHost>,
    pub api: Arc<ApiClient>,
    pub cache: Arc<ScoreCache>,
    pub fetcher: Arc<ReportFetcher>,
    pub renderer: Arc<IconRenderer>,
    /// Generation of the latest navigation per tab.
    pub tabs: Arc<DashMap<TabId, u64>>,
    /// Shared by all tabs so a generation is never handed out twice.
    navigations: Arc<AtomicU64>,
}

impl AppState {
    /// Wire up the production stack: SQLite storage, the HTTP API and the wall clock.
    pub fn new(
        db: Connection,
        config: Config,
        host: Arc<dyn BrowserHost>,
    ) -> Result<Self, ScoreError> {
        let api = Arc::new(ApiClient::new(create_client(&config)?, &config));
        Self::from_parts(
            config,
            Arc::new(SqliteStore::new(db)),
            Arc::new(SystemClock),
            api.clone(),
            api,
            host,
        )
    }

    /// Wire up with explicit collaborators; `source` answers report queries.
    pub fn from_parts(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        source: Arc<dyn ReportSource>,
        api: Arc<ApiClient>,
        host: Arc<dyn BrowserHost>,
    ) -> Result<Self, ScoreError> {
        config.validate()?;

        let cache = Arc::new(ScoreCache::new(
            store.clone(),
            clock.clone(),
            config.cache_ttl_ms(),
        ));
        let fetcher = Arc::new(ReportFetcher::new(cache.clone(), source));
        let renderer = Arc::new(IconRenderer::new(host.clone(), &config.icon));

        Ok(Self {
            config: Arc::new(config),
            store,
            clock,
            host,
            api,
            cache,
            fetcher,
            renderer,
            tabs: Arc::new(DashMap::new()),
            navigations: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Start a new navigation on `tab_id` and return its generation.
    pub fn begin_navigation(&self, tab_id: TabId) -> u64 {
        let generation = self.navigations.fetch_add(1, Ordering::Relaxed) + 1;
        self.tabs.insert(tab_id, generation);
        generation
    }

    pub fn is_current_navigation(&self, tab_id: TabId, generation: u64) -> bool {
        self.tabs
            .get(&tab_id)
            .map(|current| *current == generation)
            .unwrap_or(false)
    }

    pub fn forget_tab(&self, tab_id: TabId) {
        self.tabs.remove(&tab_id);
    }
}
