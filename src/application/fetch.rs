use crate::domain::error::ScoreError;
use crate::domain::model::{FetchOutcome, Report, ReportOrigin};
use crate::domain::traits::ReportSource;
use crate::infrastructure::storage::cache::{normalize_key, ScoreCache};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Cache-first report lookup.
///
/// A miss triggers exactly one request to the report source; concurrent
/// lookups of the same domain wait on that request and then read its result
/// from the cache.
pub struct ReportFetcher {
    cache: Arc<ScoreCache>,
    source: Arc<dyn ReportSource>,
    inflight: DashMap<String, Arc<Mutex<()>>>,
}

impl ReportFetcher {
    pub fn new(cache: Arc<ScoreCache>, source: Arc<dyn ReportSource>) -> Self {
        Self {
            cache,
            source,
            inflight: DashMap::new(),
        }
    }

    pub fn cache(&self) -> &Arc<ScoreCache> {
        &self.cache
    }

    /// Report for `domain`, or `None` when it could not be obtained.
    pub async fn fetch_report(&self, domain: &str) -> Option<Report> {
        self.fetch(domain).await.into_report()
    }

    pub async fn fetch(&self, domain: &str) -> FetchOutcome {
        let domain = normalize_key(domain);
        if domain.is_empty() {
            return FetchOutcome::Miss;
        }

        if let Some(report) = self.cached(&domain).await {
            return FetchOutcome::Hit {
                report,
                origin: ReportOrigin::Cache,
            };
        }

        let lock = self
            .inflight
            .entry(domain.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let outcome = {
            let _guard = lock.lock().await;
            // Another lookup may have filled the cache while we waited
            match self.cached(&domain).await {
                Some(report) => FetchOutcome::Hit {
                    report,
                    origin: ReportOrigin::Cache,
                },
                None => self.fetch_remote(&domain).await,
            }
        };
        drop(lock);
        self.inflight
            .remove_if(&domain, |_, lock| Arc::strong_count(lock) == 1);

        outcome
    }

    async fn cached(&self, domain: &str) -> Option<Report> {
        match self.cache.get(domain).await {
            Ok(entry) => entry.map(|e| e.value),
            Err(e) => {
                tracing::warn!(domain, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    async fn fetch_remote(&self, domain: &str) -> FetchOutcome {
        let body = match self.source.query(domain).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(domain, error = %e, "report request failed");
                return FetchOutcome::Error(e);
            }
        };

        let report = match serde_json::from_str::<Report>(&body) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(domain, error = %e, "unparseable report body");
                return FetchOutcome::Error(ScoreError::Json(e));
            }
        };

        if let Err(e) = self.cache.set(domain, &report).await {
            tracing::warn!(domain, error = %e, "could not cache report");
        }

        FetchOutcome::Hit {
            report,
            origin: ReportOrigin::Network,
        }
    }
}
