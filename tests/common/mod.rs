//! Shared setup for integration tests
#![allow(dead_code)]

use scorelens::domain::traits::BrowserHost;
use scorelens::infrastructure::clock::ManualClock;
use scorelens::infrastructure::config::Config;
use scorelens::infrastructure::network::client::ApiClient;
use scorelens::infrastructure::storage::db::{init_memory_database, SqliteStore};
use scorelens::state::AppState;
use scorelens::test_utils::{MockSource, RecordingHost};
use std::sync::Arc;

pub const START_MS: i64 = 1_700_000_000_000;
pub const TTL_MS: i64 = 60 * 60 * 1000;

pub struct Harness {
    pub state: AppState,
    pub source: Arc<MockSource>,
    pub host: Arc<RecordingHost>,
    pub clock: Arc<ManualClock>,
}

pub async fn harness(source: MockSource) -> Harness {
    harness_with(source, Config::default()).await
}

pub async fn harness_with(source: MockSource, config: Config) -> Harness {
    let store = Arc::new(SqliteStore::new(init_memory_database().await.unwrap()));
    let host = Arc::new(RecordingHost::default());
    let (state, source, clock) = build_state(source, config, store, host.clone());
    Harness {
        state,
        source,
        host,
        clock,
    }
}

pub fn build_state(
    source: MockSource,
    config: Config,
    store: Arc<SqliteStore>,
    host: Arc<dyn BrowserHost>,
) -> (AppState, Arc<MockSource>, Arc<ManualClock>) {
    let source = Arc::new(source);
    let clock = Arc::new(ManualClock::new(START_MS));
    let api = Arc::new(ApiClient::new(reqwest::Client::new(), &config));
    let state = AppState::from_parts(config, store, clock.clone(), source.clone(), api, host)
        .unwrap();
    (state, source, clock)
}
