use crate::domain::error::ScoreError;
use crate::domain::model::{IconPaths, TabId};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// Logical storage areas, mirroring the browser's `sync` and `local` stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageArea {
    Sync,
    Local,
}

impl StorageArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageArea::Sync => "sync",
            StorageArea::Local => "local",
        }
    }
}

/// Durable key-value storage holding JSON values.
///
/// Every cache read and write goes through this trait, so whatever backs it
/// decides whether data survives a restart.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the given keys; absent keys are simply missing from the map.
    async fn get(
        &self,
        area: StorageArea,
        keys: &[String],
    ) -> Result<HashMap<String, Value>, ScoreError>;

    /// Store all items, replacing existing values.
    async fn set(&self, area: StorageArea, items: Vec<(String, Value)>) -> Result<(), ScoreError>;

    async fn remove(&self, area: StorageArea, keys: &[String]) -> Result<(), ScoreError>;

    async fn count(&self, area: StorageArea) -> Result<usize, ScoreError>;
}

/// Remote source of domain reports.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Raw response body of the query endpoint for `domain`.
    async fn query(&self, domain: &str) -> Result<String, ScoreError>;
}

/// The browser side: toolbar icon and tab creation.
#[async_trait]
pub trait BrowserHost: Send + Sync {
    async fn set_icon(&self, tab_id: TabId, paths: &IconPaths);

    async fn show(&self, tab_id: TabId);

    async fn open_tab(&self, url: &str);
}

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}
