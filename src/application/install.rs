use crate::domain::error::ScoreError;
use crate::domain::traits::{BrowserHost, Clock, KeyValueStore, StorageArea};
use crate::infrastructure::network::client::ApiClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record kept in the `sync` area under the install key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallRecord {
    pub timestamp: i64,
}

/// Read the install record, if one was written.
pub async fn install_record(
    store: &dyn KeyValueStore,
    install_key: &str,
) -> Result<Option<InstallRecord>, ScoreError> {
    let key = install_key.to_string();
    let mut found = store.get(StorageArea::Sync, &[key.clone()]).await?;

    let record = match found.remove(&key) {
        // Stored as a JSON string, as the browser storage API would
        Some(Value::String(raw)) => serde_json::from_str::<InstallRecord>(&raw).ok(),
        Some(other) => serde_json::from_value::<InstallRecord>(other).ok(),
        None => None,
    };
    Ok(record)
}

/// First-run notice: store the install time and open the welcome page once.
///
/// Returns the new record on first run, `None` when already installed.
pub async fn install_notice(
    store: &dyn KeyValueStore,
    clock: &dyn Clock,
    host: &dyn BrowserHost,
    api: &ApiClient,
    install_key: &str,
) -> Result<Option<InstallRecord>, ScoreError> {
    if let Some(existing) = install_record(store, install_key).await? {
        tracing::debug!(timestamp = existing.timestamp, "already installed");
        return Ok(None);
    }

    let record = InstallRecord {
        timestamp: clock.now_ms(),
    };
    store
        .set(
            StorageArea::Sync,
            vec![(
                install_key.to_string(),
                Value::String(serde_json::to_string(&record)?),
            )],
        )
        .await?;

    let url = api.welcome_url(record.timestamp)?;
    tracing::info!(timestamp = record.timestamp, "first run, opening welcome page");
    host.open_tab(url.as_str()).await;

    Ok(Some(record))
}
