//! In-process fakes for the browser host and the report API.

use crate::domain::error::ScoreError;
use crate::domain::model::{IconPaths, TabId};
use crate::domain::traits::{BrowserHost, ReportSource};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    SetIcon { tab_id: TabId, paths: IconPaths },
    Show { tab_id: TabId },
    OpenTab { url: String },
}

/// Browser host that records every call.
#[derive(Debug, Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<HostCall>>,
}

impl RecordingHost {
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Icon paths most recently set on `tab_id`.
    pub fn last_icon(&self, tab_id: TabId) -> Option<IconPaths> {
        self.calls().into_iter().rev().find_map(|call| match call {
            HostCall::SetIcon { tab_id: id, paths } if id == tab_id => Some(paths),
            _ => None,
        })
    }

    pub fn opened_tabs(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::OpenTab { url } => Some(url),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: HostCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl BrowserHost for RecordingHost {
    async fn set_icon(&self, tab_id: TabId, paths: &IconPaths) {
        self.record(HostCall::SetIcon {
            tab_id,
            paths: paths.clone(),
        });
    }

    async fn show(&self, tab_id: TabId) {
        self.record(HostCall::Show { tab_id });
    }

    async fn open_tab(&self, url: &str) {
        self.record(HostCall::OpenTab {
            url: url.to_string(),
        });
    }
}

/// Report source answering from a table of canned bodies.
///
/// Unknown domains get the default body; a domain without any body fails
/// like a network error. Every call is counted.
#[derive(Debug, Default)]
pub struct MockSource {
    bodies: HashMap<String, String>,
    default_body: Option<String>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
    calls_by_domain: Mutex<HashMap<String, usize>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(body: &str) -> Self {
        Self {
            default_body: Some(body.to_string()),
            ..Self::default()
        }
    }

    pub fn body(mut self, domain: &str, body: &str) -> Self {
        self.bodies.insert(domain.to_string(), body.to_string());
        self
    }

    pub fn delay(mut self, domain: &str, delay: Duration) -> Self {
        self.delays.insert(domain.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, domain: &str) -> usize {
        self.calls_by_domain
            .lock()
            .ok()
            .and_then(|m| m.get(domain).copied())
            .unwrap_or(0)
    }
}

#[async_trait]
impl ReportSource for MockSource {
    async fn query(&self, domain: &str) -> Result<String, ScoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut by_domain) = self.calls_by_domain.lock() {
            *by_domain.entry(domain.to_string()).or_insert(0) += 1;
        }

        if let Some(delay) = self.delays.get(domain) {
            tokio::time::sleep(*delay).await;
        }

        self.bodies
            .get(domain)
            .or(self.default_body.as_ref())
            .cloned()
            .ok_or_else(|| {
                ScoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    format!("no route to {}", domain),
                ))
            })
    }
}
