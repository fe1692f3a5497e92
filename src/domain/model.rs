use crate::domain::error::ScoreError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub type TabId = i64;

/// Icon asset paths keyed by pixel size, as handed to the icon host.
pub type IconPaths = BTreeMap<u32, String>;

/// Scoring payload returned by the API for one domain.
///
/// Only `score` and `count` are interpreted; every other field the server
/// sends is kept in `extra` so the cached copy matches what was received.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Report {
    pub fn new(score: Option<f64>, count: i64) -> Self {
        Self {
            score,
            count,
            extra: Map::new(),
        }
    }

    /// Whether the server has any scoring data for the domain.
    pub fn is_reported(&self) -> bool {
        self.count > 0
    }

    /// Floored score, zero-padded to two digits ("07", "82", "100").
    pub fn score_label(&self) -> Option<String> {
        if !self.is_reported() {
            return None;
        }
        let score = self.score.filter(|s| s.is_finite())?;
        Some(format!("{:02}", score.floor() as i64))
    }
}

// Scores arrive as numbers, but numeric strings are accepted too
fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    })
}

/// A report read back from the local cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub value: Report,
    pub stored_at: i64,
}

impl CacheEntry {
    pub fn is_valid(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms
            .checked_sub(self.stored_at)
            .is_some_and(|age| age <= ttl_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOrigin {
    Cache,
    Network,
}

/// Result of a report lookup.
///
/// Callers that only care about the external behaviour use
/// [`FetchOutcome::into_report`], which folds `Miss` and `Error` into `None`.
#[derive(Debug)]
pub enum FetchOutcome {
    Hit { report: Report, origin: ReportOrigin },
    /// Nothing to look up (empty domain); no network call was made.
    Miss,
    Error(ScoreError),
}

impl FetchOutcome {
    pub fn into_report(self) -> Option<Report> {
        match self {
            FetchOutcome::Hit { report, .. } => Some(report),
            FetchOutcome::Miss | FetchOutcome::Error(_) => None,
        }
    }

    pub fn origin(&self) -> Option<ReportOrigin> {
        match self {
            FetchOutcome::Hit { origin, .. } => Some(*origin),
            _ => None,
        }
    }
}

/// What the toolbar icon shows for a tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IconState {
    Blank,
    Scored { label: String, color: String },
}

impl IconState {
    pub fn label(&self) -> Option<&str> {
        match self {
            IconState::Blank => None,
            IconState::Scored { label, .. } => Some(label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_keeps_unknown_fields() {
        let report: Report =
            serde_json::from_str(r#"{"score":82,"count":3,"domain":"example.com"}"#).unwrap();
        assert_eq!(report.score, Some(82.0));
        assert_eq!(report.count, 3);
        assert_eq!(report.extra.get("domain"), Some(&Value::from("example.com")));

        let back: Report = serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn report_accepts_missing_and_string_fields() {
        let report: Report = serde_json::from_str("{}").unwrap();
        assert_eq!(report.score, None);
        assert_eq!(report.count, 0);

        let report: Report = serde_json::from_str(r#"{"score":"67.9","count":"2"}"#).unwrap();
        assert_eq!(report.score, Some(67.9));
        assert_eq!(report.count, 2);

        let report: Report = serde_json::from_str(r#"{"score":null,"count":1}"#).unwrap();
        assert_eq!(report.score, None);
    }

    #[test]
    fn report_rejects_non_objects() {
        assert!(serde_json::from_str::<Report>("[1,2]").is_err());
        assert!(serde_json::from_str::<Report>("<html>").is_err());
    }

    #[test]
    fn score_label_is_floored_and_padded() {
        assert_eq!(Report::new(Some(82.7), 3).score_label().as_deref(), Some("82"));
        assert_eq!(Report::new(Some(7.2), 1).score_label().as_deref(), Some("07"));
        assert_eq!(Report::new(Some(0.0), 1).score_label().as_deref(), Some("00"));
        assert_eq!(Report::new(Some(100.0), 1).score_label().as_deref(), Some("100"));
        assert_eq!(Report::new(Some(90.0), 0).score_label(), None);
        assert_eq!(Report::new(None, 4).score_label(), None);
    }

    #[test]
    fn cache_entry_validity_is_inclusive() {
        let entry = CacheEntry {
            key: "example.com".to_string(),
            value: Report::new(Some(50.0), 1),
            stored_at: 1_000,
        };
        assert!(entry.is_valid(1_000 + 3_600_000, 3_600_000));
        assert!(!entry.is_valid(1_000 + 3_600_001, 3_600_000));
    }

    #[test]
    fn cache_entry_with_extreme_timestamp_is_invalid() {
        let entry = CacheEntry {
            key: "example.com".to_string(),
            value: Report::new(Some(50.0), 1),
            stored_at: i64::MIN,
        };
        assert!(!entry.is_valid(1_700_000_000_000, 3_600_000));
    }
}
