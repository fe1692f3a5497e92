use crate::domain::model::{IconPaths, IconState, Report, TabId};
use crate::domain::traits::BrowserHost;
use crate::infrastructure::config::IconConfig;
use crate::presentation::color::color_for_score;
use std::sync::Arc;

/// Puts the blank or scored icon on a tab.
pub struct IconRenderer {
    host: Arc<dyn BrowserHost>,
    asset_dir: String,
    sizes: Vec<u32>,
}

impl IconRenderer {
    pub fn new(host: Arc<dyn BrowserHost>, config: &IconConfig) -> Self {
        Self {
            host,
            asset_dir: config.asset_dir.trim_end_matches('/').to_string(),
            sizes: config.sizes.clone(),
        }
    }

    /// Work out the icon state for a lookup result without touching the host.
    pub fn state_for(report: Option<&Report>) -> IconState {
        match report.and_then(|r| r.score_label().map(|label| (r, label))) {
            Some((report, label)) => IconState::Scored {
                label,
                color: color_for_score(report.score),
            },
            None => IconState::Blank,
        }
    }

    pub async fn render(&self, tab_id: TabId, report: Option<&Report>) -> IconState {
        let state = Self::state_for(report);
        let paths = self.paths_for(&state);

        tracing::debug!(tab_id, state = ?state, "rendering icon");
        self.host.set_icon(tab_id, &paths).await;
        self.host.show(tab_id).await;
        state
    }

    pub fn paths_for(&self, state: &IconState) -> IconPaths {
        self.sizes
            .iter()
            .map(|size| {
                let path = match state {
                    IconState::Blank => format!("{}/bg{}.png", self.asset_dir, size),
                    IconState::Scored { label, .. } => {
                        format!("{}/scores/{}/{}.png", self.asset_dir, label, size)
                    }
                };
                (*size, path)
            })
            .collect()
    }
}
