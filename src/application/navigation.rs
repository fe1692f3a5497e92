use crate::domain::error::ScoreError;
use crate::domain::model::{IconState, TabId};
use crate::state::AppState;
use reqwest::Url;

/// Whether the icon applies to `url`: only http(s) pages that are not on localhost.
pub fn allow_action_by_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    let url = url.to_lowercase();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return false;
    }

    !url.contains("://localhost")
}

/// Lowercased hostname of `url`.
pub fn domain_by_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .host_str()
        .map(|host| host.trim_end_matches('.').to_lowercase())
        .filter(|host| !host.is_empty())
}

/// Look up the page's domain and put the matching icon on the tab.
///
/// Returns `None` when the page is not eligible, or when the tab navigated
/// again before the lookup finished and the result was dropped.
pub async fn on_tab_updated(state: &AppState, tab_id: TabId, url: &str) -> Option<IconState> {
    let generation = state.begin_navigation(tab_id);
    if !allow_action_by_url(url) {
        return None;
    }

    let report = match domain_by_url(url) {
        Some(domain) => state.fetcher.fetch_report(&domain).await,
        None => None,
    };

    if state.config.discard_stale_renders && !state.is_current_navigation(tab_id, generation) {
        tracing::debug!(tab_id, generation, "tab moved on, dropping stale result");
        return None;
    }

    Some(state.renderer.render(tab_id, report.as_ref()).await)
}

pub fn on_tab_removed(state: &AppState, tab_id: TabId) {
    state.forget_tab(tab_id);
}

/// Warm the cache for the page, then open the report page for it.
pub async fn on_action_clicked(state: &AppState, url: &str) -> Result<Url, ScoreError> {
    if let Some(domain) = domain_by_url(url) {
        let _ = state.fetcher.fetch_report(&domain).await;
    }

    let target = state.api.redirect_url(url)?;
    state.host.open_tab(target.as_str()).await;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gating() {
        assert!(allow_action_by_url("https://example.com/path"));
        assert!(allow_action_by_url("HTTP://Example.com"));
        assert!(!allow_action_by_url(""));
        assert!(!allow_action_by_url("chrome://extensions"));
        assert!(!allow_action_by_url("file:///etc/hosts"));
        assert!(!allow_action_by_url("http://localhost:3000/"));
        assert!(!allow_action_by_url("https://LOCALHOST/"));
    }

    #[test]
    fn domain_extraction() {
        assert_eq!(
            domain_by_url("https://WWW.Example.com:8443/a?b=c").as_deref(),
            Some("www.example.com")
        );
        assert_eq!(domain_by_url("http://example.com./").as_deref(), Some("example.com"));
        assert_eq!(domain_by_url("not a url"), None);
        assert_eq!(domain_by_url("mailto:someone@example.com"), None);
    }
}
