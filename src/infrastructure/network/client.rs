use crate::domain::error::ScoreError;
use crate::domain::traits::ReportSource;
use crate::infrastructure::config::Config;
use async_trait::async_trait;
use reqwest::{Client, Url};

/// Client for the scoring API and the related web pages.
pub struct ApiClient {
    client: Client,
    api_base: String,
    web_base: String,
    source: String,
    client_name: String,
}

impl ApiClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            web_base: config.web_base.trim_end_matches('/').to_string(),
            source: config.source.clone(),
            client_name: config.client.clone(),
        }
    }

    /// `{api}/v1/query?source=..&domain=..`
    pub fn query_url(&self, domain: &str) -> Result<Url, ScoreError> {
        build_url(
            &format!("{}/v1/query", self.api_base),
            &[("source", self.source.as_str()), ("domain", domain)],
        )
    }

    /// Where a click on the toolbar icon sends the user.
    pub fn redirect_url(&self, page_url: &str) -> Result<Url, ScoreError> {
        build_url(
            &format!("{}/v1/redirect", self.api_base),
            &[("url", page_url), ("source", self.source.as_str())],
        )
    }

    pub fn welcome_url(&self, timestamp_ms: i64) -> Result<Url, ScoreError> {
        build_url(
            &format!("{}/welcome", self.web_base),
            &[
                ("client", self.client_name.as_str()),
                ("timestamp", timestamp_ms.to_string().as_str()),
            ],
        )
    }
}

fn build_url(base: &str, params: &[(&str, &str)]) -> Result<Url, ScoreError> {
    let mut url =
        Url::parse(base).map_err(|e| ScoreError::InvalidUrl(format!("{}: {}", base, e)))?;
    url.query_pairs_mut().extend_pairs(params.iter().copied());
    Ok(url)
}

#[async_trait]
impl ReportSource for ApiClient {
    async fn query(&self, domain: &str) -> Result<String, ScoreError> {
        let url = self.query_url(domain)?;
        tracing::info!(domain, "querying report");

        // The body is returned whatever the status; the caller decides
        // whether it is a usable report.
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(domain, status = %status, "report query returned an error status");
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> ApiClient {
        ApiClient::new(Client::new(), &Config::default())
    }

    #[test]
    fn query_url_carries_source_and_domain() {
        let url = api().query_url("example.com").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.passmarked.com/v1/query?source=chrome.ext&domain=example.com"
        );
    }

    #[test]
    fn redirect_url_encodes_page() {
        let url = api()
            .redirect_url("https://example.com/a b?x=1&y=2")
            .unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(url.path(), "/v1/redirect");
        assert_eq!(
            pairs,
            vec![
                ("url".to_string(), "https://example.com/a b?x=1&y=2".to_string()),
                ("source".to_string(), "chrome.ext".to_string()),
            ]
        );
        assert!(!url.as_str().contains("x=1&y=2"));
    }

    #[test]
    fn welcome_url_has_client_and_timestamp() {
        let url = api().welcome_url(1_700_000_000_123).unwrap();
        assert_eq!(
            url.as_str(),
            "https://passmarked.com/welcome?client=chrome&timestamp=1700000000123"
        );
    }

    #[test]
    fn trailing_slash_in_base_is_ignored() {
        let config = Config {
            api_base: "http://localhost:9000/".to_string(),
            ..Config::default()
        };
        let api = ApiClient::new(Client::new(), &config);
        assert_eq!(
            api.query_url("a.com").unwrap().as_str(),
            "http://localhost:9000/v1/query?source=chrome.ext&domain=a.com"
        );
    }
}
