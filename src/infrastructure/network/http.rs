// HTTP client utilities
use crate::domain::error::ScoreError;
use crate::infrastructure::config::Config;
use reqwest::Client;

/// Create the shared HTTP client.
///
/// No request timeout is set; a lookup waits as long as the server does.
pub fn create_client(config: &Config) -> Result<Client, ScoreError> {
    let mut builder = Client::builder()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(std::time::Duration::from_secs(30))
        .user_agent(config.user_agent.as_str());

    if let Some(proxy) = config.http_proxy.as_deref().filter(|p| !p.is_empty()) {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }

    Ok(builder.build()?)
}
