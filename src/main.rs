// Main entry point
use clap::Parser;
use colored::Colorize;
use scorelens::application::install::{install_notice, install_record};
use scorelens::application::navigation::{allow_action_by_url, domain_by_url};
use scorelens::domain::model::{FetchOutcome, ReportOrigin};
use scorelens::domain::traits::{BrowserHost, StorageArea};
use scorelens::infrastructure;
use scorelens::infrastructure::config::{load_config, Config};
use scorelens::interfaces::cli::Cli;
use scorelens::interfaces::events::{self, ChannelHost, LogHost};
use scorelens::presentation::icon::IconRenderer;
use scorelens::state::AppState;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config()?;

    // Initialize logging
    if config.logging.enable {
        init_logging(&config.logging)?;
    }

    if cli.generate_config {
        infrastructure::config::generate_config_sample()?;
        return Ok(());
    }

    // Setup database path (from config or default)
    let db_path = infrastructure::config::get_database_path(&config);
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let db_conn = infrastructure::storage::db::init_database(&db_path).await?;

    if cli.serve {
        return serve(db_conn, config).await;
    }

    let state = AppState::new(db_conn, config, Arc::new(LogHost))?;

    if let Some(domain) = &cli.bust {
        state.cache.evict(domain).await?;
        println!("{} {}", "✔ Evicted".green(), domain);
        return Ok(());
    }
    if cli.installed {
        let record = install_record(state.store.as_ref(), &state.config.install_key).await?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&record)?);
        } else {
            match record {
                Some(r) => println!("Installed at {}", format_ms(r.timestamp)),
                None => println!("{}", "Not installed yet".yellow()),
            }
        }
        return Ok(());
    }
    if cli.status {
        print_status(&state, &db_path).await?;
        return Ok(());
    }

    let Some(url) = cli.url.as_deref() else {
        eprintln!("{}", "Please provide a page URL".red());
        std::process::exit(1);
    };
    lookup(&state, url, cli.json).await
}

async fn serve(db_conn: tokio_rusqlite::Connection, config: Config) -> anyhow::Result<()> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let host: Arc<dyn BrowserHost> = Arc::new(ChannelHost::new(tx.clone()));
    let state = AppState::new(db_conn, config, host)?;
    let writer = tokio::spawn(events::write_events(rx, tokio::io::stdout()));

    if let Err(e) = install_notice(
        state.store.as_ref(),
        state.clock.as_ref(),
        state.host.as_ref(),
        &state.api,
        &state.config.install_key,
    )
    .await
    {
        tracing::warn!(error = %e, "install notice failed");
    }

    let input = tokio::io::BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = events::serve(state, input, tx) => {
            let handled = result?;
            tracing::info!(handled, "input closed");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, shutting down");
            return Ok(());
        }
    }

    // Every sender is gone once the event loop returns
    writer.await??;
    Ok(())
}

async fn lookup(state: &AppState, url: &str, json: bool) -> anyhow::Result<()> {
    if !allow_action_by_url(url) {
        eprintln!("{}", format!("✘ Not a scorable page: {}", url).red());
        std::process::exit(1);
    }
    let Some(domain) = domain_by_url(url) else {
        eprintln!("{}", format!("✘ No hostname in: {}", url).red());
        std::process::exit(1);
    };

    let outcome = state.fetcher.fetch(&domain).await;
    let origin = outcome.origin();
    let failure = match &outcome {
        FetchOutcome::Error(e) => Some(e.to_string()),
        _ => None,
    };
    let report = outcome.into_report();
    let icon = IconRenderer::state_for(report.as_ref());

    if json {
        let body = serde_json::json!({
            "domain": domain,
            "report": report,
            "icon": icon,
            "paths": state.renderer.paths_for(&icon),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let source = match origin {
        Some(ReportOrigin::Cache) => "[cache]",
        Some(ReportOrigin::Network) => "[online]",
        None => "",
    };
    println!("{} {}", domain.bold().underline(), source.cyan());
    match (&report, icon.label()) {
        (Some(report), Some(label)) => {
            println!("  Score: {} ({} reports)", label.bold(), report.count)
        }
        (Some(_), None) => println!("  {}", "No score reported".yellow()),
        (None, _) => match failure {
            Some(e) => println!("  {}", format!("Lookup failed: {}", e).red()),
            None => println!("  {}", "No report".yellow()),
        },
    }
    Ok(())
}

/// Initialize logging with path and level configuration
fn init_logging(logging: &infrastructure::config::Logging) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    let level = match logging.level.as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARN" => "warn",
        "ERROR" => "error",
        _ => "warn",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Some(path) = &logging.path {
        if !path.is_empty() {
            // Log to file
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .init();
            return Ok(());
        }
    }

    // stdout carries the event protocol
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn format_ms(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}

async fn print_status(state: &AppState, db_path: &std::path::Path) -> anyhow::Result<()> {
    println!("{}", "scorelens Status".green().bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!(
        "Database: {} ({} cached domains)",
        db_path.display(),
        state.cache.domain_count().await?
    );
    println!(
        "Sync storage: {} keys",
        state.store.count(StorageArea::Sync).await?
    );

    match install_record(state.store.as_ref(), &state.config.install_key).await? {
        Some(r) => println!("Installed: {}", format_ms(r.timestamp)),
        None => println!("Installed: no"),
    }

    println!(
        "Config: {}",
        infrastructure::config::get_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "Not found".to_string())
    );
    println!("API: {}", state.config.api_base);
    println!("Cache TTL: {} minutes", state.config.cache_ttl_minutes);

    Ok(())
}
