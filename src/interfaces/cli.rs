use clap::Parser;

#[derive(Parser)]
#[command(name = "scorelens")]
#[command(about = "Reputation score lookups for the sites you visit.")]
#[command(version)]
pub struct Cli {
    /// Run as the background process, reading browser events from stdin
    #[arg(long)]
    pub serve: bool,

    /// Drop the cached report for a domain
    #[arg(long, value_name = "DOMAIN")]
    pub bust: Option<String>,

    /// Print the install record
    #[arg(long)]
    pub installed: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Generate config sample
    #[arg(long)]
    pub generate_config: bool,

    /// Show status
    #[arg(long)]
    pub status: bool,

    /// Page URL to look up
    pub url: Option<String>,
}
