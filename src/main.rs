use anyhow::Result;
use clap::Parser;
use fdscraper::{
    config::{parse_years, Config},
    fetch::{HttpSource, UrlTemplates},
    pipeline,
};
use reqwest::Client;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Download a year's financial disclosure index and filing PDFs"
)]
struct Args {
    /// Comma separated list of years
    #[arg(long, value_name = "2019", default_value = "2019")]
    years: String,
    /// YAML or JSON file overriding base_dir, archive_url and document_url
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fdscraper=debug"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();
    info!(?args, "startup");

    // ─── 2) config ───────────────────────────────────────────────────
    let config = Config::load(args.config.as_deref())?;
    info!(base_dir = %config.base_dir.display(), "saving under");

    let years = parse_years(&args.years);
    let Some((year, ignored)) = years.split_first() else {
        error!(years = %args.years, "no year given");
        return Ok(());
    };
    if !ignored.is_empty() {
        warn!(?ignored, "only the first listed year is processed");
    }

    // ─── 3) run the year ─────────────────────────────────────────────
    let source = HttpSource::new(Client::new(), UrlTemplates::from_config(&config));
    match pipeline::run_year(&source, year, &config.base_dir).await {
        Ok(report) => info!(
            year = %report.year,
            entries = report.entries,
            downloaded = report.downloads.downloaded,
            skipped = report.downloads.skipped,
            failed = report.downloads.failed,
            "year complete"
        ),
        Err(e) => error!(year = %year, error = ?e, "Uncaught exception"),
    }

    info!("all done");
    Ok(())
}
