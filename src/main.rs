use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use url::Url;

use dealwatch::extract::ExtractionRules;
use dealwatch::navigator::{WebDriverNavigator, WebDriverOptions};
use dealwatch::notify::{LogNotifier, Notifier, TelegramNotifier, TelegramOptions};
use dealwatch::store::{MemoryStore, PostgresStore, SeenStore};
use dealwatch::{Config, Pipeline, RunError, RunSummary, Selectors, logging};

#[derive(Parser)]
#[command(name = "dealwatch")]
#[command(about = "Crawl a marketplace search once and announce new listings")]
#[command(version)]
struct Cli {
    /// Keep seen links in memory and log messages instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Override SEARCH_URL
    #[arg(long)]
    search_url: Option<Url>,

    /// Override MAX_MATCHES
    #[arg(long)]
    max_matches: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&Config::error_log_path_from_env()) {
        eprintln!("{e:#}");
        return ExitCode::from(1);
    }

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Configuration error");
            return ExitCode::from(1);
        }
    };
    if let Some(url) = cli.search_url {
        config.crawl.search_url = url;
    }
    if let Some(max) = cli.max_matches {
        config.crawl.max_matches = max;
    }
    config.log_summary();

    let code = match run(&config, cli.dry_run).await {
        Ok(summary) => {
            info!(?summary, "Run complete");
            0
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Fatal error");
            e.downcast_ref::<RunError>()
                .map(RunError::exit_code)
                .unwrap_or(1)
        }
    };

    // Let in-flight log writes and connections settle before exiting.
    tokio::time::sleep(config.exit_delay).await;
    ExitCode::from(code)
}

async fn run(config: &Config, dry_run: bool) -> Result<RunSummary> {
    let (store, notifier): (Arc<dyn SeenStore>, Arc<dyn Notifier>) = if dry_run {
        info!("Dry run: in-memory store, messages are logged only");
        (Arc::new(MemoryStore::new()), Arc::new(LogNotifier))
    } else {
        let (bot_token, chat_id) = config.require_telegram()?;
        let notifier = TelegramNotifier::new(TelegramOptions {
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
            min_interval: config.telegram_min_interval,
        })
        .context("Failed to build Telegram client")?;

        let store = PostgresStore::connect(config.require_database_url()?)
            .await
            .map_err(RunError::StoreUnavailable)?;

        (Arc::new(store), Arc::new(notifier))
    };

    let rules = ExtractionRules::new(
        Selectors::default(),
        config.undesirable_keywords.clone(),
        config.crawl.search_url.clone(),
    );

    let options = WebDriverOptions {
        server_url: config.webdriver_url.clone(),
        ..WebDriverOptions::default()
    };

    let pipeline = Pipeline::new(config.crawl.clone(), rules, store, notifier);
    Ok(pipeline
        .launch_and_run(|| WebDriverNavigator::launch(&options))
        .await?)
}
