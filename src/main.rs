// src/main.rs
use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode};
use log::{error, info, warn};
use ord_spider_rs::config::{Browser, CrawlConfig, SessionConfig, ORD_URL};
use ord_spider_rs::crawl::Crawler;
use ord_spider_rs::selectors::Selectors;
use ord_spider_rs::sink::CsvSink;
use ord_spider_rs::spider::Spider;
use std::path::PathBuf;
use std::time::Duration;

/// Crawl the Open Reaction Database and dump every reaction field to CSV.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Run the browser without a window (also enabled by HEADLESS=true).
    #[arg(long)]
    headless: bool,

    /// Seconds to wait for any element or page state.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    #[arg(long, short, default_value = "scraped_data.csv")]
    output: PathBuf,

    #[arg(long, default_value = "http://localhost:4444")]
    webdriver: String,

    #[arg(long, value_enum, default_value_t = Browser::Chrome)]
    browser: Browser,

    #[arg(long, default_value = ORD_URL)]
    base_url: String,

    /// Only crawl the first N datasets.
    #[arg(long)]
    limit: Option<usize>,

    /// Milliseconds to let the page re-render after clicks and scrolls.
    #[arg(long, default_value_t = 500)]
    settle_ms: u64,

    /// JSON file overriding the built-in locators.
    #[arg(long)]
    selectors: Option<PathBuf>,

    /// Keep the browser open after the crawl until `q` is pressed.
    #[arg(long)]
    hold: bool,
}

fn headless_from_env() -> bool {
    std::env::var("HEADLESS")
        .unwrap_or_else(|_| "false".to_string())
        .to_lowercase()
        == "true"
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let selectors = match &cli.selectors {
        Some(path) => Selectors::from_json_file(path)
            .with_context(|| format!("Could not load selectors from {}", path.display()))?,
        None => Selectors::default(),
    };

    let session = SessionConfig {
        webdriver_url: cli.webdriver.clone(),
        browser: cli.browser,
        headless: cli.headless || headless_from_env(),
    };
    let config = CrawlConfig {
        base_url: cli.base_url.clone(),
        timeout: Duration::from_secs(cli.timeout),
        settle: Duration::from_millis(cli.settle_ms),
        limit: cli.limit,
        ..CrawlConfig::default()
    };

    let mut sink = CsvSink::new(&cli.output);
    if let Err(e) = sink.initialize() {
        error!("Could not initialize {}: {e}", cli.output.display());
    }

    let spider = Spider::new(&session, &config.base_url)
        .await
        .context("Could not start the browser session")?;

    let started = Local::now();
    let outcome = run(&spider, &mut sink, &selectors, &config).await;
    let elapsed = Local::now() - started;

    match &outcome {
        Ok(()) => info!(
            "Crawl finished in {}m {}s, output saved to {}",
            elapsed.num_minutes(),
            elapsed.num_seconds() % 60,
            sink.path().display()
        ),
        Err(e) => error!(
            "Crawl aborted after {}m {}s: {e:#}",
            elapsed.num_minutes(),
            elapsed.num_seconds() % 60
        ),
    }

    if cli.hold {
        hold_until_quit();
    }

    if let Err(e) = spider.quit().await {
        warn!("Could not close the browser session: {e}");
    }
    outcome
}

async fn run(
    spider: &Spider,
    sink: &mut CsvSink,
    selectors: &Selectors,
    config: &CrawlConfig,
) -> Result<()> {
    let crawler = Crawler::new(spider, sink, selectors, config)
        .await
        .context("Could not read the active browser window")?;
    let entries = crawler
        .snapshot_catalog()
        .await
        .context("Could not read the dataset catalog")?;
    let report = crawler.crawl(entries).await?;
    info!("Crawl summary:\n{report}");
    Ok(())
}

fn hold_until_quit() {
    println!("Browser kept open. Press q to quit.");
    loop {
        match event::read() {
            Ok(Event::Key(key)) if key.code == KeyCode::Char('q') => break,
            Ok(_) => {}
            Err(e) => {
                warn!("Could not read from the terminal: {e}");
                break;
            }
        }
    }
}
