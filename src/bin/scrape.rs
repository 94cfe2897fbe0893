//! One-off scrape from the command line: runs a single chain and prints the headlines.
//!
//! ```sh
//! headline-scrape --site bbc.com
//! headline-scrape --site theguardian.com --classify
//! headline-scrape --site wsj.com --webhook https://hooks.slack.com/... --format plain
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use headline_relay::config::AppConfig;
use headline_relay::notify::NotifyFormat;
use headline_relay::sites::derive_site_id;
use headline_relay::{build_pipeline, PipelineContext};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Site identifier or homepage URL (e.g. `bbc.com`, `https://wsj.com/`)
    #[arg(short, long)]
    site: Option<String>,

    /// Label each headline fact/opinion before printing
    #[arg(long)]
    classify: bool,

    /// Classifier model file
    #[arg(long, env = "HEADLINES_MODEL_PATH")]
    model: Option<PathBuf>,

    /// Deliver the summary to this webhook as well
    #[arg(long)]
    webhook: Option<String>,

    /// Webhook message shape: `blocks` or `plain`
    #[arg(long)]
    format: Option<NotifyFormat>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut cfg = AppConfig::load_default().context("loading configuration")?;
    cfg.classifier.enabled = cli.classify || (cli.webhook.is_some() && cfg.classifier.enabled);
    if let Some(model) = cli.model {
        cfg.classifier.model_path = model;
    }
    if let Some(format) = cli.format {
        cfg.notify.format = format;
    }
    // The CLI never persists unless a database is configured explicitly.
    let pipeline = build_pipeline(&cfg).await?;

    let site = derive_site_id(cli.site.as_deref(), &cfg.server.default_site);
    let mut report = pipeline
        .run(PipelineContext::new(site, cli.webhook))
        .await?;

    // Without a webhook the chain stops after extraction; label here instead.
    if report.context.callback_url.is_none() {
        if let Some(classifier) = pipeline.classifier() {
            report.classification_skipped = classifier.classify_all(&mut report.context.headlines);
        }
    }

    println!("{}", serde_json::to_string_pretty(&report.context.headlines)?);
    if let Some(delivery) = report.delivery {
        eprintln!("delivery: {delivery:?}");
    }
    Ok(())
}
