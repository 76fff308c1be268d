use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use dxnet_scraping::api::{DxNetClient, Sweep};
use dxnet_scraping::schema::{ScoreDifficulty, ScoreIdx};
use dxnet_scraping_utils::fs_json_util::write_json;
use log::{info, warn};

#[derive(Parser)]
struct Opts {
    #[arg(long, default_value = "./ignore/cookie_store.json")]
    cookie_store_path: PathBuf,
    /// Pause between successive page fetches, in milliseconds.
    #[arg(long, default_value_t = 2000)]
    interval_ms: u64,
    /// Write the records to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape the recent-play list.
    Recent,
    /// Scrape the best-score pages.
    Best {
        /// Difficulties to sweep, e.g. `-d expert -d master` (default: all five).
        #[arg(short, long = "difficulty")]
        difficulties: Vec<ScoreDifficulty>,
    },
    /// Scrape the sort listings.
    Sorted {
        #[arg(short, long = "difficulty")]
        difficulties: Vec<ScoreDifficulty>,
    },
    /// Scrape one song's detail page.
    Detail { idx: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let opts = Opts::parse();
    let mut client = DxNetClient::new_intl(&opts.cookie_store_path)?;
    let interval = Duration::from_millis(opts.interval_ms);

    let records = match &opts.command {
        Command::Recent => {
            let extracted = client.scrape_recent_plays().await?;
            serde_json::to_value(&extracted.records)?
        }
        Command::Best { difficulties } => {
            let sweep = if difficulties.is_empty() {
                client.scrape_all_best(interval).await?
            } else {
                client.scrape_best(difficulties, interval).await?
            };
            report(&sweep);
            serde_json::to_value(&sweep.records)?
        }
        Command::Sorted { difficulties } => {
            let sweep = if difficulties.is_empty() {
                client.scrape_all_sorted(interval).await?
            } else {
                client.scrape_sorted(difficulties, interval).await?
            };
            report(&sweep);
            serde_json::to_value(&sweep.records)?
        }
        Command::Detail { idx } => {
            let record = client.scrape_song_detail(&ScoreIdx::from(idx.clone())).await?;
            serde_json::to_value(&record)?
        }
    };

    match &opts.output {
        Some(path) => {
            write_json(path, &records)?;
            info!("Saved the records to {path:?}.");
        }
        None => println!("{}", serde_json::to_string_pretty(&records)?),
    }
    Ok(())
}

fn report<T>(sweep: &Sweep<T>) {
    info!(
        "{} records in total ({} blocks skipped).",
        sweep.records.len(),
        sweep.skipped_blocks
    );
    if !sweep.failed.is_empty() {
        warn!("Some difficulties could not be retrieved: {:?}", sweep.failed);
    }
}
