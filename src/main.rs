use anyhow::Result;
use clap::Parser;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use efund::batch::{BatchRunner, Progress};
use efund::config::Config;
use efund::downloader;
use efund::endpoint::EndpointClient;
use efund::fetcher::{holdings, quotes, rankings, BasicsFetcher};
use efund::models::Record;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "efund=info");
    }

    // Initialize logging to both console and file
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let file_appender = tracing_appender::rolling::never(".", "efund.log");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env()),
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    let client = EndpointClient::new(config.clone())?;

    // Process-wide interrupt: one handler, registered once, cancelling the
    // root token every runner's child token descends from.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, aborting in-flight tasks");
                cancel.cancel();
            }
        });
    }

    match &cli.command {
        Commands::History { code, page_size } => {
            let records = quotes::nav_history(&client, code, *page_size).await?;
            print_records(&records);
        }

        Commands::Estimate { codes } => {
            let records = quotes::realtime_estimates(&client, codes).await?;
            print_records(&records);
        }

        Commands::Basics { codes } => {
            let fetcher = Arc::new(BasicsFetcher::new(client.clone()));
            let progress = Arc::new(Progress::new(codes.len()));
            let printer = spawn_progress_printer(Arc::clone(&progress));

            let runner =
                BatchRunner::new(cancel.child_token()).with_concurrency(config.concurrency);
            let records = runner.run(codes, fetcher, Arc::clone(&progress)).await?;

            printer.abort();
            eprintln!();
            if cancel.is_cancelled() {
                warn!("batch cancelled, discarding partial results");
            } else {
                print_records(&records);
            }
        }

        Commands::Holdings { code, date } => {
            let dates = Commands::disclosure_dates(date);
            let records = holdings::stock_holdings(&client, code, &dates).await?;
            print_records(&records);
        }

        Commands::Allocation { code, date } => {
            let dates = Commands::disclosure_dates(date);
            let records = holdings::asset_allocation(&client, code, &dates).await?;
            print_records(&records);
        }

        Commands::Industries { code, date } => {
            let dates = Commands::disclosure_dates(date);
            let records = holdings::industry_distribution(&client, code, &dates).await?;
            print_records(&records);
        }

        Commands::Periods { code } => {
            let records = rankings::period_performance(&client, code).await?;
            print_records(&records);
        }

        Commands::PublicDates { code } => {
            let dates = holdings::disclosure_dates(&client, code).await?;
            println!("Found {} disclosure dates:", dates.len());
            for date in dates {
                println!("{}", date);
            }
        }

        Commands::List { kind } => {
            let kind = kind
                .as_deref()
                .map(Commands::parse_fund_kind)
                .transpose()?;
            let records = rankings::fund_listing(&client, kind).await?;
            print_records(&records);
        }

        Commands::Reports {
            code,
            max_count,
            output,
        } => {
            let dest_root = output.clone().unwrap_or_else(|| config.download_dir.clone());
            std::fs::create_dir_all(&dest_root)?;

            let listing = downloader::report_listing(&client, code).await?;
            if listing.is_empty() {
                info!("no reports available for fund {}", code);
                return Ok(());
            }

            let progress = Arc::new(Progress::new(listing.len().min(*max_count)));
            let printer = spawn_progress_printer(Arc::clone(&progress));

            let kept = downloader::download_reports(
                &client,
                code,
                &listing,
                *max_count,
                &dest_root,
                cancel.child_token(),
                Arc::clone(&progress),
            )
            .await?;

            printer.abort();
            eprintln!();
            if cancel.is_cancelled() {
                warn!("download cancelled, destination may hold a partial set");
            }
            info!(
                "kept {} report files under {}",
                kept,
                dest_root.join(code).display()
            );
        }
    }

    Ok(())
}

/// Renders batch progress on stderr while tasks complete.
fn spawn_progress_printer(progress: Arc<Progress>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(200));
        loop {
            ticker.tick().await;
            match progress.current() {
                Some(code) => eprint!(
                    "\rprocessed {}/{} ({})   ",
                    progress.completed(),
                    progress.total(),
                    code
                ),
                None => eprint!("\rprocessed {}/{}", progress.completed(), progress.total()),
            }
            if progress.is_finished() {
                break;
            }
        }
    })
}

fn print_records(records: &[Record]) {
    println!("Found {} records:", records.len());
    for record in records {
        let line = record
            .iter()
            .map(|(field, value)| format!("{}={}", field, format_value(value)))
            .collect::<Vec<_>>()
            .join("  ");
        println!("{}", line);
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
