//! Export the collection report as CSV on stdout
//!
//! # Usage
//! ```bash
//! export_collections [--from YYYY-MM-DD] [--to YYYY-MM-DD] [--account ACCOUNT_ID] > collections.csv
//! ```
//!
//! Dates are widened to whole months; both default to the current month.

use std::io::Write;

use chrono::{NaiveDate, Utc};
use clap::Parser;
use rent_ledger::cli;
use rent_ledger::services::report_service;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "export_collections", about = "Export collected rent and daily collections as CSV")]
struct Args {
    #[arg(long, value_parser = cli::parse_date)]
    from: Option<NaiveDate>,

    #[arg(long, value_parser = cli::parse_date)]
    to: Option<NaiveDate>,

    /// Only rows collected into this account
    #[arg(long)]
    account: Option<Uuid>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    cli::init_tracing();

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), String> {
    let pool = cli::connect().await?;
    let today = Utc::now().date_naive();

    let csv = report_service::export_csv(&pool, args.from, args.to, args.account, today)
        .await
        .map_err(|e| format!("Export failed: {}", e))?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&csv)
        .and_then(|_| stdout.flush())
        .map_err(|e| format!("Failed to write CSV: {}", e))
}
