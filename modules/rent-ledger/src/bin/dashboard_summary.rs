//! Print dashboard totals as JSON
//!
//! # Usage
//! ```bash
//! dashboard_summary [--from YYYY-MM-DD] [--to YYYY-MM-DD]
//! ```

use chrono::{NaiveDate, Utc};
use clap::Parser;
use rent_ledger::cli;
use rent_ledger::services::report_service;

#[derive(Parser, Debug)]
#[command(name = "dashboard_summary", about = "Print collection and due totals for a month range")]
struct Args {
    #[arg(long, value_parser = cli::parse_date)]
    from: Option<NaiveDate>,

    #[arg(long, value_parser = cli::parse_date)]
    to: Option<NaiveDate>,
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

    let summary = report_service::dashboard(&pool, args.from, args.to, today)
        .await
        .map_err(|e| format!("Dashboard failed: {}", e))?;

    let json = serde_json::to_string_pretty(&summary)
        .map_err(|e| format!("Failed to encode summary: {}", e))?;
    println!("{}", json);
    Ok(())
}
