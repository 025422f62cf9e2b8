//! Run one due generation pass
//!
//! Creates the current month's obligation for every active monthly tenant
//! whose anniversary has arrived. Safe to run repeatedly; a second pass on the
//! same day creates nothing.
//!
//! # Usage
//! ```bash
//! generate_dues [--date YYYY-MM-DD]
//! ```

use chrono::{NaiveDate, Utc};
use clap::Parser;
use rent_ledger::cli;
use rent_ledger::generate_due_entries;

#[derive(Parser, Debug)]
#[command(name = "generate_dues", about = "Generate the current month's rent dues")]
struct Args {
    /// Run as if today were this date (defaults to the UTC date)
    #[arg(long, value_parser = cli::parse_date)]
    date: Option<NaiveDate>,
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
    let today = args.date.unwrap_or_else(|| Utc::now().date_naive());

    let pool = cli::connect().await?;

    tracing::info!(today = %today, "Starting due generation pass");
    let report = generate_due_entries(&pool, today)
        .await
        .map_err(|e| format!("Due generation failed: {}", e))?;

    tracing::info!(
        examined = report.examined,
        created = report.created,
        already_present = report.already_present,
        cursors_advanced = report.cursors_advanced,
        "Due generation finished"
    );
    Ok(())
}
