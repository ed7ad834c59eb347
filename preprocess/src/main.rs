//! Accweek CLI - build the accessory inventory summary
//!
//! ```bash
//! accweek-preprocess                          # Full run over the analysis months
//! accweek-preprocess --merge 2025.11          # Recompute one month into the existing report
//! accweek-preprocess --merge 2025.11 2025.12  # Several months at once
//! ```
//!
//! Paths, months and chunk size come from the environment or `.env`
//! (see `accweek::config`).

use accweek::logs::LOGGER;
use accweek::{run_full, run_merge, Config, RunSummary, YearMonth};
use clap::Parser;

#[derive(Parser)]
#[command(name = "accweek-preprocess")]
#[command(about = "Aggregate accessory inventory extracts into the dashboard summary", long_about = None)]
struct Cli {
    /// Recompute only these months and merge them into the existing report
    #[arg(long, num_args = 1.., value_name = "YYYY.MM")]
    merge: Option<Vec<YearMonth>>,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let summary = match cli.merge {
        Some(months) => {
            print_banner("Inventory merge");
            println!("   Months: {}", format_months(&months));
            println!("   Source: {}", config.merge_inventory_dir.display());
            run_merge(&config, &months)?
        }
        None => {
            print_banner("Inventory preprocessing");
            println!("   Months: {} → {}", first_or_dash(&config.months), last_or_dash(&config.months));
            println!("   Source: {}", config.inventory_dir.display());
            run_full(&config)?
        }
    };

    print_summary(&summary);
    Ok(())
}

fn print_banner(title: &str) {
    println!("{}", "=".repeat(60));
    println!("📊 {}", title);
    println!("{}", "=".repeat(60));
}

fn print_summary(summary: &RunSummary) {
    println!("\n📋 Summary:");
    println!("   Months read: {}/{}", summary.months_read.len(), summary.months.len());
    if !summary.months_skipped.is_empty() {
        println!("   ⚠️  Skipped: {}", format_months(&summary.months_skipped));
    }
    println!("   OR sales keys: {}", summary.sales_keys);
    println!("   Inventory keys: {}", summary.inventory_keys);
    if !summary.unexpected_categories.is_empty() {
        println!("   ⚠️  Unexpected categories: {}", summary.unexpected_categories.join(", "));
    }

    let logs = LOGGER.summary();
    if logs.warnings > 0 || logs.errors > 0 {
        println!("   {} warning(s), {} error(s)", logs.warnings, logs.errors);
    }

    println!("\n✨ Done! {}", summary.output_path.display());
}

fn format_months(months: &[YearMonth]) -> String {
    months.iter().map(|m| m.to_string()).collect::<Vec<_>>().join(", ")
}

fn first_or_dash(months: &[YearMonth]) -> String {
    months.iter().min().map_or_else(|| "-".to_string(), |m| m.to_string())
}

fn last_or_dash(months: &[YearMonth]) -> String {
    months.iter().max().map_or_else(|| "-".to_string(), |m| m.to_string())
}
