//! Full and merge runs.
//!
//! # Example
//!
//! ```rust,ignore
//! use accweek::{run_full, Config};
//!
//! let config = Config::from_env()?;
//! let summary = run_full(&config)?;
//! println!("Wrote {}", summary.output_path.display());
//! ```

use std::path::PathBuf;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::logs::{log_info, log_success, log_warning};
use crate::models::{InventoryReport, YearMonth};
use crate::sales::load_sales_figures;

use super::aggregator::{aggregate_inventory, InventoryAggregation};
use super::report::{build_report, merge_months};

/// What a run read and wrote.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Report written by the run.
    pub output_path: PathBuf,
    /// Months the run covered.
    pub months: Vec<YearMonth>,
    /// Months whose extract was aggregated.
    pub months_read: Vec<YearMonth>,
    /// Months whose extract was missing or unreadable.
    pub months_skipped: Vec<YearMonth>,
    /// OR sales keys loaded.
    pub sales_keys: usize,
    /// Inventory keys accumulated.
    pub inventory_keys: usize,
    /// Unexpected minor categories seen during this run.
    pub unexpected_categories: Vec<String>,
}

impl RunSummary {
    fn new(output_path: PathBuf, months: Vec<YearMonth>, sales_keys: usize, inventory: &InventoryAggregation) -> Self {
        Self {
            output_path,
            months,
            months_read: inventory.months_read.clone(),
            months_skipped: inventory.months_skipped.clone(),
            sales_keys,
            inventory_keys: inventory.len(),
            unexpected_categories: inventory.unexpected_categories.iter().cloned().collect(),
        }
    }
}

/// Recompute the whole report for `config.months`.
pub fn run_full(config: &Config) -> PipelineResult<RunSummary> {
    let months = sorted_months(&config.months);

    log_info("💰 Loading OR sales...");
    let sales = load_sales_figures(&config.sales_json_path, &months, config)?;

    log_info("📦 Aggregating inventory...");
    let inventory = aggregate_inventory(&config.inventory_dir, &months, config);
    warn_unexpected(&inventory);

    log_info("🧮 Building report...");
    let report = build_report(&inventory, &sales, config);

    let output_path = config.output_file();
    report.save(&output_path)?;
    log_success(format!("Saved: {}", output_path.display()));

    Ok(RunSummary::new(output_path, months, sales.len(), &inventory))
}

/// Recompute `months` and splice them into the existing report.
///
/// Extracts are read from `config.merge_inventory_dir`. Months not listed
/// are neither read nor modified. Fails without writing anything when the
/// report does not exist yet.
pub fn run_merge(config: &Config, months: &[YearMonth]) -> PipelineResult<RunSummary> {
    let months = sorted_months(months);
    if months.is_empty() {
        return Err(PipelineError::NoMonths);
    }

    let output_path = config.output_file();
    if !output_path.exists() {
        return Err(PipelineError::MissingMergeTarget(output_path));
    }

    let mut report = InventoryReport::load(&output_path)?;
    log_success(format!("Loaded existing report: {}", output_path.display()));
    log_info(format!(
        "Merging {} from {}",
        join_months(&months),
        config.merge_inventory_dir.display()
    ));

    log_info("💰 Loading OR sales...");
    let sales = load_sales_figures(&config.sales_json_path, &months, config)?;

    log_info("📦 Aggregating inventory...");
    let inventory = aggregate_inventory(&config.merge_inventory_dir, &months, config);
    warn_unexpected(&inventory);

    merge_months(&mut report, &months, &inventory, &sales, config);
    report.save(&output_path)?;
    log_success(format!("Merged {} into {}", join_months(&months), output_path.display()));

    Ok(RunSummary::new(output_path, months, sales.len(), &inventory))
}

fn sorted_months(months: &[YearMonth]) -> Vec<YearMonth> {
    let mut months = months.to_vec();
    months.sort();
    months.dedup();
    months
}

fn join_months(months: &[YearMonth]) -> String {
    months.iter().map(|m| m.to_string()).collect::<Vec<_>>().join(", ")
}

fn warn_unexpected(inventory: &InventoryAggregation) {
    if !inventory.unexpected_categories.is_empty() {
        let categories: Vec<&str> = inventory.unexpected_categories.iter().map(String::as_str).collect();
        log_warning(format!("Unexpected minor categories: {}", categories.join(", ")));
    }
}
