//! Transformation module.
//!
//! This module turns monthly extracts into the summary report:
//! - Classifier: core / outlet rule
//! - Aggregator: chunked, filtered inventory sums
//! - Report: nested report assembly and month merging
//! - Pipeline: full and merge runs

pub mod aggregator;
pub mod classifier;
pub mod pipeline;
pub mod report;

pub use aggregator::{aggregate_file, aggregate_inventory, aggregate_reader, InventoryAggregation};
pub use classifier::determine_operation_group;
pub use pipeline::*;
pub use report::{build_report, days_in_month_table, merge_months, month_metrics};
