//! # Accweek - accessory inventory preprocessing
//!
//! Accweek aggregates the monthly inventory-value extracts of the accessory
//! business into the JSON summary read by the weeks-of-cover dashboard.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ YYYY.MM.csv │────▶│   Parser    │────▶│ Aggregator  │────▶│   Report    │
//! │ (BOM/GBK)   │     │  (chunked)  │     │ (core/out.) │     │   (JSON)    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────▲──────┘
//!                                                                    │
//!                                        sales summary JSON ─────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use accweek::{run_full, Config};
//!
//! let config = Config::from_env()?;
//! let summary = run_full(&config)?;
//! println!("{} inventory keys", summary.inventory_keys);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Pipeline configuration
//! - [`models`] - Domain models (records, keys, report)
//! - [`parser`] - Encoding detection and chunked CSV reading
//! - [`sales`] - OR sales figures
//! - [`transform`] - Classification, aggregation, report assembly, runs
//! - [`logs`] - Console logging

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;

// Parsing
pub mod parser;

// Sales source
pub mod sales;

// Transformation
pub mod transform;

// =============================================================================
// Re-exports - Errors
// =============================================================================

pub use error::{
    ConfigError,
    InventoryError,
    PipelineError,
    ReportError,
    SalesError,
};

// =============================================================================
// Re-exports - Config & Models
// =============================================================================

pub use config::Config;

pub use models::{
    AggregationKey,
    Channel,
    ChannelGroup,
    InventoryRecord,
    InventoryReport,
    ItemTab,
    MonthMetrics,
    OperationGroup,
    SalesKey,
    YearMonth,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    detect_encoding,
    open_inventory_file,
    CsvError,
    InventoryChunks,
    TranscodingReader,
};

// =============================================================================
// Re-exports - Sales
// =============================================================================

pub use sales::{load_sales_figures, SalesFigures};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    aggregate_inventory,
    build_report,
    determine_operation_group,
    merge_months,
    run_full,
    run_merge,
    InventoryAggregation,
    RunSummary,
};
