//! Inventory aggregation over monthly extracts.
//!
//! ```text
//! <dir>/2025.01.csv ─┐   chunk ─▶ brand/category filter ─▶ classify ─▶ channel filter
//! <dir>/2025.02.csv ─┼─▶   │                                               │
//! ...                ┘     └──────────── running sums per AggregationKey ◀─┘
//! ```
//!
//! Each file is aggregated on its own and merged into the run total only when
//! it was read completely, so a file that fails halfway contributes nothing.

use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

use crate::config::Config;
use crate::error::{InventoryError, InventoryResult};
use crate::logs::{log_error, log_info, log_success, log_warning, log_warning_indent};
use crate::models::{
    AggregationKey, Channel, ChannelGroup, InventoryRecord, ItemTab, OperationGroup, YearMonth,
};
use crate::parser::{open_inventory_file, InventoryChunks};

use super::classifier::determine_operation_group;

/// Running inventory sums plus the diagnostics collected while reading.
#[derive(Debug, Clone, Default)]
pub struct InventoryAggregation {
    sums: HashMap<AggregationKey, f64>,
    /// Minor categories outside the recognized set.
    pub unexpected_categories: BTreeSet<String>,
    /// Months whose file was read completely.
    pub months_read: Vec<YearMonth>,
    /// Months whose file was missing or failed.
    pub months_skipped: Vec<YearMonth>,
    /// Rows that contributed to at least one sum.
    pub rows_retained: usize,
}

impl InventoryAggregation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to the running sum of `key`.
    pub fn add(&mut self, key: AggregationKey, amount: f64) {
        *self.sums.entry(key).or_insert(0.0) += amount;
    }

    /// Sum for `key`, zero when nothing was accumulated.
    pub fn get(&self, key: &AggregationKey) -> f64 {
        self.sums.get(key).copied().unwrap_or(0.0)
    }

    /// Sum for the given coordinates, zero when nothing was accumulated.
    pub fn amount(
        &self,
        brand: &str,
        item_tab: &ItemTab,
        month: YearMonth,
        channel_group: ChannelGroup,
        operation_group: OperationGroup,
    ) -> f64 {
        self.get(&AggregationKey::new(
            brand,
            item_tab.clone(),
            month,
            channel_group,
            operation_group,
        ))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.sums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }

    /// Merge another aggregation into this one.
    pub fn absorb(&mut self, other: InventoryAggregation) {
        for (key, amount) in other.sums {
            self.add(key, amount);
        }
        self.unexpected_categories.extend(other.unexpected_categories);
        self.months_read.extend(other.months_read);
        self.months_skipped.extend(other.months_skipped);
        self.rows_retained += other.rows_retained;
    }

    /// Filter, classify and accumulate one chunk of rows.
    pub fn accumulate_chunk(&mut self, chunk: &[InventoryRecord], month: YearMonth, config: &Config) {
        let rows: Vec<&InventoryRecord> = chunk
            .iter()
            .filter(|r| config.brands.contains(&r.brand) && r.major_category == config.target_category)
            .collect();
        if rows.is_empty() {
            return;
        }

        for category in rows.iter().filter_map(|r| r.minor_category()) {
            if !config.is_item_category(category) && !self.unexpected_categories.contains(category) {
                self.unexpected_categories.insert(category.to_string());
            }
        }

        for record in rows {
            self.accumulate_record(record, month, config);
        }
    }

    /// Accumulate a row that already passed the brand/category filter.
    /// Rows from channels outside FRS/HQ/OR are dropped.
    fn accumulate_record(&mut self, record: &InventoryRecord, month: YearMonth, config: &Config) {
        let operation_group =
            determine_operation_group(&record.operation_basis, &record.season, &config.core_seasons);

        let Some(channel) = Channel::from_label(&record.channel) else {
            return;
        };

        let amount = record.amount_or_zero();
        let mut item_tabs = vec![ItemTab::All];
        if let Some(category) = record.minor_category().filter(|c| config.is_item_category(c)) {
            item_tabs.push(ItemTab::Category(category.to_string()));
        }

        for item_tab in item_tabs {
            for channel_group in [ChannelGroup::All, channel.group()] {
                let key = AggregationKey::new(
                    record.brand.as_str(),
                    item_tab.clone(),
                    month,
                    channel_group,
                    operation_group,
                );
                self.add(key, amount);
            }
        }

        self.rows_retained += 1;
    }
}

/// Aggregate every chunk of an extract read from `reader`.
pub fn aggregate_reader<R: Read>(
    reader: R,
    month: YearMonth,
    config: &Config,
) -> InventoryResult<InventoryAggregation> {
    aggregate_chunks(InventoryChunks::new(reader, config.chunk_size)?, month, config)
}

/// Aggregate one monthly extract.
pub fn aggregate_file(path: &Path, month: YearMonth, config: &Config) -> InventoryResult<InventoryAggregation> {
    let file = open_inventory_file(path, config.chunk_size)?;
    if file.encoding != encoding_rs::UTF_8 {
        log_info(format!("Decoding {} as {}", path.display(), file.encoding.name()));
    }
    aggregate_chunks(file.chunks, month, config)
}

fn aggregate_chunks<R: Read>(
    mut chunks: InventoryChunks<R>,
    month: YearMonth,
    config: &Config,
) -> InventoryResult<InventoryAggregation> {
    let mut aggregation = InventoryAggregation::new();
    for chunk in chunks.by_ref() {
        aggregation.accumulate_chunk(&chunk?, month, config);
    }
    aggregation.months_read.push(month);

    log_success(format!(
        "{}: {} rows read, {} retained",
        month,
        chunks.rows_read(),
        aggregation.rows_retained
    ));
    Ok(aggregation)
}

/// Aggregate `<dir>/<YYYY.MM>.csv` for every month.
///
/// Missing and unreadable files are logged and skipped; the run always
/// completes with whatever could be read.
pub fn aggregate_inventory(dir: &Path, months: &[YearMonth], config: &Config) -> InventoryAggregation {
    let mut total = InventoryAggregation::new();

    for &month in months {
        let path = dir.join(month.file_name());
        if !path.exists() {
            log_warning(format!("File not found: {}", path.display()));
            total.months_skipped.push(month);
            continue;
        }

        log_info(format!("📄 Processing: {}", path.display()));
        match aggregate_file(&path, month, config) {
            Ok(aggregation) => total.absorb(aggregation),
            Err(e) => {
                log_error(format!("{}: {}", path.display(), e));
                if let InventoryError::Csv(_) = e {
                    log_warning_indent("file skipped, no rows from it were counted", 1);
                }
                total.months_skipped.push(month);
            }
        }
    }

    total
}
