//! Assembly of the nested summary report.
//!
//! Every (brand, item tab, month) cell of the configured cross-product gets
//! the same eight metrics, missing sums counting as zero:
//!
//! | Metric            | Source                                    |
//! |-------------------|-------------------------------------------|
//! | `전체_{op}`        | inventory, every retained channel         |
//! | `FRS_{op}`        | inventory, FRS channel                    |
//! | `HQ_OR_{op}`      | inventory, HQ and OR channels             |
//! | `OR_sales_{op}`   | OR sales from the sales summary           |
//!
//! with `{op}` being `core` or `outlet`.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::ReportResult;
use crate::models::{ChannelGroup, InventoryReport, ItemTab, MonthMetrics, OperationGroup, YearMonth};
use crate::sales::SalesFigures;

use super::aggregator::InventoryAggregation;

/// Name of an inventory metric, e.g. `HQ_OR_core`.
pub fn inventory_metric(channel_group: ChannelGroup, operation_group: OperationGroup) -> String {
    format!("{}_{}", channel_group.label(), operation_group)
}

/// Name of an OR sales metric, e.g. `OR_sales_outlet`.
pub fn sales_metric(operation_group: OperationGroup) -> String {
    format!("OR_sales_{}", operation_group)
}

/// Round half to even, matching the reporting layer's historical figures.
pub fn round_amount(amount: f64) -> i64 {
    amount.round_ties_even() as i64
}

/// Metrics cell for one brand, item tab and month.
pub fn month_metrics(
    inventory: &InventoryAggregation,
    sales: &SalesFigures,
    brand: &str,
    item_tab: &ItemTab,
    month: YearMonth,
) -> MonthMetrics {
    let mut metrics = MonthMetrics::new();
    for operation_group in OperationGroup::ALL {
        for channel_group in ChannelGroup::ALL {
            let amount = inventory.amount(brand, item_tab, month, channel_group, operation_group);
            metrics.insert(
                inventory_metric(channel_group, operation_group),
                Value::from(round_amount(amount)),
            );
        }
        let amount = sales.amount(brand, item_tab, month, operation_group);
        metrics.insert(sales_metric(operation_group), Value::from(round_amount(amount)));
    }
    metrics
}

/// Day count of every month, keyed by `YYYY.MM`.
pub fn days_in_month_table(months: &[YearMonth]) -> BTreeMap<String, u32> {
    months
        .iter()
        .map(|m| (m.to_string(), m.days_in_month()))
        .collect()
}

/// Build the full report over the configured brands, item tabs and months.
pub fn build_report(inventory: &InventoryAggregation, sales: &SalesFigures, config: &Config) -> InventoryReport {
    let mut months = config.months.clone();
    months.sort();
    months.dedup();

    let mut report = InventoryReport {
        unexpected_categories: inventory.unexpected_categories.iter().cloned().collect(),
        months: months.iter().map(|m| m.to_string()).collect(),
        days_in_month: days_in_month_table(&months),
        ..InventoryReport::default()
    };

    for brand in &config.brands {
        let tabs = report.brands.entry(brand.clone()).or_default();
        for item_tab in config.item_tabs() {
            let cells = tabs.entry(item_tab.label().to_string()).or_default();
            for &month in &months {
                cells.insert(month.to_string(), month_metrics(inventory, sales, brand, &item_tab, month));
            }
        }
    }

    report
}

/// Overwrite the cells of `months` in an existing report.
///
/// Cells of other months are left untouched. New months are added to the
/// month list, which stays sorted, and newly seen unexpected categories are
/// added to the existing ones.
pub fn merge_months(
    report: &mut InventoryReport,
    months: &[YearMonth],
    inventory: &InventoryAggregation,
    sales: &SalesFigures,
    config: &Config,
) {
    let item_tabs = config.item_tabs();

    for &month in months {
        let label = month.to_string();
        report.days_in_month.insert(label.clone(), month.days_in_month());

        for brand in &config.brands {
            let tabs = report.brands.entry(brand.clone()).or_default();
            for item_tab in &item_tabs {
                tabs.entry(item_tab.label().to_string())
                    .or_default()
                    .insert(label.clone(), month_metrics(inventory, sales, brand, item_tab, month));
            }
        }

        if !report.months.contains(&label) {
            report.months.push(label);
        }
    }
    report.months.sort();
    report.months.dedup();

    report
        .unexpected_categories
        .extend(inventory.unexpected_categories.iter().cloned());
    report.unexpected_categories.sort();
    report.unexpected_categories.dedup();
}

impl InventoryReport {
    /// Read a report written by a previous run.
    pub fn load(path: &Path) -> ReportResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Pretty-printed JSON (two-space indent, non-ASCII kept verbatim).
    pub fn to_json_pretty(&self) -> ReportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> ReportResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregationKey, SalesKey};

    fn month(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    fn small_config() -> Config {
        Config {
            months: vec![month("2024.02"), month("2024.01")],
            ..Config::default()
        }
    }

    fn sample_inventory() -> InventoryAggregation {
        let mut inventory = InventoryAggregation::new();
        let shoes = ItemTab::Category("Shoes".into());
        inventory.add(
            AggregationKey::new("MLB", shoes.clone(), month("2024.01"), ChannelGroup::All, OperationGroup::Core),
            100.5,
        );
        inventory.add(
            AggregationKey::new("MLB", shoes, month("2024.01"), ChannelGroup::Frs, OperationGroup::Core),
            101.5,
        );
        inventory.unexpected_categories.insert("Socks".into());
        inventory
    }

    fn sample_sales() -> SalesFigures {
        let mut sales = SalesFigures::new();
        sales.insert(SalesKey::new("MLB", ItemTab::All, month("2024.02"), OperationGroup::Outlet), 77.0);
        sales
    }

    #[test]
    fn test_round_half_to_even() {
        assert_eq!(round_amount(100.5), 100);
        assert_eq!(round_amount(101.5), 102);
        assert_eq!(round_amount(2.4999), 2);
        assert_eq!(round_amount(0.0), 0);
    }

    #[test]
    fn test_metric_names() {
        assert_eq!(inventory_metric(ChannelGroup::All, OperationGroup::Core), "전체_core");
        assert_eq!(inventory_metric(ChannelGroup::HqOr, OperationGroup::Outlet), "HQ_OR_outlet");
        assert_eq!(sales_metric(OperationGroup::Core), "OR_sales_core");
    }

    #[test]
    fn test_build_report_cross_product() {
        let report = build_report(&sample_inventory(), &sample_sales(), &small_config());

        assert_eq!(report.months, vec!["2024.01", "2024.02"]);
        assert_eq!(report.days_in_month["2024.02"], 29);
        assert_eq!(report.unexpected_categories, vec!["Socks"]);
        assert_eq!(report.brands.len(), 3);
        for tabs in report.brands.values() {
            assert_eq!(tabs.len(), 5);
            for cells in tabs.values() {
                assert_eq!(cells.len(), 2);
                for metrics in cells.values() {
                    assert_eq!(metrics.len(), 8);
                }
            }
        }

        let cell = report.cell("MLB", "Shoes", "2024.01").unwrap();
        assert_eq!(cell["전체_core"], 100);
        assert_eq!(cell["FRS_core"], 102);
        assert_eq!(cell["HQ_OR_core"], 0);
        assert_eq!(cell["OR_sales_core"], 0);

        let cell = report.cell("MLB", "전체", "2024.02").unwrap();
        assert_eq!(cell["OR_sales_outlet"], 77);
    }

    #[test]
    fn test_serialization_is_stable() {
        let config = small_config();
        let a = build_report(&sample_inventory(), &sample_sales(), &config).to_json_pretty().unwrap();
        let b = build_report(&sample_inventory(), &sample_sales(), &config).to_json_pretty().unwrap();
        assert_eq!(a, b);
        assert!(a.contains("\"unexpectedCategories\""));
        assert!(a.contains("\"daysInMonth\""));
        assert!(a.contains("전체_core"));
    }

    #[test]
    fn test_merge_overwrites_only_requested_months() {
        let config = small_config();
        let mut report = build_report(&sample_inventory(), &sample_sales(), &config);
        let before_jan = report.cell("MLB", "Shoes", "2024.01").cloned();

        let mut update = InventoryAggregation::new();
        update.add(
            AggregationKey::new("MLB", ItemTab::All, month("2024.03"), ChannelGroup::HqOr, OperationGroup::Outlet),
            9.0,
        );
        update.unexpected_categories.insert("Belt".into());
        merge_months(&mut report, &[month("2024.03")], &update, &SalesFigures::new(), &config);

        assert_eq!(report.months, vec!["2024.01", "2024.02", "2024.03"]);
        assert_eq!(report.days_in_month["2024.03"], 31);
        assert_eq!(report.cell("MLB", "Shoes", "2024.01").cloned(), before_jan);
        assert_eq!(report.cell("MLB", "전체", "2024.03").unwrap()["HQ_OR_outlet"], 9);
        assert_eq!(report.unexpected_categories, vec!["Belt", "Socks"]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("summary.json");
        let report = build_report(&sample_inventory(), &sample_sales(), &small_config());

        report.save(&path).unwrap();
        let loaded = InventoryReport::load(&path).unwrap();
        assert_eq!(loaded, report);
    }
}
