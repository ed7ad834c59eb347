//! OR sales figures from the sales-summary JSON.
//!
//! The sales preprocessing step writes
//! `{"brands": {brand: {item_tab: {month: {"OR_core": n, "OR_outlet": n, ...}}}}}`
//! with amounts already in base currency units. Only the two OR fields are
//! read; brands, tabs and months missing from the file are skipped.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::{SalesError, SalesResult};
use crate::logs::{log_success, log_warning};
use crate::models::{ItemTab, OperationGroup, SalesKey, YearMonth};

/// Only the top level is typed; brand entries stay raw JSON so that
/// brands outside the configuration never have to fit the schema.
#[derive(Debug, Default, Deserialize)]
struct SalesSummary {
    #[serde(default)]
    brands: Map<String, Value>,
}

fn or_field(operation_group: OperationGroup) -> &'static str {
    match operation_group {
        OperationGroup::Core => "OR_core",
        OperationGroup::Outlet => "OR_outlet",
    }
}

/// OR amount of one month entry. Missing or null counts as zero; any other
/// non-numeric value is reported and counts as zero.
fn or_amount(entry: &Value, operation_group: OperationGroup, brand: &str, item_tab: &ItemTab, month: YearMonth) -> f64 {
    let field = or_field(operation_group);
    match entry.get(field) {
        None | Some(Value::Null) => 0.0,
        Some(value) => value.as_f64().unwrap_or_else(|| {
            log_warning(format!(
                "Non-numeric {} for {} / {} / {}: {}",
                field,
                brand,
                item_tab.label(),
                month,
                value
            ));
            0.0
        }),
    }
}

/// OR sales amount per [`SalesKey`].
#[derive(Debug, Clone, Default)]
pub struct SalesFigures {
    amounts: HashMap<SalesKey, f64>,
}

impl SalesFigures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: SalesKey, amount: f64) {
        self.amounts.insert(key, amount);
    }

    /// Amount for `key`, zero when the source had no figure.
    pub fn get(&self, key: &SalesKey) -> f64 {
        self.amounts.get(key).copied().unwrap_or(0.0)
    }

    pub fn amount(&self, brand: &str, item_tab: &ItemTab, month: YearMonth, operation_group: OperationGroup) -> f64 {
        self.get(&SalesKey::new(brand, item_tab.clone(), month, operation_group))
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }
}

/// Load OR sales for `months` from the sales-summary file.
///
/// A missing file is not an error: a warning is logged and every sales
/// figure defaults to zero.
pub fn load_sales_figures(path: &Path, months: &[YearMonth], config: &Config) -> SalesResult<SalesFigures> {
    if !path.exists() {
        log_warning(format!("Sales JSON not found: {}", path.display()));
        return Ok(SalesFigures::new());
    }

    let content = fs::read_to_string(path)?;
    let figures = parse_sales_figures(&content, months, config).map_err(|source| SalesError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    log_success(format!("{} OR sales keys loaded", figures.len()));
    Ok(figures)
}

/// Extract OR sales for `months` from sales-summary JSON text.
pub fn parse_sales_figures(
    content: &str,
    months: &[YearMonth],
    config: &Config,
) -> Result<SalesFigures, serde_json::Error> {
    let summary: SalesSummary = serde_json::from_str(content)?;
    let mut figures = SalesFigures::new();

    for brand in &config.brands {
        let Some(tabs) = summary.brands.get(brand) else {
            continue;
        };
        for item_tab in config.item_tabs() {
            let Some(by_month) = tabs.get(item_tab.label()) else {
                continue;
            };
            for &month in months {
                let Some(entry) = by_month.get(month.to_string()).filter(|v| v.is_object()) else {
                    continue;
                };
                for operation_group in OperationGroup::ALL {
                    let amount = or_amount(entry, operation_group, brand, &item_tab, month);
                    let key = SalesKey::new(brand.as_str(), item_tab.clone(), month, operation_group);
                    figures.insert(key, amount);
                }
            }
        }
    }

    Ok(figures)
}
