//! Pipeline configuration.
//!
//! The defaults reproduce the production extract layout. Paths, months and
//! the chunk size can be overridden from the environment (or a `.env` file):
//!
//! | Variable               | Field                  |
//! |------------------------|------------------------|
//! | `INVENTORY_DATA_PATH`  | `inventory_dir`        |
//! | `MERGE_INVENTORY_PATH` | `merge_inventory_dir`  |
//! | `SALES_JSON_PATH`      | `sales_json_path`      |
//! | `OUTPUT_PATH`          | `output_dir`           |
//! | `ANALYSIS_MONTHS`      | `months` (comma list)  |
//! | `CHUNK_SIZE`           | `chunk_size`           |

use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::models::{ItemTab, YearMonth};

/// Rows deserialized per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 200_000;

/// File name of the summary report inside `output_dir`.
pub const OUTPUT_FILE_NAME: &str = "accessory_inventory_summary.json";

/// Settings shared by every pipeline stage.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `<YYYY.MM>.csv` extracts for full runs.
    pub inventory_dir: PathBuf,
    /// Directory holding extracts for merge runs.
    pub merge_inventory_dir: PathBuf,
    /// Sales summary produced by the sales preprocessing step.
    pub sales_json_path: PathBuf,
    /// Directory receiving the summary report.
    pub output_dir: PathBuf,
    /// Months covered by a full run.
    pub months: Vec<YearMonth>,
    /// Brands kept from the extracts.
    pub brands: BTreeSet<String>,
    /// Major category (`产品大分类`) kept from the extracts.
    pub target_category: String,
    /// Minor categories (`产品中分类`) with their own item tab, in display order.
    pub item_categories: Vec<String>,
    /// Season tags that make a row without operation basis "core".
    pub core_seasons: Vec<String>,
    /// Rows per chunk.
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        let months = match (YearMonth::new(2024, 1), YearMonth::new(2025, 11)) {
            (Ok(start), Ok(end)) => YearMonth::range_inclusive(start, end),
            _ => Vec::new(),
        };

        Self {
            inventory_dir: PathBuf::from("data/inventory"),
            merge_inventory_dir: PathBuf::from("data/inventory_update"),
            sales_json_path: PathBuf::from("public/data/accessory_sales_summary.json"),
            output_dir: PathBuf::from("public/data"),
            months,
            brands: ["MLB", "MLB KIDS", "DISCOVERY"].iter().map(|s| s.to_string()).collect(),
            target_category: "饰品".to_string(),
            item_categories: ["Shoes", "Headwear", "Bag", "Acc_etc"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            core_seasons: ["24FW", "25SS", "25FW", "26SS"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Config {
    /// Defaults overridden by environment variables.
    ///
    /// The binary loads `.env` into the environment before calling this.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from a lookup function (environment in production).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get("INVENTORY_DATA_PATH") {
            self.inventory_dir = PathBuf::from(path);
        }
        if let Some(path) = get("MERGE_INVENTORY_PATH") {
            self.merge_inventory_dir = PathBuf::from(path);
        }
        if let Some(path) = get("SALES_JSON_PATH") {
            self.sales_json_path = PathBuf::from(path);
        }
        if let Some(path) = get("OUTPUT_PATH") {
            self.output_dir = PathBuf::from(path);
        }
        if let Some(months) = get("ANALYSIS_MONTHS") {
            self.months = parse_month_list(&months)?;
        }
        if let Some(size) = get("CHUNK_SIZE") {
            self.chunk_size = match size.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "CHUNK_SIZE".to_string(),
                        message: format!("expected a positive integer, got '{}'", size),
                    })
                }
            };
        }

        Ok(self)
    }

    /// Path of the summary report.
    pub fn output_file(&self) -> PathBuf {
        self.output_dir.join(OUTPUT_FILE_NAME)
    }

    /// `전체` followed by every recognized category.
    pub fn item_tabs(&self) -> Vec<ItemTab> {
        std::iter::once(ItemTab::All)
            .chain(self.item_categories.iter().cloned().map(ItemTab::Category))
            .collect()
    }

    /// Whether a minor category has its own item tab.
    pub fn is_item_category(&self, category: &str) -> bool {
        self.item_categories.iter().any(|c| c == category)
    }
}

/// Parse `"2025.01, 2025.02"` into sorted, de-duplicated months.
pub fn parse_month_list(list: &str) -> Result<Vec<YearMonth>, ConfigError> {
    let mut months = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<Vec<YearMonth>, _>>()?;
    months.sort();
    months.dedup();
    Ok(months)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.months.len(), 23);
        assert_eq!(config.months[0].to_string(), "2024.01");
        assert_eq!(config.months[22].to_string(), "2025.11");
        assert_eq!(config.chunk_size, 200_000);
        assert!(config.brands.contains("MLB KIDS"));
        assert_eq!(config.output_file(), PathBuf::from("public/data/accessory_inventory_summary.json"));
    }

    #[test]
    fn test_item_tabs_order() {
        let labels: Vec<String> = Config::default()
            .item_tabs()
            .iter()
            .map(|t| t.label().to_string())
            .collect();
        assert_eq!(labels, vec!["전체", "Shoes", "Headwear", "Bag", "Acc_etc"]);
    }

    #[test]
    fn test_overrides() {
        let config = Config::default()
            .with_overrides(lookup_from(&[
                ("INVENTORY_DATA_PATH", "/srv/inventory"),
                ("ANALYSIS_MONTHS", "2025.02,2025.01, 2025.02"),
                ("CHUNK_SIZE", "5000"),
                ("OUTPUT_PATH", "   "),
            ]))
            .unwrap();

        assert_eq!(config.inventory_dir, PathBuf::from("/srv/inventory"));
        assert_eq!(config.chunk_size, 5000);
        assert_eq!(config.output_dir, PathBuf::from("public/data"));
        let months: Vec<String> = config.months.iter().map(|m| m.to_string()).collect();
        assert_eq!(months, vec!["2025.01", "2025.02"]);
    }

    #[test]
    fn test_invalid_overrides() {
        let err = Config::default()
            .with_overrides(lookup_from(&[("CHUNK_SIZE", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("CHUNK_SIZE"));

        let err = Config::default()
            .with_overrides(lookup_from(&[("ANALYSIS_MONTHS", "2025.01,2025/02")]))
            .unwrap_err();
        assert!(err.to_string().contains("2025/02"));
    }
}
