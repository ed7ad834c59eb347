//! Domain models for the inventory preprocessing pipeline.
//!
//! - [`InventoryRecord`] - one row of a monthly inventory extract
//! - [`YearMonth`] - a `YYYY.MM` reporting month
//! - [`OperationGroup`] - core / outlet classification
//! - [`Channel`] / [`ChannelGroup`] - point-of-sale channel and its bucket
//! - [`ItemTab`] - reporting dimension (all items or one minor category)
//! - [`AggregationKey`] / [`SalesKey`] - accumulation keys
//! - [`InventoryReport`] - the JSON summary artifact

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Label used for the "all" item tab and the "all" channel group.
pub const TOTAL_LABEL: &str = "전체";

// =============================================================================
// Inventory Record
// =============================================================================

/// Header names of the seven columns read from each extract.
pub const INVENTORY_COLUMNS: [&str; 7] = [
    "Channel 2",
    "产品品牌",
    "产品大分类",
    "产品中分类",
    "运营基准",
    "产品季节",
    "预计库存金额",
];

/// One row of a monthly inventory extract.
///
/// Other columns of the export are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InventoryRecord {
    #[serde(rename = "Channel 2")]
    pub channel: String,
    #[serde(rename = "产品品牌")]
    pub brand: String,
    #[serde(rename = "产品大分类")]
    pub major_category: String,
    #[serde(rename = "产品中分类")]
    pub minor_category: String,
    #[serde(rename = "运营基准")]
    pub operation_basis: String,
    #[serde(rename = "产品季节")]
    pub season: String,
    /// Estimated inventory value; blank cells are `None`.
    #[serde(rename = "预计库存金额")]
    pub amount: Option<f64>,
}

impl InventoryRecord {
    /// Inventory value, with blanks counted as zero.
    pub fn amount_or_zero(&self) -> f64 {
        self.amount.unwrap_or(0.0)
    }

    /// Minor category, or `None` when the cell is blank.
    pub fn minor_category(&self) -> Option<&str> {
        let category = self.minor_category.trim();
        (!category.is_empty()).then_some(category)
    }
}

// =============================================================================
// Year-Month
// =============================================================================

static MONTH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})\.(\d{2})$").expect("valid regex"));

/// A reporting month, written `YYYY.MM`.
///
/// Ordering is chronological, which matches the lexicographic order of the
/// written form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Create a month, rejecting month numbers outside 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self, ConfigError> {
        if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
            return Err(ConfigError::InvalidMonth(format!("{}.{}", year, month)));
        }
        Ok(Self { year, month })
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// The following calendar month.
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    /// All months from `start` to `end`, both included.
    pub fn range_inclusive(start: Self, end: Self) -> Vec<Self> {
        let mut months = Vec::new();
        let mut current = start;
        while current <= end {
            months.push(current);
            current = current.next();
        }
        months
    }

    /// Number of days in this month (leap years included).
    pub fn days_in_month(self) -> u32 {
        match (self.first_day(), self.next().first_day()) {
            (Some(first), Some(next)) => next.signed_duration_since(first).num_days() as u32,
            _ => 0,
        }
    }

    /// Name of the inventory extract for this month, e.g. `2025.03.csv`.
    pub fn file_name(self) -> String {
        format!("{}.csv", self)
    }

    fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}.{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = MONTH_RE
            .captures(s.trim())
            .ok_or_else(|| ConfigError::InvalidMonth(s.to_string()))?;
        let year = caps[1].parse().map_err(|_| ConfigError::InvalidMonth(s.to_string()))?;
        let month = caps[2].parse().map_err(|_| ConfigError::InvalidMonth(s.to_string()))?;
        Self::new(year, month).map_err(|_| ConfigError::InvalidMonth(s.to_string()))
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Operation Group
// =============================================================================

/// Lifecycle bucket of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationGroup {
    Core,
    Outlet,
}

impl OperationGroup {
    /// Both groups, in report order.
    pub const ALL: [OperationGroup; 2] = [OperationGroup::Core, OperationGroup::Outlet];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Outlet => "outlet",
        }
    }
}

impl fmt::Display for OperationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Channels
// =============================================================================

/// Point-of-sale channels retained by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Franchise stores.
    Frs,
    /// Headquarters-operated stores.
    Hq,
    /// Online retail.
    Or,
}

impl Channel {
    /// Parse a `Channel 2` value. Any other channel (e.g. `POS`) is `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "FRS" => Some(Self::Frs),
            "HQ" => Some(Self::Hq),
            "OR" => Some(Self::Or),
            _ => None,
        }
    }

    /// The channel-specific bucket this channel feeds besides [`ChannelGroup::All`].
    pub fn group(self) -> ChannelGroup {
        match self {
            Self::Frs => ChannelGroup::Frs,
            Self::Hq | Self::Or => ChannelGroup::HqOr,
        }
    }
}

/// Aggregation bucket over channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelGroup {
    All,
    Frs,
    HqOr,
}

impl ChannelGroup {
    /// All groups, in report order.
    pub const ALL: [ChannelGroup; 3] = [ChannelGroup::All, ChannelGroup::Frs, ChannelGroup::HqOr];

    pub fn label(self) -> &'static str {
        match self {
            Self::All => TOTAL_LABEL,
            Self::Frs => "FRS",
            Self::HqOr => "HQ_OR",
        }
    }
}

// =============================================================================
// Item Tab
// =============================================================================

/// Reporting dimension: every item, or a single minor category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemTab {
    All,
    Category(String),
}

impl ItemTab {
    pub fn from_label(label: &str) -> Self {
        if label == TOTAL_LABEL {
            Self::All
        } else {
            Self::Category(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => TOTAL_LABEL,
            Self::Category(name) => name,
        }
    }
}

impl fmt::Display for ItemTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Keys
// =============================================================================

/// Key of one inventory running sum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregationKey {
    pub brand: String,
    pub item_tab: ItemTab,
    pub month: YearMonth,
    pub channel_group: ChannelGroup,
    pub operation_group: OperationGroup,
}

impl AggregationKey {
    pub fn new(
        brand: impl Into<String>,
        item_tab: ItemTab,
        month: YearMonth,
        channel_group: ChannelGroup,
        operation_group: OperationGroup,
    ) -> Self {
        Self {
            brand: brand.into(),
            item_tab,
            month,
            channel_group,
            operation_group,
        }
    }
}

/// Key of one OR sales figure. The channel is always `OR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SalesKey {
    pub brand: String,
    pub item_tab: ItemTab,
    pub month: YearMonth,
    pub operation_group: OperationGroup,
}

impl SalesKey {
    pub fn new(
        brand: impl Into<String>,
        item_tab: ItemTab,
        month: YearMonth,
        operation_group: OperationGroup,
    ) -> Self {
        Self {
            brand: brand.into(),
            item_tab,
            month,
            operation_group,
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// Metric name -> rounded amount for one (brand, item tab, month) cell.
///
/// Values are plain JSON so cells written by older runs (which may carry
/// `null` sales figures) load and survive a merge unchanged.
pub type MonthMetrics = BTreeMap<String, Value>;

/// item tab -> month -> metrics
pub type ItemTabMonths = BTreeMap<String, BTreeMap<String, MonthMetrics>>;

/// The `accessory_inventory_summary.json` artifact.
///
/// Maps are ordered so serialization is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    /// brand -> item tab -> month -> metrics
    pub brands: BTreeMap<String, ItemTabMonths>,

    /// Minor categories seen outside the recognized set.
    #[serde(default)]
    pub unexpected_categories: Vec<String>,

    /// Analysis months, sorted.
    #[serde(default)]
    pub months: Vec<String>,

    /// Day count of every analysis month.
    #[serde(default)]
    pub days_in_month: BTreeMap<String, u32>,

    /// Fields written by other tools, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InventoryReport {
    /// Metrics cell for a brand, tab and month, if present.
    pub fn cell(&self, brand: &str, item_tab: &str, month: &str) -> Option<&MonthMetrics> {
        self.brands.get(brand)?.get(item_tab)?.get(month)
    }
}
