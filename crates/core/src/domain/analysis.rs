use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::AnalysisError;

/// Sales sharing one rounded unit price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceBucket {
    pub price: f64,
    pub total_quantity: u64,
    pub distinct_days: u32,
}

impl PriceBucket {
    pub fn average_daily_quantity(&self) -> f64 {
        if self.distinct_days == 0 {
            return 0.0;
        }
        self.total_quantity as f64 / f64::from(self.distinct_days)
    }

    pub fn daily_profit(&self, unit_cost: f64) -> f64 {
        (self.price - unit_cost) * self.average_daily_quantity()
    }
}

/// One candidate price evaluated against a demand curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceCurvePoint {
    pub price: f64,
    pub quantity: f64,
    pub profit: f64,
}

impl PriceCurvePoint {
    pub fn evaluate(price: f64, quantity: f64, unit_cost: f64) -> Self {
        let quantity = quantity.max(0.0);
        Self { price, quantity, profit: (price - unit_cost) * quantity }
    }
}

/// Which catalog level a period comparison looks at, and which finer level it breaks down by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupingType {
    /// Key is a category; profit is broken down per product.
    ProductWithinCategory,
    /// Key is a category group; profit is broken down per category.
    CategoryWithinGroup,
}

impl GroupingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductWithinCategory => "product-within-category",
            Self::CategoryWithinGroup => "category-within-group",
        }
    }

    pub fn scope_label(&self) -> &'static str {
        match self {
            Self::ProductWithinCategory => "category",
            Self::CategoryWithinGroup => "category group",
        }
    }

    pub fn member_label(&self) -> &'static str {
        match self {
            Self::ProductWithinCategory => "product",
            Self::CategoryWithinGroup => "category",
        }
    }
}

impl fmt::Display for GroupingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupingType {
    type Err = AnalysisError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "product-within-category" | "category" => Ok(Self::ProductWithinCategory),
            "category-within-group" | "group" => Ok(Self::CategoryWithinGroup),
            other => Err(AnalysisError::InvalidInput(format!(
                "unsupported grouping type `{other}` (expected product-within-category|category-within-group)"
            ))),
        }
    }
}

/// Profit of one sub-group inside a comparison window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub group: String,
    pub profit: Decimal,
    /// Percentage of the window's total profit. `None` when that total is not positive.
    pub share_pct: Option<f64>,
}
