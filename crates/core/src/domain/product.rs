use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

/// Catalog entry as seen by the analysis engine.
///
/// `unit_cost` is rolled up from the recipe by the catalog side and is read-only here.
/// `external_name` is the label sales rows carry for this product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub external_name: String,
    pub unit_cost: Decimal,
    pub listed_price: Decimal,
    pub category: String,
    pub category_group: String,
}

impl Product {
    pub fn unit_cost_f64(&self) -> f64 {
        decimal_to_f64(self.unit_cost)
    }

    pub fn listed_price_f64(&self) -> f64 {
        decimal_to_f64(self.listed_price)
    }

    pub fn has_positive_cost(&self) -> bool {
        self.unit_cost > Decimal::ZERO
    }
}

pub(crate) fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
