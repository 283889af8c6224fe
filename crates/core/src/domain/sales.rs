use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::{decimal_to_f64, ProductId};

/// One ingested sale line. `cost_at_sale` is the total cost locked in when the line was
/// ingested and never recomputed from the product's current cost.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub product_id: ProductId,
    pub sold_at: DateTime<Utc>,
    pub quantity: u32,
    pub revenue: Decimal,
    pub cost_at_sale: Decimal,
}

impl SalesRecord {
    pub fn unit_price(&self) -> Decimal {
        if self.quantity == 0 {
            return Decimal::ZERO;
        }
        self.revenue / Decimal::from(self.quantity)
    }

    pub fn profit(&self) -> Decimal {
        self.revenue - self.cost_at_sale
    }

    pub fn observation(&self) -> SalesObservation {
        SalesObservation {
            sold_at: self.sold_at,
            quantity: self.quantity,
            unit_price: decimal_to_f64(self.unit_price()),
        }
    }
}

/// Price/quantity projection of a sale, the input of price bucketing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SalesObservation {
    pub sold_at: DateTime<Utc>,
    pub quantity: u32,
    pub unit_price: f64,
}

impl SalesObservation {
    pub fn sale_date(&self) -> NaiveDate {
        self.sold_at.date_naive()
    }
}

/// Sale joined with its product's catalog placement, the input of period comparison.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySale {
    pub sold_at: DateTime<Utc>,
    pub product_name: String,
    pub category_name: String,
    pub revenue: Decimal,
    pub cost_at_sale: Decimal,
    pub profit: Decimal,
}

impl CategorySale {
    pub fn sale_date(&self) -> NaiveDate {
        self.sold_at.date_naive()
    }
}
