use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::Product;
use crate::errors::AnalysisError;

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Price needed so that `(price - cost) / price` equals the target margin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginTarget {
    pub product: String,
    pub unit_cost: Decimal,
    pub listed_price: Decimal,
    pub margin_pct: Decimal,
    pub required_price: Decimal,
}

impl MarginTarget {
    pub fn for_product(product: &Product, margin_pct: Decimal) -> Result<Self, AnalysisError> {
        let required_price = required_price(product.unit_cost, margin_pct)?;
        Ok(Self {
            product: product.name.clone(),
            unit_cost: product.unit_cost,
            listed_price: product.listed_price,
            margin_pct,
            required_price,
        })
    }

    /// Margin the current listed price actually yields. `None` when the price is not positive
    /// or the ratio does not fit a `Decimal`.
    pub fn listed_margin_pct(&self) -> Option<Decimal> {
        if self.listed_price <= Decimal::ZERO {
            return None;
        }
        self.listed_price
            .checked_sub(self.unit_cost)
            .and_then(|markup| markup.checked_div(self.listed_price))
            .and_then(|ratio| ratio.checked_mul(ONE_HUNDRED))
    }
}

/// `cost / (1 - margin / 100)` at full decimal precision.
pub fn required_price(unit_cost: Decimal, margin_pct: Decimal) -> Result<Decimal, AnalysisError> {
    if margin_pct <= Decimal::ZERO || margin_pct >= ONE_HUNDRED {
        return Err(AnalysisError::InvalidInput(format!(
            "target margin must be strictly between 0 and 100, got {margin_pct}"
        )));
    }
    if unit_cost <= Decimal::ZERO {
        return Err(AnalysisError::InvalidInput(format!(
            "product cost must be positive to price against a margin, got {unit_cost}"
        )));
    }

    let retained = Decimal::ONE - margin_pct / ONE_HUNDRED;
    unit_cost.checked_div(retained).ok_or_else(|| {
        AnalysisError::Computation(format!("required price overflowed for cost {unit_cost}"))
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::Decimal;

    use super::{required_price, MarginTarget};
    use crate::domain::product::{Product, ProductId};
    use crate::errors::AnalysisError;

    #[test]
    fn quarter_margin_on_one_hundred_is_133_33() {
        let price = required_price(Decimal::new(100, 0), Decimal::new(25, 0)).expect("price");

        assert_eq!(price.round_dp(2), Decimal::new(13333, 2));
    }

    #[test]
    fn achieved_margin_matches_target() {
        for (cost, margin) in [(100_i64, 25_i64), (37, 60), (1, 1), (4999, 99)] {
            let cost = Decimal::new(cost, 0);
            let margin = Decimal::new(margin, 0);
            let price = required_price(cost, margin).expect("price");

            let achieved = ((price - cost) / price).to_f64().unwrap_or(f64::NAN);
            let target = (margin / Decimal::ONE_HUNDRED).to_f64().unwrap_or(f64::NAN);
            assert!((achieved - target).abs() < 1e-9, "cost {cost} margin {margin}");
        }
    }

    #[test]
    fn rejects_margins_outside_open_interval_and_non_positive_cost() {
        for margin in [Decimal::ZERO, Decimal::ONE_HUNDRED, Decimal::new(-5, 0), Decimal::new(150, 0)] {
            assert!(matches!(
                required_price(Decimal::new(100, 0), margin),
                Err(AnalysisError::InvalidInput(_))
            ));
        }
        assert!(matches!(
            required_price(Decimal::ZERO, Decimal::new(25, 0)),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn target_reports_current_listed_margin() {
        let product = Product {
            id: ProductId("p-1".to_owned()),
            name: "Cheeseburger".to_owned(),
            external_name: "CHEESEBURGER".to_owned(),
            unit_cost: Decimal::new(100, 0),
            listed_price: Decimal::new(200, 0),
            category: "Burgers".to_owned(),
            category_group: "Mains".to_owned(),
        };

        let target = MarginTarget::for_product(&product, Decimal::new(40, 0)).expect("target");
        assert_eq!(target.listed_margin_pct(), Some(Decimal::new(50, 0)));
        assert_eq!(target.product, "Cheeseburger");
    }

    #[test]
    fn listed_margin_is_undefined_when_ratio_overflows() {
        let target = MarginTarget {
            product: "Saffron Risotto".to_owned(),
            unit_cost: Decimal::MAX,
            listed_price: Decimal::new(1, 10),
            margin_pct: Decimal::new(40, 0),
            required_price: Decimal::MAX,
        };

        assert_eq!(target.listed_margin_pct(), None);
    }
}
