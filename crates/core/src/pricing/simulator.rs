use serde::{Deserialize, Serialize};

use crate::domain::analysis::{PriceBucket, PriceCurvePoint};
use crate::domain::product::Product;
use crate::errors::{ensure_finite, AnalysisError};
use crate::pricing::demand::DemandModel;
use crate::pricing::explorer::price_grid;

/// What the product has historically made per day: mean bucket price against mean
/// bucket quantity, independent of the fitted curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaselineSnapshot {
    pub average_price: f64,
    pub average_quantity: f64,
    pub daily_profit: f64,
}

impl BaselineSnapshot {
    pub fn from_buckets(buckets: &[PriceBucket], unit_cost: f64) -> Result<Self, AnalysisError> {
        if buckets.is_empty() {
            return Err(AnalysisError::InsufficientData("no price buckets for a baseline".to_string()));
        }
        let n = buckets.len() as f64;
        let average_price = buckets.iter().map(|bucket| bucket.price).sum::<f64>() / n;
        let average_quantity =
            buckets.iter().map(PriceBucket::average_daily_quantity).sum::<f64>() / n;
        let daily_profit = ensure_finite((average_price - unit_cost) * average_quantity, "baseline profit")?;

        Ok(Self { average_price, average_quantity, daily_profit })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitOutlook {
    Increase,
    Decrease,
    Unchanged,
}

impl ProfitOutlook {
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 {
            Self::Increase
        } else if delta < 0.0 {
            Self::Decrease
        } else {
            Self::Unchanged
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceSimulation {
    pub product: String,
    pub unit_cost: f64,
    pub proposed_price: f64,
    pub baseline: BaselineSnapshot,
    pub model: DemandModel,
    pub predicted_quantity: f64,
    pub predicted_profit: f64,
    pub profit_delta: f64,
    pub outlook: ProfitOutlook,
    pub curve: Vec<PriceCurvePoint>,
}

pub fn validate_proposed_price(product: &Product, proposed_price: f64) -> Result<(), AnalysisError> {
    if !proposed_price.is_finite() || proposed_price <= 0.0 {
        return Err(AnalysisError::InvalidInput(format!(
            "proposed price must be a positive number, got {proposed_price}"
        )));
    }
    if !product.has_positive_cost() {
        return Err(AnalysisError::InvalidInput(format!(
            "product `{}` has no positive unit cost; configure its recipe first",
            product.name
        )));
    }
    Ok(())
}

/// Chart range: from 10% above cost up to at least twice the baseline price and at least
/// 20% past the proposed price.
pub fn curve_bounds(unit_cost: f64, average_price: f64, proposed_price: f64) -> (f64, f64) {
    let lower = unit_cost * 1.1;
    let upper = (average_price * 2.0).max(proposed_price * 1.2);
    if upper <= lower {
        (lower, lower * 2.0)
    } else {
        (lower, upper)
    }
}

/// Scores one proposed price against the fitted curve. An upward-sloping curve aborts with
/// `ModelInvalid` rather than extrapolating from it.
pub fn simulate(
    product: &Product,
    buckets: &[PriceBucket],
    proposed_price: f64,
    grid_points: usize,
) -> Result<PriceSimulation, AnalysisError> {
    validate_proposed_price(product, proposed_price)?;
    let unit_cost = product.unit_cost_f64();

    let baseline = BaselineSnapshot::from_buckets(buckets, unit_cost)?;
    let model = DemandModel::fit(buckets)?;
    model.ensure_valid()?;

    let predicted = PriceCurvePoint::evaluate(proposed_price, model.predict(proposed_price), unit_cost);
    let profit_delta = ensure_finite(predicted.profit - baseline.daily_profit, "profit delta")?;

    let (lower, upper) = curve_bounds(unit_cost, baseline.average_price, proposed_price);
    let curve = price_grid(lower, upper, grid_points)
        .into_iter()
        .map(|price| PriceCurvePoint::evaluate(price, model.predict(price), unit_cost))
        .collect();

    Ok(PriceSimulation {
        product: product.name.clone(),
        unit_cost,
        proposed_price,
        baseline,
        model,
        predicted_quantity: predicted.quantity,
        predicted_profit: predicted.profit,
        profit_delta,
        outlook: ProfitOutlook::from_delta(profit_delta),
        curve,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{curve_bounds, simulate, BaselineSnapshot, ProfitOutlook};
    use crate::domain::analysis::PriceBucket;
    use crate::domain::product::{Product, ProductId};
    use crate::errors::AnalysisError;

    fn product(cost: i64) -> Product {
        Product {
            id: ProductId("p-1".to_owned()),
            name: "Cheeseburger".to_owned(),
            external_name: "CHEESEBURGER".to_owned(),
            unit_cost: Decimal::new(cost, 0),
            listed_price: Decimal::new(11, 0),
            category: "Burgers".to_owned(),
            category_group: "Mains".to_owned(),
        }
    }

    fn bucket(price: f64, quantity_per_day: u64) -> PriceBucket {
        PriceBucket { price, total_quantity: quantity_per_day, distinct_days: 1 }
    }

    #[test]
    fn baseline_uses_unweighted_bucket_means() {
        let baseline =
            BaselineSnapshot::from_buckets(&[bucket(10.0, 100), bucket(12.0, 80)], 4.0).expect("baseline");

        assert!((baseline.average_price - 11.0).abs() < 1e-9);
        assert!((baseline.average_quantity - 90.0).abs() < 1e-9);
        assert!((baseline.daily_profit - 630.0).abs() < 1e-9);
    }

    #[test]
    fn simulation_reports_prediction_and_signed_delta() {
        let simulation =
            simulate(&product(4), &[bucket(10.0, 100), bucket(12.0, 80)], 12.0, 60).expect("simulation");

        assert!((simulation.predicted_quantity - 80.0).abs() < 1e-9);
        assert!((simulation.predicted_profit - 640.0).abs() < 1e-9);
        assert!((simulation.profit_delta - 10.0).abs() < 1e-9);
        assert_eq!(simulation.outlook, ProfitOutlook::Increase);
        assert_eq!(simulation.curve.len(), 60);
        assert!((simulation.curve[0].price - 4.4).abs() < 1e-9);
        assert!((simulation.curve[59].price - 22.0).abs() < 1e-9);
    }

    #[test]
    fn price_beyond_demand_predicts_zero_quantity() {
        let simulation =
            simulate(&product(4), &[bucket(10.0, 100), bucket(12.0, 80)], 50.0, 20).expect("simulation");

        assert_eq!(simulation.predicted_quantity, 0.0);
        assert_eq!(simulation.outlook, ProfitOutlook::Decrease);
    }

    #[test]
    fn rising_curve_aborts_with_model_invalid() {
        let result = simulate(&product(4), &[bucket(10.0, 50), bucket(12.0, 70)], 11.0, 20);

        assert!(matches!(result, Err(AnalysisError::ModelInvalid(_))));
    }

    #[test]
    fn rejects_non_positive_price_and_cost() {
        let buckets = [bucket(10.0, 100), bucket(12.0, 80)];

        assert!(matches!(simulate(&product(4), &buckets, 0.0, 20), Err(AnalysisError::InvalidInput(_))));
        assert!(matches!(
            simulate(&product(4), &buckets, f64::NAN, 20),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(simulate(&product(0), &buckets, 11.0, 20), Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn curve_bounds_extend_when_cost_dominates() {
        let (lower, upper) = curve_bounds(100.0, 20.0, 30.0);
        assert!((lower - 110.0).abs() < 1e-9);
        assert!((upper - 220.0).abs() < 1e-9);

        let (lower, upper) = curve_bounds(4.0, 11.0, 30.0);
        assert!((lower - 4.4).abs() < 1e-9);
        assert!((upper - 36.0).abs() < 1e-9);
    }
}
