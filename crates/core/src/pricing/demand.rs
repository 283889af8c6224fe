use serde::{Deserialize, Serialize};

use crate::domain::analysis::PriceBucket;
use crate::errors::{ensure_finite, AnalysisError};

pub const RISING_DEMAND_WARNING: &str =
    "model implies demand rises with price; data is likely insufficient or noisy";

/// Linear demand curve `quantity = slope * price + intercept`, fit by ordinary least squares
/// of average daily quantity on bucket price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DemandModel {
    pub slope: f64,
    pub intercept: f64,
    pub sample_count: usize,
    /// Only a falling curve (`slope < 0`) is valid.
    pub valid: bool,
    pub warning: Option<String>,
}

impl DemandModel {
    pub fn fit(buckets: &[PriceBucket]) -> Result<Self, AnalysisError> {
        if buckets.len() < 2 {
            return Err(AnalysisError::InsufficientData(format!(
                "demand model needs at least 2 price buckets, got {}",
                buckets.len()
            )));
        }

        let n = buckets.len() as f64;
        let mean_price = buckets.iter().map(|bucket| bucket.price).sum::<f64>() / n;
        let mean_quantity =
            buckets.iter().map(PriceBucket::average_daily_quantity).sum::<f64>() / n;

        let (covariance, variance) =
            buckets.iter().fold((0.0_f64, 0.0_f64), |(covariance, variance), bucket| {
                let dx = bucket.price - mean_price;
                let dy = bucket.average_daily_quantity() - mean_quantity;
                (covariance + dx * dy, variance + dx * dx)
            });

        if variance == 0.0 || buckets.iter().all(|bucket| bucket.price == buckets[0].price) {
            return Err(AnalysisError::InsufficientData(
                "all price buckets share one price; slope is undefined".to_string(),
            ));
        }

        let slope = ensure_finite(covariance / variance, "demand slope")?;
        let intercept = ensure_finite(mean_quantity - slope * mean_price, "demand intercept")?;
        let valid = slope < 0.0;

        Ok(Self {
            slope,
            intercept,
            sample_count: buckets.len(),
            valid,
            warning: (!valid).then(|| RISING_DEMAND_WARNING.to_string()),
        })
    }

    /// Predicted daily quantity, never negative.
    pub fn predict(&self, price: f64) -> f64 {
        (self.slope * price + self.intercept).max(0.0)
    }

    pub fn ensure_valid(&self) -> Result<(), AnalysisError> {
        if self.valid {
            Ok(())
        } else {
            Err(AnalysisError::ModelInvalid(format!(
                "fitted slope {:.4} is not negative; {RISING_DEMAND_WARNING}",
                self.slope
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DemandModel, RISING_DEMAND_WARNING};
    use crate::domain::analysis::PriceBucket;
    use crate::errors::AnalysisError;

    fn bucket(price: f64, quantity_per_day: u64) -> PriceBucket {
        PriceBucket { price, total_quantity: quantity_per_day, distinct_days: 1 }
    }

    #[test]
    fn two_points_interpolate_exactly() {
        let model = DemandModel::fit(&[bucket(10.0, 100), bucket(12.0, 80)]).expect("model");

        assert!(model.valid);
        assert!((model.slope + 10.0).abs() < 1e-9);
        assert!((model.intercept - 200.0).abs() < 1e-9);
        let at_eleven = model.predict(11.0);
        assert!(at_eleven > 80.0 && at_eleven < 100.0);
    }

    #[test]
    fn strictly_decreasing_quantities_give_negative_slope() {
        let buckets = [bucket(8.0, 140), bucket(9.0, 121), bucket(11.0, 97), bucket(14.0, 40)];

        let model = DemandModel::fit(&buckets).expect("model");
        assert!(model.slope < 0.0);
        assert!(model.ensure_valid().is_ok());
        assert_eq!(model.warning, None);
    }

    #[test]
    fn rising_demand_is_flagged_invalid() {
        let model = DemandModel::fit(&[bucket(10.0, 50), bucket(12.0, 70)]).expect("model");

        assert!(!model.valid);
        assert_eq!(model.warning.as_deref(), Some(RISING_DEMAND_WARNING));
        assert!(matches!(model.ensure_valid(), Err(AnalysisError::ModelInvalid(_))));
    }

    #[test]
    fn flat_demand_counts_as_invalid() {
        let model = DemandModel::fit(&[bucket(10.0, 50), bucket(12.0, 50)]).expect("model");

        assert_eq!(model.slope, 0.0);
        assert!(!model.valid);
    }

    #[test]
    fn predictions_are_clamped_at_zero() {
        let model = DemandModel::fit(&[bucket(10.0, 100), bucket(12.0, 80)]).expect("model");

        for price in [0.0, 19.9, 20.0, 25.0, 1_000.0, -50.0] {
            assert!(model.predict(price) >= 0.0, "price {price}");
        }
        assert_eq!(model.predict(1_000.0), 0.0);
    }

    #[test]
    fn fewer_than_two_buckets_is_insufficient() {
        assert!(matches!(
            DemandModel::fit(&[bucket(10.0, 1)]),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn closely_spaced_prices_still_fit() {
        let model =
            DemandModel::fit(&[bucket(10.0, 100), bucket(10.000_000_001, 99)]).expect("model");

        assert!(model.valid);
        assert!(model.slope < 0.0);
        assert!(model.slope.is_finite());
    }

    #[test]
    fn identical_prices_are_insufficient() {
        assert!(matches!(
            DemandModel::fit(&[bucket(10.0, 100), bucket(10.0, 80)]),
            Err(AnalysisError::InsufficientData(_))
        ));
    }
}
