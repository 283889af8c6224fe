use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::analysis::{PriceBucket, PriceCurvePoint};
use crate::domain::product::Product;
use crate::errors::{ensure_finite, AnalysisError};
use crate::pricing::demand::{DemandModel, RISING_DEMAND_WARNING};

const COST_FLOOR_FACTOR: f64 = 1.10;
const OBSERVED_FLOOR_FACTOR: f64 = 0.90;
const OBSERVED_CEILING_FACTOR: f64 = 1.25;
const LISTED_CEILING_FACTOR: f64 = 1.10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisWarning {
    /// The fitted curve slopes upward; candidates were scored with the flat historical average.
    FlatAverageFallback { slope: f64, average_quantity: f64 },
    /// The recommendation is predicted to earn less than what was actually observed near the
    /// listed price, which usually points at promotions or noise in the history.
    BelowEmpiricalBaseline { optimum_profit: f64, empirical_profit: f64 },
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FlatAverageFallback { slope, average_quantity } => write!(
                f,
                "{RISING_DEMAND_WARNING} (slope {slope:.4}); using the flat historical average of {average_quantity:.2} units/day for every candidate price"
            ),
            Self::BelowEmpiricalBaseline { optimum_profit, empirical_profit } => write!(
                f,
                "recommended price is predicted to earn {optimum_profit:.2}/day, below the {empirical_profit:.2}/day observed near the listed price; treat the recommendation with caution (history may include promotions or noise)"
            ),
        }
    }
}

/// Observed daily profit at the bucket closest to the listed price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmpiricalBaseline {
    pub bucket_price: f64,
    pub average_quantity: f64,
    pub daily_profit: f64,
}

impl EmpiricalBaseline {
    /// Ties resolve to the lower price.
    pub fn nearest(buckets: &[PriceBucket], listed_price: f64, unit_cost: f64) -> Option<Self> {
        let mut nearest: Option<&PriceBucket> = None;
        for bucket in buckets {
            let closer = nearest.map_or(true, |best| {
                let distance = (bucket.price - listed_price).abs();
                let best_distance = (best.price - listed_price).abs();
                distance < best_distance
                    || (distance == best_distance && bucket.price < best.price)
            });
            if closer {
                nearest = Some(bucket);
            }
        }

        nearest.map(|bucket| Self {
            bucket_price: bucket.price,
            average_quantity: bucket.average_daily_quantity(),
            daily_profit: bucket.daily_profit(unit_cost),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimumPriceReport {
    pub product: String,
    pub unit_cost: f64,
    pub listed_price: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub model: DemandModel,
    pub used_fallback: bool,
    pub empirical_baseline: EmpiricalBaseline,
    /// Listed price scored the same way as the candidates.
    pub model_baseline: PriceCurvePoint,
    pub optimum: PriceCurvePoint,
    pub warnings: Vec<AnalysisWarning>,
    pub curve: Vec<PriceCurvePoint>,
}

impl OptimumPriceReport {
    pub fn profit_gain_over_listed(&self) -> f64 {
        self.optimum.profit - self.model_baseline.profit
    }
}

/// `points` evenly spaced prices from `lower` to `upper`, both included.
pub fn price_grid(lower: f64, upper: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![lower],
        _ => {
            let step = (upper - lower) / (points - 1) as f64;
            (0..points)
                .map(|index| if index + 1 == points { upper } else { lower + step * index as f64 })
                .collect()
        }
    }
}

pub fn require_priced_and_costed(product: &Product) -> Result<(), AnalysisError> {
    if !product.has_positive_cost() {
        return Err(AnalysisError::InvalidInput(format!(
            "product `{}` has no positive unit cost; configure its recipe first",
            product.name
        )));
    }
    if product.listed_price <= Decimal::ZERO {
        return Err(AnalysisError::InvalidInput(format!(
            "product `{}` has no positive listed price",
            product.name
        )));
    }
    Ok(())
}

/// Candidate range: floor at 10% above cost and 10% below both the cheapest observed
/// and the listed price; ceiling at 25% above the dearest observed or 10% above listed.
pub fn candidate_range(
    buckets: &[PriceBucket],
    unit_cost: f64,
    listed_price: f64,
) -> Result<(f64, f64), AnalysisError> {
    let (Some(first), Some(last)) = (buckets.first(), buckets.last()) else {
        return Err(AnalysisError::InsufficientData("no price buckets to search".to_string()));
    };

    let lower = (unit_cost * COST_FLOOR_FACTOR)
        .max(first.price * OBSERVED_FLOOR_FACTOR)
        .max(listed_price * OBSERVED_FLOOR_FACTOR);
    let upper = (last.price * OBSERVED_CEILING_FACTOR).max(listed_price * LISTED_CEILING_FACTOR);

    if lower >= upper {
        return Err(AnalysisError::InvalidInput(format!(
            "no viable price range: floor {lower:.2} is not below ceiling {upper:.2}"
        )));
    }
    Ok((lower, upper))
}

/// Grid-searches the candidate range for the most profitable price. `buckets` must be
/// sorted by price, as produced by the aggregator.
pub fn find_optimum(
    product: &Product,
    buckets: &[PriceBucket],
    grid_points: usize,
) -> Result<OptimumPriceReport, AnalysisError> {
    require_priced_and_costed(product)?;
    let unit_cost = product.unit_cost_f64();
    let listed_price = product.listed_price_f64();

    let model = DemandModel::fit(buckets)?;
    let mut warnings = Vec::new();
    let flat_quantity = buckets.iter().map(PriceBucket::average_daily_quantity).sum::<f64>()
        / buckets.len() as f64;
    if !model.valid {
        warnings.push(AnalysisWarning::FlatAverageFallback {
            slope: model.slope,
            average_quantity: flat_quantity,
        });
    }
    let quantity_at = |price: f64| if model.valid { model.predict(price) } else { flat_quantity };

    let (lower_bound, upper_bound) = candidate_range(buckets, unit_cost, listed_price)?;
    let curve: Vec<PriceCurvePoint> = price_grid(lower_bound, upper_bound, grid_points)
        .into_iter()
        .map(|price| PriceCurvePoint::evaluate(price, quantity_at(price), unit_cost))
        .collect();

    let mut optimum: Option<PriceCurvePoint> = None;
    for point in &curve {
        if optimum.map_or(true, |best| point.profit > best.profit) {
            optimum = Some(*point);
        }
    }
    let optimum = optimum
        .ok_or_else(|| AnalysisError::Computation("price grid produced no candidates".to_string()))?;
    ensure_finite(optimum.profit, "optimum profit")?;

    let empirical_baseline = EmpiricalBaseline::nearest(buckets, listed_price, unit_cost)
        .ok_or_else(|| AnalysisError::InsufficientData("no bucket near the listed price".to_string()))?;
    if optimum.profit < empirical_baseline.daily_profit {
        warnings.push(AnalysisWarning::BelowEmpiricalBaseline {
            optimum_profit: optimum.profit,
            empirical_profit: empirical_baseline.daily_profit,
        });
    }

    let model_baseline =
        PriceCurvePoint::evaluate(listed_price, quantity_at(listed_price), unit_cost);
    let used_fallback = !model.valid;

    Ok(OptimumPriceReport {
        product: product.name.clone(),
        unit_cost,
        listed_price,
        lower_bound,
        upper_bound,
        model,
        used_fallback,
        empirical_baseline,
        model_baseline,
        optimum,
        warnings,
        curve,
    })
}
