use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::domain::analysis::PriceBucket;
use crate::domain::sales::SalesObservation;
use crate::errors::AnalysisError;

/// Index of the nearest multiple of `step`; `None` for non-finite input.
pub fn round_to_step(price: f64, step: f64) -> Option<i64> {
    let index = (price / step).round();
    if !index.is_finite() || index.abs() > i64::MAX as f64 {
        return None;
    }
    Some(index as i64)
}

/// Groups observations by rounded unit price, ascending.
///
/// Fails with `InsufficientData` unless at least two distinct rounded prices remain,
/// since no demand curve can be fit through a single point.
pub fn build_price_buckets(
    observations: &[SalesObservation],
    step: f64,
) -> Result<Vec<PriceBucket>, AnalysisError> {
    if !step.is_finite() || step <= 0.0 {
        return Err(AnalysisError::InvalidInput(format!(
            "price rounding step must be a positive number, got {step}"
        )));
    }

    let mut groups: BTreeMap<i64, (u64, BTreeSet<NaiveDate>)> = BTreeMap::new();
    for observation in observations.iter().filter(|observation| observation.quantity > 0) {
        let Some(index) = round_to_step(observation.unit_price, step) else {
            continue;
        };
        let (quantity, days) = groups.entry(index).or_default();
        *quantity += u64::from(observation.quantity);
        days.insert(observation.sale_date());
    }

    let buckets: Vec<PriceBucket> = groups
        .into_iter()
        .filter(|(_, (_, days))| !days.is_empty())
        .map(|(index, (total_quantity, days))| PriceBucket {
            price: index as f64 * step,
            total_quantity,
            distinct_days: u32::try_from(days.len()).unwrap_or(u32::MAX),
        })
        .collect();

    if buckets.len() < 2 {
        return Err(AnalysisError::InsufficientData(format!(
            "{} distinct price point(s) observed; at least 2 are needed to fit a demand model",
            buckets.len()
        )));
    }

    Ok(buckets)
}
