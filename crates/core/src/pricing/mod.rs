//! The price-demand analyses and the facade that feeds them from a [`SalesDataSource`].
//!
//! Every call fetches fresh rows, computes, and returns; no model or bucket set outlives
//! the call that built it.

pub mod buckets;
pub mod comparison;
pub mod demand;
pub mod explorer;
pub mod margin;
pub mod simulator;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::domain::analysis::{GroupingType, PriceBucket};
use crate::domain::product::Product;
use crate::errors::AnalysisError;
use crate::report::AnalysisOutcome;
use crate::source::SalesDataSource;

pub use comparison::{Classification, PeriodBreakdown, PeriodComparison, ShareShift};
pub use demand::DemandModel;
pub use explorer::{AnalysisWarning, EmpiricalBaseline, OptimumPriceReport};
pub use margin::MarginTarget;
pub use simulator::{BaselineSnapshot, PriceSimulation, ProfitOutlook};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "analysis", rename_all = "snake_case")]
pub enum AnalysisRequest {
    TargetMargin { product: String, margin_pct: Decimal },
    SimulatePrice { product: String, proposed_price: f64 },
    OptimumPrice { product: String },
    ComparePeriods { grouping: GroupingType, key: String, window_days: Option<u32> },
}

impl AnalysisRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TargetMargin { .. } => "target_margin",
            Self::SimulatePrice { .. } => "simulate_price",
            Self::OptimumPrice { .. } => "optimum_price",
            Self::ComparePeriods { .. } => "compare_periods",
        }
    }
}

pub struct PricingAnalyzer<S> {
    source: S,
    settings: AnalysisConfig,
    reference_date: Option<NaiveDate>,
}

impl<S: SalesDataSource> PricingAnalyzer<S> {
    pub fn new(source: S, settings: AnalysisConfig) -> Self {
        Self { source, settings, reference_date: None }
    }

    /// Pins "today" for lookback and comparison windows.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn settings(&self) -> &AnalysisConfig {
        &self.settings
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn today(&self) -> NaiveDate {
        self.reference_date.unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn target_price(
        &self,
        product_name: &str,
        margin_pct: Decimal,
    ) -> Result<MarginTarget, AnalysisError> {
        let product = self.product(product_name)?;
        let target = MarginTarget::for_product(&product, margin_pct)?;
        info!(
            event_name = "analysis.target_price.completed",
            product = %product.name,
            margin_pct = %margin_pct,
            required_price = %target.required_price.round_dp(2),
            "target price computed"
        );
        Ok(target)
    }

    pub fn price_buckets(&self, product_name: &str) -> Result<Vec<PriceBucket>, AnalysisError> {
        let product = self.product(product_name)?;
        self.buckets_for(&product)
    }

    pub fn simulate_price_change(
        &self,
        product_name: &str,
        proposed_price: f64,
    ) -> Result<PriceSimulation, AnalysisError> {
        let product = self.product(product_name)?;
        simulator::validate_proposed_price(&product, proposed_price)?;
        let buckets = self.buckets_for(&product)?;

        let simulation =
            match simulator::simulate(&product, &buckets, proposed_price, self.settings.grid_points) {
                Ok(simulation) => simulation,
                Err(error) => {
                    if matches!(error, AnalysisError::ModelInvalid(_)) {
                        warn!(
                            event_name = "analysis.model.invalid",
                            product = %product.name,
                            buckets = buckets.len(),
                            "simulation aborted on upward-sloping demand"
                        );
                    }
                    return Err(error);
                }
            };

        info!(
            event_name = "analysis.simulation.completed",
            product = %product.name,
            proposed_price,
            slope = simulation.model.slope,
            profit_delta = simulation.profit_delta,
            "price change simulated"
        );
        Ok(simulation)
    }

    pub fn find_optimum_price(&self, product_name: &str) -> Result<OptimumPriceReport, AnalysisError> {
        let product = self.product(product_name)?;
        explorer::require_priced_and_costed(&product)?;
        let buckets = self.buckets_for(&product)?;

        let report = explorer::find_optimum(&product, &buckets, self.settings.grid_points)?;
        for warning in &report.warnings {
            warn!(
                event_name = "analysis.optimum.warning",
                product = %product.name,
                warning = %warning,
                "optimum search raised a warning"
            );
        }
        info!(
            event_name = "analysis.optimum.completed",
            product = %product.name,
            optimum_price = report.optimum.price,
            optimum_profit = report.optimum.profit,
            used_fallback = report.used_fallback,
            "optimum price search completed"
        );
        Ok(report)
    }

    /// `window_days` falls back to the configured comparison window.
    pub fn compare_periods(
        &self,
        grouping: GroupingType,
        key: &str,
        window_days: Option<u32>,
    ) -> Result<PeriodComparison, AnalysisError> {
        let window_days = window_days.unwrap_or(self.settings.comparison_window_days);
        let rows = self.source.sales_with_category(key, grouping)?;
        let comparison = comparison::compare(&rows, grouping, key, window_days, self.today())?;

        info!(
            event_name = "analysis.comparison.completed",
            grouping = %grouping,
            key,
            window_days,
            delta = %comparison.delta,
            classification = comparison.classification.as_str(),
            "period comparison completed"
        );
        Ok(comparison)
    }

    /// Runs one request and folds the result into the outcome tuple.
    pub fn run(&self, request: &AnalysisRequest) -> AnalysisOutcome {
        let currency = self.settings.currency.as_str();
        let outcome = match request {
            AnalysisRequest::TargetMargin { product, margin_pct } => {
                AnalysisOutcome::from_result(self.target_price(product, *margin_pct), currency)
            }
            AnalysisRequest::SimulatePrice { product, proposed_price } => AnalysisOutcome::from_result(
                self.simulate_price_change(product, *proposed_price),
                currency,
            ),
            AnalysisRequest::OptimumPrice { product } => {
                AnalysisOutcome::from_result(self.find_optimum_price(product), currency)
            }
            AnalysisRequest::ComparePeriods { grouping, key, window_days } => {
                AnalysisOutcome::from_result(self.compare_periods(*grouping, key, *window_days), currency)
            }
        };

        if let Some(error_class) = &outcome.error_class {
            warn!(
                event_name = "analysis.request.failed",
                analysis = request.kind(),
                error_class = %error_class,
                "analysis request failed"
            );
        }
        outcome
    }

    fn product(&self, name: &str) -> Result<Product, AnalysisError> {
        self.source.find_product(name)?.ok_or_else(|| AnalysisError::not_found("product", name))
    }

    fn lookback_start(&self) -> Result<Option<DateTime<Utc>>, AnalysisError> {
        let Some(days) = self.settings.lookback_days else {
            return Ok(None);
        };
        let start = self.today().checked_sub_days(Days::new(u64::from(days))).ok_or_else(|| {
            AnalysisError::InvalidInput(format!("lookback of {days} days is out of range"))
        })?;
        Ok(Some(start.and_time(NaiveTime::MIN).and_utc()))
    }

    fn buckets_for(&self, product: &Product) -> Result<Vec<PriceBucket>, AnalysisError> {
        let since = self.lookback_start()?;
        let observations = self.source.sales_observations(&product.id, since)?;
        let buckets = buckets::build_price_buckets(&observations, self.settings.price_step)?;

        debug!(
            event_name = "analysis.buckets.built",
            product = %product.name,
            observations = observations.len(),
            buckets = buckets.len(),
            price_step = self.settings.price_step,
            "price buckets built"
        );
        Ok(buckets)
    }
}
