//! Text rendering of typed results and the `(success, report_text, chart)` outcome.

use std::fmt::Write as _;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::chart::ChartSeries;
use crate::domain::product::decimal_to_f64;
use crate::errors::AnalysisError;
use crate::pricing::comparison::{Classification, PeriodBreakdown, PeriodComparison};
use crate::pricing::explorer::OptimumPriceReport;
use crate::pricing::margin::MarginTarget;
use crate::pricing::simulator::{PriceSimulation, ProfitOutlook};

pub trait Report {
    fn render_text(&self, currency: &str) -> String;

    fn chart(&self) -> Option<ChartSeries> {
        None
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub success: bool,
    pub report_text: String,
    pub chart: Option<ChartSeries>,
    pub error_class: Option<String>,
}

impl AnalysisOutcome {
    pub fn from_result<R: Report>(result: Result<R, AnalysisError>, currency: &str) -> Self {
        match result {
            Ok(report) => Self {
                success: true,
                report_text: report.render_text(currency),
                chart: report.chart().filter(|chart| !chart.is_empty()),
                error_class: None,
            },
            Err(error) => Self::failure(&error),
        }
    }

    /// Failures never carry chart data.
    pub fn failure(error: &AnalysisError) -> Self {
        Self {
            success: false,
            report_text: format!("{}\n{error}", error.user_message()),
            chart: None,
            error_class: Some(error.error_class().to_string()),
        }
    }
}

fn money(value: f64, currency: &str) -> String {
    format!("{value:.2} {currency}")
}

fn decimal_money(value: Decimal, currency: &str) -> String {
    format!("{:.2} {currency}", value.round_dp(2))
}

fn signed_money(value: f64, currency: &str) -> String {
    format!("{value:+.2} {currency}")
}

fn share(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |share| format!("{share:.1}%"))
}

impl Report for MarginTarget {
    fn render_text(&self, currency: &str) -> String {
        let mut text = format!(
            "Target price for {}\n  unit cost:      {}\n  target margin:  {}%\n  required price: {}",
            self.product,
            decimal_money(self.unit_cost, currency),
            self.margin_pct.normalize(),
            decimal_money(self.required_price, currency),
        );
        if let Some(listed_margin) = self.listed_margin_pct() {
            let _ = write!(
                text,
                "\n  listed price:   {} ({:.1}% margin today)",
                decimal_money(self.listed_price, currency),
                listed_margin.round_dp(1)
            );
        }
        text
    }
}

impl Report for PriceSimulation {
    fn render_text(&self, currency: &str) -> String {
        let direction = match self.outlook {
            ProfitOutlook::Increase => "raise",
            ProfitOutlook::Decrease => "lower",
            ProfitOutlook::Unchanged => "not change",
        };
        format!(
            "Price simulation for {}\n  baseline: {} avg price, {:.2} units/day, {} profit/day\n  at {}: {:.2} units/day, {} profit/day\n  change:   {} per day\n  Moving to {} is predicted to {} daily profit.",
            self.product,
            money(self.baseline.average_price, currency),
            self.baseline.average_quantity,
            money(self.baseline.daily_profit, currency),
            money(self.proposed_price, currency),
            self.predicted_quantity,
            money(self.predicted_profit, currency),
            signed_money(self.profit_delta, currency),
            money(self.proposed_price, currency),
            direction,
        )
    }

    fn chart(&self) -> Option<ChartSeries> {
        Some(ChartSeries::from_curve(&self.curve))
    }
}

impl Report for OptimumPriceReport {
    fn render_text(&self, currency: &str) -> String {
        let mut text = format!(
            "Optimum price for {}\n  searched {} to {} over {} candidates\n  listed price {}: observed {} profit/day (bucket {}), model {} profit/day\n  recommended: {} at {:.2} units/day for {} profit/day ({} vs listed)",
            self.product,
            money(self.lower_bound, currency),
            money(self.upper_bound, currency),
            self.curve.len(),
            money(self.listed_price, currency),
            money(self.empirical_baseline.daily_profit, currency),
            money(self.empirical_baseline.bucket_price, currency),
            money(self.model_baseline.profit, currency),
            money(self.optimum.price, currency),
            self.optimum.quantity,
            money(self.optimum.profit, currency),
            signed_money(self.profit_gain_over_listed(), currency),
        );
        for warning in &self.warnings {
            let _ = write!(text, "\n  warning: {warning}");
        }
        text
    }

    fn chart(&self) -> Option<ChartSeries> {
        Some(ChartSeries::from_curve(&self.curve))
    }
}

impl Report for PeriodComparison {
    fn render_text(&self, currency: &str) -> String {
        let mut text = format!(
            "Period comparison for {} `{}` by {} ({} days)\n  previous {}..{}: {}\n  current  {}..{}: {}\n  delta: {} ({})",
            self.grouping.scope_label(),
            self.key,
            self.grouping.member_label(),
            self.window_days,
            self.previous.window.start,
            self.previous.window.end,
            decimal_money(self.previous.total_profit, currency),
            self.current.window.start,
            self.current.window.end,
            decimal_money(self.current.total_profit, currency),
            decimal_money(self.delta, currency),
            self.classification.as_str(),
        );
        for shift in &self.share_shifts {
            let _ = write!(
                text,
                "\n  {}: {} -> {}",
                shift.group,
                share(shift.previous_share_pct),
                share(shift.current_share_pct)
            );
        }
        if self.classification == Classification::Declined {
            if let Some(note) = &self.note {
                let _ = write!(text, "\n  note: {note}");
            }
            if !self.cannibalization_suspects.is_empty() {
                let _ = write!(
                    text,
                    "\n  share rose during the decline: {}",
                    self.cannibalization_suspects.join(", ")
                );
            }
        }
        text
    }

    fn chart(&self) -> Option<ChartSeries> {
        let labels = self.labels();
        let values = |breakdown: &PeriodBreakdown| -> Vec<f64> {
            labels
                .iter()
                .map(|label| breakdown.profit_of(label).map_or(0.0, decimal_to_f64))
                .collect()
        };
        let previous = values(&self.previous);
        let current = values(&self.current);
        Some(ChartSeries::new(labels).with_dataset("previous", previous).with_dataset("current", current))
    }
}
