use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::analysis::{GroupingType, PeriodSummary};
use crate::domain::sales::CategorySale;
use crate::errors::AnalysisError;

pub const CANNIBALIZATION_NOTE: &str = "overall profit did not grow; a sub-group whose share rose \
     during this decline points to internal cannibalization rather than genuine growth";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Improved,
    Declined,
}

impl Classification {
    pub fn from_delta(delta: Decimal) -> Self {
        if delta > Decimal::ZERO {
            Self::Improved
        } else {
            Self::Declined
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improved => "improved",
            Self::Declined => "declined",
        }
    }
}

/// Half-open date range `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodBreakdown {
    pub window: PeriodWindow,
    pub total_profit: Decimal,
    pub groups: Vec<PeriodSummary>,
}

impl PeriodBreakdown {
    fn from_rows<'a>(
        window: PeriodWindow,
        rows: impl Iterator<Item = &'a CategorySale>,
        grouping: GroupingType,
    ) -> Result<Self, AnalysisError> {
        let mut profits: BTreeMap<String, Decimal> = BTreeMap::new();
        for row in rows {
            let group = match grouping {
                GroupingType::ProductWithinCategory => &row.product_name,
                GroupingType::CategoryWithinGroup => &row.category_name,
            };
            let entry = profits.entry(group.clone()).or_default();
            *entry = entry.checked_add(row.profit).ok_or_else(|| profit_overflow(group))?;
        }

        let total_profit = profits
            .values()
            .try_fold(Decimal::ZERO, |total, profit| total.checked_add(*profit))
            .ok_or_else(|| profit_overflow("period total"))?;
        let groups = profits
            .into_iter()
            .map(|(group, profit)| PeriodSummary {
                share_pct: share_pct(profit, total_profit),
                group,
                profit,
            })
            .collect();

        Ok(Self { window, total_profit, groups })
    }

    pub fn profit_of(&self, group: &str) -> Option<Decimal> {
        self.groups.iter().find(|summary| summary.group == group).map(|summary| summary.profit)
    }

    /// Share of `group`, counting an absent group as 0% of a positive total.
    pub fn share_of(&self, group: &str) -> Option<f64> {
        if self.total_profit <= Decimal::ZERO {
            return None;
        }
        Some(
            self.groups
                .iter()
                .find(|summary| summary.group == group)
                .and_then(|summary| summary.share_pct)
                .unwrap_or(0.0),
        )
    }

    fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Undefined for a non-positive total, or when the ratio does not fit a `Decimal`.
fn share_pct(profit: Decimal, total: Decimal) -> Option<f64> {
    if total <= Decimal::ZERO {
        return None;
    }
    profit
        .checked_div(total)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|share| share.to_f64())
}

fn profit_overflow(scope: &str) -> AnalysisError {
    AnalysisError::Computation(format!("profit sum for `{scope}` overflowed"))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShareShift {
    pub group: String,
    pub previous_share_pct: Option<f64>,
    pub current_share_pct: Option<f64>,
    /// Change in percentage points, when both shares are defined.
    pub change_pct_points: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub grouping: GroupingType,
    pub key: String,
    pub window_days: u32,
    pub previous: PeriodBreakdown,
    pub current: PeriodBreakdown,
    pub delta: Decimal,
    pub classification: Classification,
    pub share_shifts: Vec<ShareShift>,
    pub cannibalization_suspects: Vec<String>,
    pub note: Option<String>,
}

impl PeriodComparison {
    /// Sorted union of both periods' sub-group names.
    pub fn labels(&self) -> Vec<String> {
        self.previous
            .groups
            .iter()
            .chain(&self.current.groups)
            .map(|summary| summary.group.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Current window is `[today - N, today)`, previous is `[today - 2N, today - N)`.
pub fn comparison_windows(
    today: NaiveDate,
    window_days: u32,
) -> Result<(PeriodWindow, PeriodWindow), AnalysisError> {
    if window_days == 0 {
        return Err(AnalysisError::InvalidInput("comparison window must be at least 1 day".to_string()));
    }
    let span = Days::new(u64::from(window_days));
    let out_of_range =
        || AnalysisError::Computation(format!("comparison window of {window_days} days is out of range"));
    let current_start = today.checked_sub_days(span).ok_or_else(out_of_range)?;
    let previous_start = current_start.checked_sub_days(span).ok_or_else(out_of_range)?;

    Ok((
        PeriodWindow { start: previous_start, end: current_start },
        PeriodWindow { start: current_start, end: today },
    ))
}

pub fn compare(
    rows: &[CategorySale],
    grouping: GroupingType,
    key: &str,
    window_days: u32,
    today: NaiveDate,
) -> Result<PeriodComparison, AnalysisError> {
    if rows.is_empty() {
        return Err(AnalysisError::not_found(grouping.scope_label(), key));
    }
    let (previous_window, current_window) = comparison_windows(today, window_days)?;

    let previous = PeriodBreakdown::from_rows(
        previous_window,
        rows.iter().filter(|row| previous_window.contains(row.sale_date())),
        grouping,
    )?;
    let current = PeriodBreakdown::from_rows(
        current_window,
        rows.iter().filter(|row| current_window.contains(row.sale_date())),
        grouping,
    )?;
    if previous.is_empty() || current.is_empty() {
        return Err(AnalysisError::InsufficientData(format!(
            "{} `{key}` has no sales in {} window ({} to {})",
            grouping.scope_label(),
            if previous.is_empty() { "the previous" } else { "the current" },
            if previous.is_empty() { previous_window.start } else { current_window.start },
            if previous.is_empty() { previous_window.end } else { current_window.end },
        )));
    }

    let delta = current
        .total_profit
        .checked_sub(previous.total_profit)
        .ok_or_else(|| profit_overflow("period delta"))?;
    let classification = Classification::from_delta(delta);

    let labels: BTreeSet<&str> = previous
        .groups
        .iter()
        .chain(&current.groups)
        .map(|summary| summary.group.as_str())
        .collect();
    let share_shifts: Vec<ShareShift> = labels
        .into_iter()
        .map(|group| {
            let previous_share_pct = previous.share_of(group);
            let current_share_pct = current.share_of(group);
            let change_pct_points = previous_share_pct
                .zip(current_share_pct)
                .map(|(before, after)| after - before);
            ShareShift {
                group: group.to_string(),
                previous_share_pct,
                current_share_pct,
                change_pct_points,
            }
        })
        .collect();

    let (cannibalization_suspects, note) = match classification {
        Classification::Improved => (Vec::new(), None),
        Classification::Declined => (
            share_shifts
                .iter()
                .filter(|shift| shift.change_pct_points.is_some_and(|change| change > 0.0))
                .map(|shift| shift.group.clone())
                .collect(),
            Some(CANNIBALIZATION_NOTE.to_string()),
        ),
    };

    Ok(PeriodComparison {
        grouping,
        key: key.to_string(),
        window_days,
        previous,
        current,
        delta,
        classification,
        share_shifts,
        cannibalization_suspects,
        note,
    })
}
