//! Label/series pairs handed to whatever draws the charts.

use serde::{Deserialize, Serialize};

use crate::domain::analysis::PriceCurvePoint;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub name: String,
    pub values: Vec<f64>,
}

/// Every dataset carries exactly one value per label.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

impl ChartSeries {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels, datasets: Vec::new() }
    }

    /// Appends a dataset, padding with zeros or truncating to the label count.
    pub fn with_dataset(mut self, name: impl Into<String>, mut values: Vec<f64>) -> Self {
        values.resize(self.labels.len(), 0.0);
        self.datasets.push(ChartDataset { name: name.into(), values });
        self
    }

    /// Price axis with predicted profit and quantity per candidate.
    pub fn from_curve(points: &[PriceCurvePoint]) -> Self {
        let labels = points.iter().map(|point| format!("{:.2}", point.price)).collect();
        Self::new(labels)
            .with_dataset("predicted_profit", points.iter().map(|point| point.profit).collect())
            .with_dataset("predicted_quantity", points.iter().map(|point| point.quantity).collect())
    }

    pub fn dataset(&self, name: &str) -> Option<&ChartDataset> {
        self.datasets.iter().find(|dataset| dataset.name == name)
    }

    /// A series with no labels has nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
