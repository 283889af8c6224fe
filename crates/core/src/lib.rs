pub mod catalog;
pub mod chart;
pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;
pub mod report;
pub mod source;

pub use catalog::costing::{CostRollup, Ingredient, RecipeLine};
pub use catalog::ingest::{IngestionBatch, SalesRow};
pub use catalog::seed::MenuDefinition;
pub use chart::{ChartDataset, ChartSeries};
pub use config::{AnalysisConfig, AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::analysis::{GroupingType, PeriodSummary, PriceBucket, PriceCurvePoint};
pub use domain::product::{Product, ProductId};
pub use domain::sales::{CategorySale, SalesObservation, SalesRecord};
pub use errors::{AnalysisError, DataSourceError};
pub use pricing::{
    AnalysisRequest, AnalysisWarning, Classification, DemandModel, MarginTarget,
    OptimumPriceReport, PeriodComparison, PriceSimulation, PricingAnalyzer, ProfitOutlook,
};
pub use report::{AnalysisOutcome, Report};
pub use source::{InMemorySalesData, SalesDataSource, SalesSnapshot};
