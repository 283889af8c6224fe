//! Read-only data access consumed by the analyses.
//!
//! Every analysis call pulls a fresh snapshot through this trait; nothing is cached
//! between calls, so implementations only need to be safe for concurrent reads.

use chrono::{DateTime, Utc};

use crate::domain::analysis::GroupingType;
use crate::domain::product::{Product, ProductId};
use crate::domain::sales::{CategorySale, SalesObservation};
use crate::errors::DataSourceError;

pub mod memory;

pub use memory::{InMemorySalesData, SalesSnapshot};

pub trait SalesDataSource: Send + Sync {
    /// Looks a product up by its display name.
    fn find_product(&self, name: &str) -> Result<Option<Product>, DataSourceError>;

    /// Observations for one product ordered by timestamp, optionally limited to sales at or
    /// after `since`.
    fn sales_observations(
        &self,
        product_id: &ProductId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<SalesObservation>, DataSourceError>;

    /// Sales joined with catalog placement for every product in the category
    /// (`ProductWithinCategory`) or category group (`CategoryWithinGroup`) named by `key`.
    fn sales_with_category(
        &self,
        key: &str,
        grouping: GroupingType,
    ) -> Result<Vec<CategorySale>, DataSourceError>;
}

impl<S: SalesDataSource + ?Sized> SalesDataSource for &S {
    fn find_product(&self, name: &str) -> Result<Option<Product>, DataSourceError> {
        (**self).find_product(name)
    }

    fn sales_observations(
        &self,
        product_id: &ProductId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<SalesObservation>, DataSourceError> {
        (**self).sales_observations(product_id, since)
    }

    fn sales_with_category(
        &self,
        key: &str,
        grouping: GroupingType,
    ) -> Result<Vec<CategorySale>, DataSourceError> {
        (**self).sales_with_category(key, grouping)
    }
}
