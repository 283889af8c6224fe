use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::costing::{self, CostRollup, Ingredient, RecipeLine};
use crate::catalog::seed::MenuDefinition;
use crate::domain::analysis::GroupingType;
use crate::domain::product::{Product, ProductId};
use crate::domain::sales::{CategorySale, SalesObservation, SalesRecord};
use crate::errors::DataSourceError;

use super::SalesDataSource;

/// Serializable catalog + sales snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesSnapshot {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub sales: Vec<SalesRecord>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub recipes: Vec<RecipeLine>,
}

#[derive(Debug, Default)]
pub struct InMemorySalesData {
    snapshot: RwLock<SalesSnapshot>,
}

impl InMemorySalesData {
    pub fn new(snapshot: SalesSnapshot) -> Self {
        Self { snapshot: RwLock::new(snapshot) }
    }

    pub fn from_json(raw: &str) -> Result<Self, DataSourceError> {
        let snapshot: SalesSnapshot =
            serde_json::from_str(raw).map_err(|error| DataSourceError::Decode(error.to_string()))?;
        Ok(Self::new(snapshot))
    }

    pub fn snapshot(&self) -> Result<SalesSnapshot, DataSourceError> {
        Ok(self.read()?.clone())
    }

    pub fn products(&self) -> Result<Vec<Product>, DataSourceError> {
        Ok(self.read()?.products.clone())
    }

    pub fn append_sales(&self, records: Vec<SalesRecord>) -> Result<usize, DataSourceError> {
        let mut snapshot = self.write()?;
        let appended = records.len();
        snapshot.sales.extend(records);
        Ok(appended)
    }

    /// Re-derives every product's unit cost from the snapshot's recipes.
    ///
    /// Already-ingested sales keep the cost they were locked with.
    pub fn refresh_costs(&self) -> Result<CostRollup, DataSourceError> {
        let mut snapshot = self.write()?;
        let SalesSnapshot { products, ingredients, recipes, .. } = &mut *snapshot;
        Ok(costing::apply_rollup(products, ingredients, recipes))
    }

    /// Swaps in a new menu (catalog, ingredients, recipes) and rolls up its costs.
    ///
    /// Sales history is left in place, including rows for products the new menu drops.
    pub fn reset_menu(&self, menu: MenuDefinition) -> Result<CostRollup, DataSourceError> {
        let mut snapshot = self.write()?;
        snapshot.products = menu.products;
        snapshot.ingredients = menu.ingredients;
        snapshot.recipes = menu.recipes;
        let SalesSnapshot { products, ingredients, recipes, .. } = &mut *snapshot;
        Ok(costing::apply_rollup(products, ingredients, recipes))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, SalesSnapshot>, DataSourceError> {
        self.snapshot
            .read()
            .map_err(|_| DataSourceError::Unavailable("snapshot lock is poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, SalesSnapshot>, DataSourceError> {
        self.snapshot
            .write()
            .map_err(|_| DataSourceError::Unavailable("snapshot lock is poisoned".to_string()))
    }
}

impl SalesDataSource for InMemorySalesData {
    fn find_product(&self, name: &str) -> Result<Option<Product>, DataSourceError> {
        let snapshot = self.read()?;
        Ok(snapshot.products.iter().find(|product| product.name == name).cloned())
    }

    fn sales_observations(
        &self,
        product_id: &ProductId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<SalesObservation>, DataSourceError> {
        let snapshot = self.read()?;
        let mut observations: Vec<SalesObservation> = snapshot
            .sales
            .iter()
            .filter(|record| &record.product_id == product_id)
            .filter(|record| since.map_or(true, |since| record.sold_at >= since))
            .map(SalesRecord::observation)
            .collect();

        observations.sort_by_key(|observation| observation.sold_at);
        Ok(observations)
    }

    fn sales_with_category(
        &self,
        key: &str,
        grouping: GroupingType,
    ) -> Result<Vec<CategorySale>, DataSourceError> {
        let snapshot = self.read()?;
        let matching: HashMap<&ProductId, &Product> = snapshot
            .products
            .iter()
            .filter(|product| match grouping {
                GroupingType::ProductWithinCategory => product.category == key,
                GroupingType::CategoryWithinGroup => product.category_group == key,
            })
            .map(|product| (&product.id, product))
            .collect();

        let mut rows: Vec<CategorySale> = snapshot
            .sales
            .iter()
            .filter_map(|record| {
                let product = matching.get(&record.product_id)?;
                Some(CategorySale {
                    sold_at: record.sold_at,
                    product_name: product.name.clone(),
                    category_name: product.category.clone(),
                    revenue: record.revenue,
                    cost_at_sale: record.cost_at_sale,
                    profit: record.profit(),
                })
            })
            .collect();

        rows.sort_by_key(|row| row.sold_at);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use crate::catalog::costing::{Ingredient, RecipeLine};
    use crate::catalog::seed::demo_menu;
    use crate::domain::analysis::GroupingType;
    use crate::domain::product::{Product, ProductId};
    use crate::domain::sales::SalesRecord;
    use crate::errors::DataSourceError;
    use crate::source::{InMemorySalesData, SalesDataSource, SalesSnapshot};

    fn product(id: &str, name: &str, category: &str, group: &str) -> Product {
        Product {
            id: ProductId(id.to_owned()),
            name: name.to_owned(),
            external_name: name.to_uppercase(),
            unit_cost: Decimal::new(100, 0),
            listed_price: Decimal::new(250, 0),
            category: category.to_owned(),
            category_group: group.to_owned(),
        }
    }

    fn record(id: &str, day: u32, quantity: u32, revenue: i64) -> SalesRecord {
        SalesRecord {
            product_id: ProductId(id.to_owned()),
            sold_at: Utc.with_ymd_and_hms(2026, 10, day, 12, 0, 0).unwrap(),
            quantity,
            revenue: Decimal::new(revenue, 0),
            cost_at_sale: Decimal::from(quantity) * Decimal::new(100, 0),
        }
    }

    fn fixture() -> InMemorySalesData {
        InMemorySalesData::new(SalesSnapshot {
            products: vec![
                product("p-1", "Cheeseburger", "Burgers", "Mains"),
                product("p-2", "Steak Burger", "Burgers", "Mains"),
                product("p-3", "Tomato Soup", "Starters", "Starters"),
            ],
            sales: vec![
                record("p-1", 3, 2, 500),
                record("p-1", 1, 1, 250),
                record("p-2", 2, 1, 400),
                record("p-3", 2, 3, 270),
            ],
            ingredients: Vec::new(),
            recipes: Vec::new(),
        })
    }

    #[test]
    fn finds_product_by_display_name() {
        let data = fixture();

        let found = data.find_product("Steak Burger").expect("lookup");
        assert_eq!(found.map(|product| product.id), Some(ProductId("p-2".to_owned())));
        assert_eq!(data.find_product("Pizza").expect("lookup"), None);
    }

    #[test]
    fn observations_are_ordered_and_respect_since() {
        let data = fixture();
        let product_id = ProductId("p-1".to_owned());

        let all = data.sales_observations(&product_id, None).expect("observations");
        assert_eq!(all.len(), 2);
        assert!(all[0].sold_at < all[1].sold_at);

        let since = Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap() + Duration::hours(1);
        let recent = data.sales_observations(&product_id, Some(since)).expect("observations");
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].quantity, 2);
    }

    #[test]
    fn category_rows_join_catalog_placement() {
        let data = fixture();

        let burgers = data
            .sales_with_category("Burgers", GroupingType::ProductWithinCategory)
            .expect("rows");
        assert_eq!(burgers.len(), 3);
        assert!(burgers.iter().all(|row| row.category_name == "Burgers"));

        let mains =
            data.sales_with_category("Mains", GroupingType::CategoryWithinGroup).expect("rows");
        assert_eq!(mains.len(), 3);
        assert_eq!(mains[0].profit, Decimal::new(150, 0));

        let unknown =
            data.sales_with_category("Desserts", GroupingType::ProductWithinCategory).expect("rows");
        assert!(unknown.is_empty());
    }

    #[test]
    fn refresh_costs_rolls_up_recipes_into_products() {
        let data = InMemorySalesData::new(SalesSnapshot {
            products: vec![product("p-1", "Cheeseburger", "Burgers", "Mains")],
            sales: vec![record("p-1", 1, 1, 250)],
            ingredients: vec![Ingredient {
                name: "Patty mix".to_owned(),
                unit: "kg".to_owned(),
                unit_cost: Decimal::new(1200, 0),
            }],
            recipes: vec![RecipeLine {
                product_name: "Cheeseburger".to_owned(),
                ingredient_name: "Patty mix".to_owned(),
                quantity: Decimal::new(150, 3),
            }],
        });

        let rollup = data.refresh_costs().expect("rollup");
        assert_eq!(rollup.updated_products, 1);

        let snapshot = data.snapshot().expect("snapshot");
        assert_eq!(snapshot.products[0].unit_cost, Decimal::new(180, 0));
        assert_eq!(snapshot.sales[0].cost_at_sale, Decimal::new(100, 0));
    }

    #[test]
    fn reset_menu_replaces_catalog_but_keeps_sales() {
        let data = fixture();

        let rollup = data.reset_menu(demo_menu()).expect("reset");
        assert!(rollup.unmatched_lines.is_empty());

        let snapshot = data.snapshot().expect("snapshot");
        assert_eq!(snapshot.sales.len(), 4);
        assert!(snapshot.products.iter().all(|product| product.has_positive_cost()));
        assert_eq!(data.find_product("Tomato Soup").expect("lookup"), None);
        assert!(data.find_product("Lemonade").expect("lookup").is_some());
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let error = InMemorySalesData::from_json("{\"products\": 7}").expect_err("must fail");
        assert!(matches!(error, DataSourceError::Decode(_)));
    }
}
