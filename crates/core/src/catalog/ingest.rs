use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::product::Product;
use crate::domain::sales::SalesRecord;

/// A sales row as handed over by the upload layer, after column validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRow {
    pub external_name: String,
    pub quantity: i64,
    pub total_amount: Decimal,
    pub sold_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionBatch {
    pub records: Vec<SalesRecord>,
    pub skipped_non_positive_quantity: usize,
    pub unrecognized: BTreeSet<String>,
}

impl IngestionBatch {
    pub fn is_clean(&self) -> bool {
        self.skipped_non_positive_quantity == 0 && self.unrecognized.is_empty()
    }
}

/// Matches rows to products by external name and locks `cost_at_sale` from the
/// product's current unit cost. Later cost changes never touch these records.
pub fn lock_sales(rows: &[SalesRow], products: &[Product]) -> IngestionBatch {
    let by_external_name: HashMap<&str, &Product> =
        products.iter().map(|product| (product.external_name.as_str(), product)).collect();

    let mut batch = IngestionBatch::default();
    for row in rows {
        let quantity = match u32::try_from(row.quantity) {
            Ok(quantity) if quantity > 0 => quantity,
            _ => {
                batch.skipped_non_positive_quantity += 1;
                continue;
            }
        };

        let Some(product) = by_external_name.get(row.external_name.trim()) else {
            batch.unrecognized.insert(row.external_name.trim().to_string());
            continue;
        };

        batch.records.push(SalesRecord {
            product_id: product.id.clone(),
            sold_at: row.sold_at,
            quantity,
            revenue: row.total_amount,
            cost_at_sale: product.unit_cost * Decimal::from(quantity),
        });
    }

    if !batch.unrecognized.is_empty() {
        warn!(
            event_name = "catalog.ingest.unrecognized_products",
            unrecognized = batch.unrecognized.len(),
            "sales rows reference products missing from the catalog"
        );
    }
    info!(
        event_name = "catalog.ingest.completed",
        rows = rows.len(),
        accepted = batch.records.len(),
        skipped = batch.skipped_non_positive_quantity,
        "sales rows locked"
    );

    batch
}
