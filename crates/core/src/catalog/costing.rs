use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::product::Product;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub unit: String,
    pub unit_cost: Decimal,
}

/// `quantity` of `ingredient_name` (in the ingredient's unit) used by one portion of `product_name`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub product_name: String,
    pub ingredient_name: String,
    pub quantity: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRollup {
    pub updated_products: usize,
    pub costs: BTreeMap<String, Decimal>,
    /// Recipe lines whose ingredient is not in the ingredient list, as `product/ingredient`.
    pub unmatched_lines: BTreeSet<String>,
}

/// Portion cost of a single product: sum of line quantity times ingredient unit cost.
pub fn recipe_cost<'a>(
    product_name: &str,
    ingredients: &BTreeMap<&'a str, &'a Ingredient>,
    recipes: &[RecipeLine],
    unmatched: &mut BTreeSet<String>,
) -> Decimal {
    recipes
        .iter()
        .filter(|line| line.product_name == product_name)
        .filter_map(|line| match ingredients.get(line.ingredient_name.as_str()) {
            Some(ingredient) => Some(line.quantity * ingredient.unit_cost),
            None => {
                unmatched.insert(format!("{}/{}", line.product_name, line.ingredient_name));
                None
            }
        })
        .sum()
}

/// Recomputes `unit_cost` for every product. Products without recipe lines end up at zero,
/// which the analyses treat as "cost not configured".
pub fn apply_rollup(
    products: &mut [Product],
    ingredients: &[Ingredient],
    recipes: &[RecipeLine],
) -> CostRollup {
    let by_name: BTreeMap<&str, &Ingredient> =
        ingredients.iter().map(|ingredient| (ingredient.name.as_str(), ingredient)).collect();

    let mut rollup = CostRollup::default();
    for product in products.iter_mut() {
        let cost = recipe_cost(&product.name, &by_name, recipes, &mut rollup.unmatched_lines);
        if product.unit_cost != cost {
            rollup.updated_products += 1;
        }
        product.unit_cost = cost;
        rollup.costs.insert(product.name.clone(), cost);
    }

    let known: BTreeSet<&str> = products.iter().map(|product| product.name.as_str()).collect();
    for line in recipes.iter().filter(|line| !known.contains(line.product_name.as_str())) {
        rollup.unmatched_lines.insert(format!("{}/{}", line.product_name, line.ingredient_name));
    }

    if !rollup.unmatched_lines.is_empty() {
        warn!(
            event_name = "catalog.costing.unmatched_lines",
            unmatched = rollup.unmatched_lines.len(),
            "recipe lines skipped during cost rollup"
        );
    }
    info!(
        event_name = "catalog.costing.completed",
        products = products.len(),
        updated = rollup.updated_products,
        "product costs recomputed from recipes"
    );

    rollup
}
