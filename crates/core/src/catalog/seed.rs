use chrono::{Datelike, Days, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::costing::{Ingredient, RecipeLine};
use crate::catalog::ingest::SalesRow;
use crate::domain::product::{Product, ProductId};

/// Full menu definition that replaces a snapshot's catalog, ingredients and recipes at once.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuDefinition {
    pub ingredients: Vec<Ingredient>,
    pub products: Vec<Product>,
    pub recipes: Vec<RecipeLine>,
}

const DEMO_INGREDIENTS: [(&str, &str, i64); 9] = [
    ("Patty mix", "kg", 1200),
    ("Steak patty", "kg", 1400),
    ("Bun", "piece", 15),
    ("Cheddar", "kg", 700),
    ("Chicken breast", "kg", 450),
    ("Tortilla", "piece", 12),
    ("Lemon", "kg", 60),
    ("Sugar", "kg", 40),
    ("Tea leaves", "kg", 500),
];

// id, name, external name, listed price, category, group, base daily quantity
const DEMO_PRODUCTS: [(&str, &str, &str, i64, &str, &str, i64); 5] = [
    ("cheeseburger", "Cheeseburger", "CHEESEBURGER", 250, "Burgers", "Mains", 40),
    ("steak-burger", "Steak Burger", "STEAK BURGER", 320, "Burgers", "Mains", 25),
    ("chicken-wrap", "Chicken Wrap", "CHICKEN WRAP", 190, "Wraps", "Mains", 30),
    ("lemonade", "Lemonade", "LEMONADE", 80, "Drinks", "Beverages", 60),
    ("iced-tea", "Iced Tea", "ICED TEA", 70, "Drinks", "Beverages", 50),
];

// product, ingredient, quantity mantissa, quantity scale
const DEMO_RECIPES: [(&str, &str, i64, u32); 11] = [
    ("Cheeseburger", "Patty mix", 150, 3),
    ("Cheeseburger", "Bun", 1, 0),
    ("Cheeseburger", "Cheddar", 20, 3),
    ("Steak Burger", "Steak patty", 150, 3),
    ("Steak Burger", "Bun", 1, 0),
    ("Chicken Wrap", "Chicken breast", 150, 3),
    ("Chicken Wrap", "Tortilla", 1, 0),
    ("Lemonade", "Lemon", 200, 3),
    ("Lemonade", "Sugar", 30, 3),
    ("Iced Tea", "Tea leaves", 10, 3),
    ("Iced Tea", "Sugar", 30, 3),
];

/// Price levels cycled week by week, as a percentage of the listed price, paired with the
/// change in daily quantity they produce.
const DEMO_PRICE_LEVELS: [(i64, i64); 3] = [(90, 6), (100, 0), (110, -5)];

/// A small two-group menu (burgers and wraps under Mains, drinks under Beverages). Unit costs
/// are left at zero; the recipe rollup fills them in.
pub fn demo_menu() -> MenuDefinition {
    let ingredients = DEMO_INGREDIENTS
        .iter()
        .map(|(name, unit, cost)| Ingredient {
            name: (*name).to_owned(),
            unit: (*unit).to_owned(),
            unit_cost: Decimal::new(*cost, 0),
        })
        .collect();

    let products = DEMO_PRODUCTS
        .iter()
        .map(|(id, name, external_name, price, category, group, _)| Product {
            id: ProductId((*id).to_owned()),
            name: (*name).to_owned(),
            external_name: (*external_name).to_owned(),
            unit_cost: Decimal::ZERO,
            listed_price: Decimal::new(*price, 0),
            category: (*category).to_owned(),
            category_group: (*group).to_owned(),
        })
        .collect();

    let recipes = DEMO_RECIPES
        .iter()
        .map(|(product, ingredient, quantity, scale)| RecipeLine {
            product_name: (*product).to_owned(),
            ingredient_name: (*ingredient).to_owned(),
            quantity: Decimal::new(*quantity, *scale),
        })
        .collect();

    MenuDefinition { ingredients, products, recipes }
}

/// One row per product per day for the `days` days ending at `end` (inclusive).
///
/// The price moves between three levels each week and quantity falls as price rises, so every
/// demo product supports a valid demand model. Products without a demo base quantity get none.
pub fn demo_sales_rows(products: &[Product], end: NaiveDate, days: u32) -> Vec<SalesRow> {
    let mut rows = Vec::new();
    for offset in (0..days).rev() {
        let Some(date) = end.checked_sub_days(Days::new(u64::from(offset))) else {
            continue;
        };
        let Some(noon) = date.and_hms_opt(13, 0, 0) else {
            continue;
        };
        let sold_at = Utc.from_utc_datetime(&noon);
        let (percent, quantity_shift) =
            DEMO_PRICE_LEVELS[(offset / 7) as usize % DEMO_PRICE_LEVELS.len()];
        let weekday_bump = i64::from(date.weekday().num_days_from_monday() % 3);

        for product in products {
            let Some(base) = base_quantity(&product.external_name) else {
                continue;
            };
            let unit_price = (product.listed_price * Decimal::new(percent, 2)).round_dp(2);
            let quantity = (base + quantity_shift + weekday_bump).max(1);
            rows.push(SalesRow {
                external_name: product.external_name.clone(),
                quantity,
                total_amount: unit_price * Decimal::from(quantity),
                sold_at,
            });
        }
    }
    rows
}

fn base_quantity(external_name: &str) -> Option<i64> {
    DEMO_PRODUCTS
        .iter()
        .find(|(_, _, name, ..)| *name == external_name)
        .map(|(.., base)| *base)
}
