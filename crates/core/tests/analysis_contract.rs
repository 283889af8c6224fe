use chrono::{NaiveDate, TimeZone, Utc};
use menuwise_core::{
    AnalysisConfig, AnalysisError, AnalysisRequest, AnalysisWarning, Classification,
    GroupingType, InMemorySalesData, PricingAnalyzer, Product, ProductId, SalesRecord,
    SalesSnapshot,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

type ContractResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
}

const TODAY: (i32, u32, u32) = (2026, 10, 15);

fn today() -> ContractResult<NaiveDate> {
    NaiveDate::from_ymd_opt(TODAY.0, TODAY.1, TODAY.2).ok_or_else(|| "invalid fixture date".to_string())
}

fn product(id: &str, name: &str, cost: i64, listed: i64, category: &str) -> Product {
    Product {
        id: ProductId(id.to_owned()),
        name: name.to_owned(),
        external_name: name.to_uppercase(),
        unit_cost: Decimal::new(cost, 0),
        listed_price: Decimal::new(listed, 0),
        category: category.to_owned(),
        category_group: "Mains".to_owned(),
    }
}

fn sale(id: &str, day: u32, quantity: u32, unit_price: i64, unit_cost: i64) -> ContractResult<SalesRecord> {
    let sold_at = Utc
        .with_ymd_and_hms(TODAY.0, TODAY.1, day, 12, 0, 0)
        .single()
        .ok_or_else(|| format!("invalid fixture day {day}"))?;
    Ok(SalesRecord {
        product_id: ProductId(id.to_owned()),
        sold_at,
        quantity,
        revenue: Decimal::new(unit_price * i64::from(quantity), 0),
        cost_at_sale: Decimal::new(unit_cost * i64::from(quantity), 0),
    })
}

/// Burgers: a well-behaved falling curve. Wraps: demand rises with price.
/// Soup: one price only. Fries: costed above every observed price.
fn fixture_data() -> ContractResult<InMemorySalesData> {
    let sales = vec![
        sale("burger", 1, 100, 10, 4)?,
        sale("burger", 2, 100, 10, 4)?,
        sale("burger", 3, 80, 12, 4)?,
        sale("burger", 4, 80, 12, 4)?,
        sale("wrap", 1, 50, 10, 5)?,
        sale("wrap", 2, 70, 12, 5)?,
        sale("soup", 1, 30, 9, 3)?,
        sale("soup", 2, 32, 9, 3)?,
        sale("fries", 1, 40, 5, 50)?,
        sale("fries", 2, 35, 6, 50)?,
    ];
    let data = InMemorySalesData::new(SalesSnapshot {
        products: vec![
            product("burger", "Cheeseburger", 4, 11, "Burgers"),
            product("wrap", "Chicken Wrap", 5, 11, "Wraps"),
            product("soup", "Tomato Soup", 3, 9, "Soups"),
            product("fries", "Truffle Fries", 50, 6, "Sides"),
        ],
        sales,
        ..SalesSnapshot::default()
    });
    Ok(data)
}

fn fixture() -> ContractResult<PricingAnalyzer<InMemorySalesData>> {
    Ok(PricingAnalyzer::new(fixture_data()?, AnalysisConfig::default()).with_reference_date(today()?))
}

#[test]
fn borrowed_source_sees_sales_appended_after_construction() -> ContractResult {
    let data = fixture_data()?;
    let analyzer = PricingAnalyzer::new(&data, AnalysisConfig::default()).with_reference_date(today()?);

    require!(matches!(
        analyzer.price_buckets("Tomato Soup"),
        Err(AnalysisError::InsufficientData(_))
    ));

    let appended = analyzer
        .source()
        .append_sales(vec![sale("soup", 3, 20, 11, 3)?, sale("soup", 4, 22, 11, 3)?])
        .map_err(|error| format!("append failed: {error}"))?;
    require_eq!(appended, 2);

    let buckets = analyzer
        .price_buckets("Tomato Soup")
        .map_err(|error| format!("buckets failed: {error}"))?;
    require_eq!(buckets.len(), 2);

    let outcome = analyzer.run(&AnalysisRequest::OptimumPrice { product: "Tomato Soup".to_owned() });
    require!(outcome.success, "optimum failed: {}", outcome.report_text);
    let labels = outcome.chart.map(|chart| chart.labels.len());
    require_eq!(labels, Some(analyzer.settings().grid_points));

    let snapshot = data.snapshot().map_err(|error| format!("snapshot failed: {error}"))?;
    require_eq!(snapshot.sales.len(), 12);
    Ok(())
}

#[test]
fn cost_100_margin_25_requires_133_33() -> ContractResult {
    let mut data = SalesSnapshot::default();
    data.products.push(product("steak", "Ribeye", 100, 150, "Grill"));
    let analyzer = PricingAnalyzer::new(InMemorySalesData::new(data), AnalysisConfig::default());

    let target = analyzer
        .target_price("Ribeye", Decimal::new(25, 0))
        .map_err(|error| format!("target price failed: {error}"))?;
    require_eq!(target.required_price.round_dp(2), Decimal::new(13333, 2));

    let price = target.required_price.to_f64().unwrap_or(f64::NAN);
    require!(((price - 100.0) / price - 0.25).abs() < 1e-9, "achieved margin drifted: {price}");
    Ok(())
}

#[test]
fn falling_two_point_curve_interpolates_between_observations() -> ContractResult {
    let analyzer = fixture()?;

    let simulation = analyzer
        .simulate_price_change("Cheeseburger", 11.0)
        .map_err(|error| format!("simulation failed: {error}"))?;

    require!(simulation.model.slope < 0.0, "slope should be negative: {}", simulation.model.slope);
    require!(
        simulation.predicted_quantity > 80.0 && simulation.predicted_quantity < 100.0,
        "prediction at 11 should sit between 80 and 100, got {}",
        simulation.predicted_quantity
    );
    Ok(())
}

#[test]
fn single_price_history_is_insufficient_for_every_model_path() -> ContractResult {
    let analyzer = fixture()?;

    require!(matches!(
        analyzer.price_buckets("Tomato Soup"),
        Err(AnalysisError::InsufficientData(_))
    ));
    require!(matches!(
        analyzer.simulate_price_change("Tomato Soup", 10.0),
        Err(AnalysisError::InsufficientData(_))
    ));
    require!(matches!(
        analyzer.find_optimum_price("Tomato Soup"),
        Err(AnalysisError::InsufficientData(_))
    ));
    Ok(())
}

#[test]
fn rising_curve_aborts_simulation_but_optimum_falls_back() -> ContractResult {
    let analyzer = fixture()?;

    require!(matches!(
        analyzer.simulate_price_change("Chicken Wrap", 11.0),
        Err(AnalysisError::ModelInvalid(_))
    ));

    let report = analyzer
        .find_optimum_price("Chicken Wrap")
        .map_err(|error| format!("optimum failed: {error}"))?;
    require!(report.used_fallback);
    require!(report
        .warnings
        .iter()
        .any(|warning| matches!(warning, AnalysisWarning::FlatAverageFallback { .. })));
    require!(
        report.curve.iter().all(|point| (point.quantity - 60.0).abs() < 1e-9),
        "fallback should score every candidate with the flat average"
    );
    Ok(())
}

#[test]
fn optimum_never_drops_below_cost_floor() -> ContractResult {
    let analyzer = fixture()?;

    for name in ["Cheeseburger", "Chicken Wrap"] {
        let report =
            analyzer.find_optimum_price(name).map_err(|error| format!("{name}: {error}"))?;
        require!(
            report.optimum.price >= report.unit_cost * 1.10 - 1e-9,
            "{name}: optimum {} below cost floor",
            report.optimum.price
        );
        require!(report.curve.iter().all(|point| point.quantity >= 0.0));
    }

    require!(matches!(
        analyzer.find_optimum_price("Truffle Fries"),
        Err(AnalysisError::InvalidInput(_))
    ));
    Ok(())
}

#[test]
fn period_totals_600_then_500_decline_by_100() -> ContractResult {
    let data = InMemorySalesData::new(SalesSnapshot {
        products: vec![
            product("burger", "Cheeseburger", 4, 11, "Burgers"),
            product("steak", "Steak Burger", 8, 18, "Burgers"),
        ],
        sales: vec![
            sale("burger", 2, 50, 10, 4)?,
            sale("steak", 3, 30, 18, 8)?,
            sale("burger", 9, 50, 10, 4)?,
            sale("steak", 11, 20, 18, 8)?,
        ],
        ..SalesSnapshot::default()
    });
    let analyzer = PricingAnalyzer::new(data, AnalysisConfig::default()).with_reference_date(today()?);

    let comparison = analyzer
        .compare_periods(GroupingType::ProductWithinCategory, "Burgers", Some(7))
        .map_err(|error| format!("comparison failed: {error}"))?;

    require_eq!(comparison.previous.total_profit, Decimal::new(600, 0));
    require_eq!(comparison.current.total_profit, Decimal::new(500, 0));
    require_eq!(comparison.delta, Decimal::new(-100, 0));
    require_eq!(comparison.classification, Classification::Declined);
    require_eq!(comparison.cannibalization_suspects, vec!["Cheeseburger".to_owned()]);

    for period in [&comparison.previous, &comparison.current] {
        let summed: Decimal = period.groups.iter().map(|group| group.profit).sum();
        require_eq!(summed, period.total_profit);
    }
    Ok(())
}

#[test]
fn outcomes_carry_charts_only_on_success() -> ContractResult {
    let analyzer = fixture()?;

    let success = analyzer.run(&AnalysisRequest::SimulatePrice {
        product: "Cheeseburger".to_owned(),
        proposed_price: 12.0,
    });
    require!(success.success, "simulation should succeed: {}", success.report_text);
    let chart = success.chart.ok_or_else(|| "chart missing".to_string())?;
    require!(chart.datasets.iter().all(|dataset| dataset.values.len() == chart.labels.len()));

    let failure = analyzer.run(&AnalysisRequest::SimulatePrice {
        product: "Chicken Wrap".to_owned(),
        proposed_price: 12.0,
    });
    require!(!failure.success);
    require!(failure.chart.is_none());
    require_eq!(failure.error_class.as_deref(), Some("model_invalid"));

    let missing = analyzer.run(&AnalysisRequest::TargetMargin {
        product: "Pizza".to_owned(),
        margin_pct: Decimal::new(30, 0),
    });
    require_eq!(missing.error_class.as_deref(), Some("not_found"));
    Ok(())
}
