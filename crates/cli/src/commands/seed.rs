use std::path::Path;

use chrono::{NaiveDate, Utc};
use menuwise_core::catalog::ingest::lock_sales;
use menuwise_core::catalog::seed::{demo_menu, demo_sales_rows};
use menuwise_core::{CostRollup, InMemorySalesData};
use serde::Serialize;
use tracing::info;

use crate::commands::{
    data_failure, load_config, read_snapshot, write_snapshot, CommandResult, GlobalOptions,
};

#[derive(Debug, Serialize)]
struct SeedPayload<'a> {
    command: &'a str,
    status: &'a str,
    products: usize,
    kept_sales: usize,
    appended_sales: usize,
    rollup: &'a CostRollup,
}

struct SeedOutput {
    products: usize,
    kept_sales: usize,
    appended_sales: usize,
    rollup: CostRollup,
}

/// Replaces the snapshot's menu with the demo menu and recomputes costs. Existing sales are
/// kept; `sales_days` additionally appends that many days of demo sales ending today.
pub fn run(global: &GlobalOptions, sales_days: Option<u32>) -> CommandResult {
    let config = match load_config("seed", global) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let path = config.data.snapshot_path;
    let today = global.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let output = match seed_snapshot(&path, sales_days.map(|days| (today, days))) {
        Ok(output) => output,
        Err(error) => return data_failure("seed", &error),
    };
    info!(
        event_name = "cli.seed.completed",
        snapshot = %path.display(),
        products = output.products,
        appended_sales = output.appended_sales,
        "demo menu written to snapshot"
    );

    if global.json {
        let payload = SeedPayload {
            command: "seed",
            status: "ok",
            products: output.products,
            kept_sales: output.kept_sales,
            appended_sales: output.appended_sales,
            rollup: &output.rollup,
        };
        return match serde_json::to_string_pretty(&payload) {
            Ok(output) => CommandResult { exit_code: 0, output },
            Err(error) => CommandResult::failure("seed", "serialization", error.to_string(), 1),
        };
    }

    let mut lines = vec![format!(
        "demo menu installed: {} product(s), {} existing sale(s) kept, {} demo sale(s) added",
        output.products, output.kept_sales, output.appended_sales
    )];
    lines.extend(
        output.rollup.costs.iter().map(|(product, cost)| format!("- {product} = {:.2}", cost.round_dp(2))),
    );
    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn seed_snapshot(
    path: &Path,
    demo_sales: Option<(NaiveDate, u32)>,
) -> anyhow::Result<SeedOutput> {
    let data = if path.exists() { read_snapshot(path)? } else { InMemorySalesData::default() };
    let kept_sales = data.snapshot()?.sales.len();

    let rollup = data.reset_menu(demo_menu())?;
    let products = data.products()?;

    let appended_sales = match demo_sales {
        Some((end, days)) => {
            let batch = lock_sales(&demo_sales_rows(&products, end, days), &products);
            data.append_sales(batch.records)?
        }
        None => 0,
    };

    write_snapshot(path, &data.snapshot()?)?;
    Ok(SeedOutput { products: products.len(), kept_sales, appended_sales, rollup })
}
