pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use menuwise_core::{AnalysisRequest, GroupingType};
use rust_decimal::Decimal;

use crate::commands::{CommandResult, GlobalOptions};

#[derive(Debug, Parser)]
#[command(
    name = "menuwise",
    about = "Menuwise pricing analysis CLI",
    long_about = "Run price-demand analyses against a menu data snapshot: target prices, price change simulation, optimum price search, and period comparison.",
    after_help = "Examples:\n  menuwise target-price --product Cheeseburger --margin 35\n  menuwise optimum --product Cheeseburger --json\n  menuwise compare --grouping category --key Burgers --days 14\n  menuwise seed --sales-days 28"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file (defaults to menuwise.toml or config/menuwise.toml)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Data snapshot JSON, overriding data.snapshot_path")]
    data: Option<PathBuf>,
    #[arg(long = "as-of", global = true, help = "Reference date (YYYY-MM-DD) used as today")]
    as_of: Option<NaiveDate>,
    #[arg(long, global = true, help = "Emit machine-readable JSON output")]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Price needed to reach a target margin on the product's current cost")]
    TargetPrice {
        #[arg(long)]
        product: String,
        #[arg(long, help = "Target margin percentage, strictly between 0 and 100")]
        margin: Decimal,
    },
    #[command(about = "Predict quantity and daily profit at a proposed price")]
    Simulate {
        #[arg(long)]
        product: String,
        #[arg(long)]
        price: f64,
    },
    #[command(about = "Search the demand curve for the most profitable price")]
    Optimum {
        #[arg(long)]
        product: String,
    },
    #[command(about = "Compare profit by sub-group across two adjacent windows")]
    Compare {
        #[arg(long, help = "product-within-category (category) or category-within-group (group)")]
        grouping: GroupingType,
        #[arg(long, help = "Category or category group name")]
        key: String,
        #[arg(long, help = "Window length in days (defaults to analysis.comparison_window_days)")]
        days: Option<u32>,
    },
    #[command(about = "Recompute product costs from recipes")]
    Costs {
        #[arg(long, help = "Persist recomputed costs back into the snapshot")]
        write: bool,
    },
    #[command(about = "Append validated sales rows to the snapshot with costs locked in")]
    Ingest {
        #[arg(long, help = "JSON array of sales rows")]
        rows: PathBuf,
    },
    #[command(about = "Replace the snapshot's menu with the demo menu, keeping sales history")]
    Seed {
        #[arg(long = "sales-days", help = "Also append this many days of demo sales ending today")]
        sales_days: Option<u32>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

impl Cli {
    pub fn global_options(&self) -> GlobalOptions {
        GlobalOptions {
            config_path: self.config.clone(),
            data_path: self.data.clone(),
            as_of: self.as_of,
            json: self.json,
        }
    }
}

pub fn execute(cli: Cli) -> CommandResult {
    let global = cli.global_options();

    match cli.command {
        Command::TargetPrice { product, margin } => commands::analyze::run(
            "target-price",
            &global,
            AnalysisRequest::TargetMargin { product, margin_pct: margin },
        ),
        Command::Simulate { product, price } => commands::analyze::run(
            "simulate",
            &global,
            AnalysisRequest::SimulatePrice { product, proposed_price: price },
        ),
        Command::Optimum { product } => {
            commands::analyze::run("optimum", &global, AnalysisRequest::OptimumPrice { product })
        }
        Command::Compare { grouping, key, days } => commands::analyze::run(
            "compare",
            &global,
            AnalysisRequest::ComparePeriods { grouping, key, window_days: days },
        ),
        Command::Costs { write } => commands::costs::run(&global, write),
        Command::Ingest { rows } => commands::ingest::run(&global, &rows),
        Command::Seed { sales_days } => commands::seed::run(&global, sales_days),
        Command::Config => commands::config::run(&global),
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let result = execute(cli);

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
