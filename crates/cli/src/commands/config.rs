use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use menuwise_core::config::AppConfig;
use toml::Value;

use crate::commands::{CommandResult, GlobalOptions, EXIT_CONFIG_INVALID};

/// Prints every effective setting with where it came from.
pub fn run(global: &GlobalOptions) -> CommandResult {
    let config = match AppConfig::load(global.load_options()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult {
                exit_code: EXIT_CONFIG_INVALID,
                output: format!("config validation failed: {error}"),
            }
        }
    };

    let config_file_path = detect_config_path(global.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str], cli_flag: Option<&str>| {
        field_source(key_path, env_keys, cli_flag, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let analysis = &config.analysis;
    let lookback = analysis.lookback_days.map_or_else(|| "<all history>".to_string(), |days| days.to_string());
    let snapshot_flag = global.data_path.as_ref().map(|_| "--data");

    let lines = [
        "effective config (source precedence: cli > env > file > default):".to_string(),
        render_line(
            "analysis.price_step",
            &analysis.price_step.to_string(),
            source("analysis.price_step", &["MENUWISE_ANALYSIS_PRICE_STEP"], None),
        ),
        render_line(
            "analysis.lookback_days",
            &lookback,
            source("analysis.lookback_days", &["MENUWISE_ANALYSIS_LOOKBACK_DAYS"], None),
        ),
        render_line(
            "analysis.comparison_window_days",
            &analysis.comparison_window_days.to_string(),
            source(
                "analysis.comparison_window_days",
                &["MENUWISE_ANALYSIS_COMPARISON_WINDOW_DAYS"],
                None,
            ),
        ),
        render_line(
            "analysis.grid_points",
            &analysis.grid_points.to_string(),
            source("analysis.grid_points", &["MENUWISE_ANALYSIS_GRID_POINTS"], None),
        ),
        render_line(
            "analysis.currency",
            &analysis.currency,
            source("analysis.currency", &["MENUWISE_ANALYSIS_CURRENCY"], None),
        ),
        render_line(
            "data.snapshot_path",
            &config.data.snapshot_path.display().to_string(),
            source("data.snapshot_path", &["MENUWISE_DATA_SNAPSHOT_PATH"], snapshot_flag),
        ),
        render_line(
            "logging.level",
            &config.logging.level,
            source("logging.level", &["MENUWISE_LOGGING_LEVEL", "MENUWISE_LOG_LEVEL"], None),
        ),
        render_line(
            "logging.format",
            &format!("{:?}", config.logging.format).to_lowercase(),
            source("logging.format", &["MENUWISE_LOGGING_FORMAT", "MENUWISE_LOG_FORMAT"], None),
        ),
    ];

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from("menuwise.toml"), PathBuf::from("config/menuwise.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    cli_flag: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(flag) = cli_flag {
        return format!("cli ({flag})");
    }

    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
