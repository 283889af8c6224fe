pub mod analyze;
pub mod config;
pub mod costs;
pub mod ingest;
pub mod seed;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use menuwise_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use menuwise_core::{AnalysisOutcome, InMemorySalesData, SalesSnapshot};
use serde::Serialize;

pub const EXIT_ANALYSIS_FAILED: u8 = 4;
pub const EXIT_CONFIG_INVALID: u8 = 2;
pub const EXIT_DATA_UNAVAILABLE: u8 = 3;

/// Options shared by every subcommand.
#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub config_path: Option<PathBuf>,
    pub data_path: Option<PathBuf>,
    pub as_of: Option<NaiveDate>,
    pub json: bool,
}

impl GlobalOptions {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config_path.clone(),
            require_file: self.config_path.is_some(),
            overrides: ConfigOverrides {
                snapshot_path: self.data_path.clone(),
                ..ConfigOverrides::default()
            },
        }
    }
}

/// Exit code plus the text printed to stdout. Success output is command-specific (report text
/// or a JSON payload); failures always use the `FailurePayload` JSON shape.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct FailurePayload<'a> {
    command: &'a str,
    status: &'static str,
    error_class: &'a str,
    message: String,
}

impl CommandResult {
    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = FailurePayload { command, status: "error", error_class, message: message.into() };
        Self { exit_code, output: serialize_failure(&payload) }
    }

    /// Plain report text, or the full outcome as JSON.
    pub fn from_outcome(outcome: &AnalysisOutcome, json: bool) -> Self {
        let exit_code = if outcome.success { 0 } else { EXIT_ANALYSIS_FAILED };
        let output = if json {
            serde_json::to_string_pretty(outcome).unwrap_or_else(|error| {
                format!("{{\"success\":false,\"error_class\":\"serialization\",\"report_text\":\"{}\"}}", escape(&error.to_string()))
            })
        } else {
            outcome.report_text.clone()
        };
        Self { exit_code, output }
    }
}

fn serialize_failure(payload: &FailurePayload<'_>) -> String {
    serde_json::to_string(payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            escape(&error.to_string())
        )
    })
}

fn escape(message: &str) -> String {
    message.replace('\\', "\\\\").replace('"', "\\\"")
}

pub(crate) fn load_config(command: &str, global: &GlobalOptions) -> Result<AppConfig, CommandResult> {
    AppConfig::load(global.load_options()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG_INVALID,
        )
    })
}

pub(crate) fn read_snapshot(path: &Path) -> anyhow::Result<InMemorySalesData> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read data snapshot `{}`", path.display()))?;
    InMemorySalesData::from_json(&raw)
        .with_context(|| format!("could not decode data snapshot `{}`", path.display()))
}

pub(crate) fn write_snapshot(path: &Path, snapshot: &SalesSnapshot) -> anyhow::Result<()> {
    let raw = serde_json::to_string_pretty(snapshot).context("could not encode data snapshot")?;
    fs::write(path, raw)
        .with_context(|| format!("could not write data snapshot `{}`", path.display()))
}

pub(crate) fn data_failure(command: &str, error: &anyhow::Error) -> CommandResult {
    CommandResult::failure(command, "data_snapshot", format!("{error:#}"), EXIT_DATA_UNAVAILABLE)
}
