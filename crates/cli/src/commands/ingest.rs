use std::fs;
use std::path::Path;

use anyhow::Context;
use menuwise_core::catalog::ingest::{lock_sales, IngestionBatch, SalesRow};
use menuwise_core::InMemorySalesData;
use serde::Serialize;

use crate::commands::{
    data_failure, load_config, read_snapshot, write_snapshot, CommandResult, GlobalOptions,
};

#[derive(Debug, Serialize)]
struct IngestPayload<'a> {
    command: &'a str,
    status: &'a str,
    appended: usize,
    skipped_non_positive_quantity: usize,
    unrecognized: Vec<&'a str>,
}

/// Appends already-validated sales rows (a JSON array) to the snapshot with costs locked in.
pub fn run(global: &GlobalOptions, rows_path: &Path) -> CommandResult {
    let config = match load_config("ingest", global) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let path = config.data.snapshot_path;

    let rows = match read_rows(rows_path) {
        Ok(rows) => rows,
        Err(error) => return data_failure("ingest", &error),
    };
    let data = match read_snapshot(&path) {
        Ok(data) => data,
        Err(error) => return data_failure("ingest", &error),
    };

    let (count, batch) = match append_locked(&data, &rows, &path) {
        Ok(result) => result,
        Err(error) => return data_failure("ingest", &error),
    };

    if !global.json {
        let mut lines = vec![format!(
            "appended {count} sale(s), skipped {} row(s) with non-positive quantity",
            batch.skipped_non_positive_quantity
        )];
        lines.extend(batch.unrecognized.iter().map(|name| format!("! unrecognized product {name}")));
        return CommandResult { exit_code: 0, output: lines.join("\n") };
    }

    let payload = IngestPayload {
        command: "ingest",
        status: "ok",
        appended: count,
        skipped_non_positive_quantity: batch.skipped_non_positive_quantity,
        unrecognized: batch.unrecognized.iter().map(String::as_str).collect(),
    };
    match serde_json::to_string(&payload) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure("ingest", "serialization", error.to_string(), 1),
    }
}

fn read_rows(path: &Path) -> anyhow::Result<Vec<SalesRow>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read sales rows `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("could not decode sales rows `{}`", path.display()))
}

fn append_locked(
    data: &InMemorySalesData,
    rows: &[SalesRow],
    path: &Path,
) -> anyhow::Result<(usize, IngestionBatch)> {
    let products = data.products()?;
    let batch = lock_sales(rows, &products);
    let appended = data.append_sales(batch.records.clone())?;
    write_snapshot(path, &data.snapshot()?)?;
    Ok((appended, batch))
}
