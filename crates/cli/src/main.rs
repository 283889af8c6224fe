use std::process::ExitCode;

use clap::Parser;
use menuwise_cli::Cli;
use menuwise_core::config::{AppConfig, LogFormat};
use tracing::Level;

fn init_logging(config: &AppConfig) {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder =
        tracing_subscriber::fmt().with_target(false).with_max_level(log_level).with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config errors are reported by the command itself; logging falls back to defaults.
    let config = AppConfig::load(cli.global_options().load_options()).unwrap_or_default();
    init_logging(&config);

    menuwise_cli::run(cli)
}
