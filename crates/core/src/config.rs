use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub data: DataConfig,
    pub logging: LoggingConfig,
}

/// Policy parameters for the pricing analyses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Unit prices are rounded to the nearest multiple of this step before bucketing.
    pub price_step: f64,
    /// Only sales within this many days are bucketed. `None` uses the whole history.
    pub lookback_days: Option<u32>,
    pub comparison_window_days: u32,
    /// Number of candidate prices evaluated along a price curve.
    pub grid_points: usize,
    pub currency: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DataConfig {
    pub snapshot_path: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub price_step: Option<f64>,
    pub lookback_days: Option<u32>,
    pub comparison_window_days: Option<u32>,
    pub grid_points: Option<usize>,
    pub currency: Option<String>,
    pub snapshot_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            price_step: 1.0,
            lookback_days: None,
            comparison_window_days: 7,
            grid_points: 120,
            currency: "TRY".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            data: DataConfig { snapshot_path: PathBuf::from("menuwise-data.json") },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("menuwise.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(analysis) = patch.analysis {
            if let Some(price_step) = analysis.price_step {
                self.analysis.price_step = price_step;
            }
            if let Some(lookback_days) = analysis.lookback_days {
                self.analysis.lookback_days = Some(lookback_days);
            }
            if let Some(comparison_window_days) = analysis.comparison_window_days {
                self.analysis.comparison_window_days = comparison_window_days;
            }
            if let Some(grid_points) = analysis.grid_points {
                self.analysis.grid_points = grid_points;
            }
            if let Some(currency) = analysis.currency {
                self.analysis.currency = currency;
            }
        }

        if let Some(data) = patch.data {
            if let Some(snapshot_path) = data.snapshot_path {
                self.data.snapshot_path = snapshot_path;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("MENUWISE_ANALYSIS_PRICE_STEP") {
            self.analysis.price_step = parse_f64("MENUWISE_ANALYSIS_PRICE_STEP", &value)?;
        }
        if let Some(value) = read_env("MENUWISE_ANALYSIS_LOOKBACK_DAYS") {
            self.analysis.lookback_days =
                Some(parse_u32("MENUWISE_ANALYSIS_LOOKBACK_DAYS", &value)?);
        }
        if let Some(value) = read_env("MENUWISE_ANALYSIS_COMPARISON_WINDOW_DAYS") {
            self.analysis.comparison_window_days =
                parse_u32("MENUWISE_ANALYSIS_COMPARISON_WINDOW_DAYS", &value)?;
        }
        if let Some(value) = read_env("MENUWISE_ANALYSIS_GRID_POINTS") {
            self.analysis.grid_points = parse_usize("MENUWISE_ANALYSIS_GRID_POINTS", &value)?;
        }
        if let Some(value) = read_env("MENUWISE_ANALYSIS_CURRENCY") {
            self.analysis.currency = value;
        }

        if let Some(value) = read_env("MENUWISE_DATA_SNAPSHOT_PATH") {
            self.data.snapshot_path = PathBuf::from(value);
        }

        let log_level =
            read_env("MENUWISE_LOGGING_LEVEL").or_else(|| read_env("MENUWISE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("MENUWISE_LOGGING_FORMAT").or_else(|| read_env("MENUWISE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(price_step) = overrides.price_step {
            self.analysis.price_step = price_step;
        }
        if let Some(lookback_days) = overrides.lookback_days {
            self.analysis.lookback_days = Some(lookback_days);
        }
        if let Some(comparison_window_days) = overrides.comparison_window_days {
            self.analysis.comparison_window_days = comparison_window_days;
        }
        if let Some(grid_points) = overrides.grid_points {
            self.analysis.grid_points = grid_points;
        }
        if let Some(currency) = overrides.currency {
            self.analysis.currency = currency;
        }
        if let Some(snapshot_path) = overrides.snapshot_path {
            self.data.snapshot_path = snapshot_path;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        validate_data(&self.data)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Smallest accepted price rounding step, in currency units.
pub const MIN_PRICE_STEP: f64 = 0.0001;

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.price_step.is_finite() || self.price_step < MIN_PRICE_STEP {
            return Err(ConfigError::Validation(format!(
                "analysis.price_step must be a finite number of at least {MIN_PRICE_STEP}"
            )));
        }

        if self.lookback_days == Some(0) {
            return Err(ConfigError::Validation(
                "analysis.lookback_days must be greater than zero when set".to_string(),
            ));
        }

        if self.comparison_window_days == 0 || self.comparison_window_days > 365 {
            return Err(ConfigError::Validation(
                "analysis.comparison_window_days must be in range 1..=365".to_string(),
            ));
        }

        if !(10..=1000).contains(&self.grid_points) {
            return Err(ConfigError::Validation(
                "analysis.grid_points must be in range 10..=1000".to_string(),
            ));
        }

        if self.currency.trim().is_empty() {
            return Err(ConfigError::Validation("analysis.currency must not be empty".to_string()));
        }

        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("menuwise.toml"), PathBuf::from("config/menuwise.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_data(data: &DataConfig) -> Result<(), ConfigError> {
    if data.snapshot_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("data.snapshot_path must not be empty".to_string()));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    analysis: Option<AnalysisPatch>,
    data: Option<DataPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisPatch {
    price_step: Option<f64>,
    lookback_days: Option<u32>,
    comparison_window_days: Option<u32>,
    grid_points: Option<usize>,
    currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DataPatch {
    snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
