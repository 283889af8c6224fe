use thiserror::Error;

/// Failure surfaced by a [`crate::source::SalesDataSource`] implementation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DataSourceError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),
    #[error("data source returned malformed record: {0}")]
    Decode(String),
}

/// Outcome taxonomy shared by every analysis operation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("{entity} `{key}` was not found")]
    NotFound { entity: &'static str, key: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    #[error("demand model is invalid: {0}")]
    ModelInvalid(String),
    #[error("computation failed: {0}")]
    Computation(String),
}

impl AnalysisError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound { entity, key: key.into() }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::InsufficientData(_) => "insufficient_data",
            Self::ModelInvalid(_) => "model_invalid",
            Self::Computation(_) => "computation_error",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "The requested product, category, or group does not exist.",
            Self::InvalidInput(_) => "The analysis parameters are out of range. Check inputs and try again.",
            Self::InsufficientData(_) => {
                "There is not enough sales history to run this analysis yet."
            }
            Self::ModelInvalid(_) => {
                "Sales history does not show demand falling as price rises, so no reliable forecast can be made."
            }
            Self::Computation(_) => "An unexpected error occurred while computing the analysis.",
        }
    }
}

impl From<DataSourceError> for AnalysisError {
    fn from(value: DataSourceError) -> Self {
        Self::Computation(value.to_string())
    }
}

/// Rejects NaN/infinite intermediates so degenerate data never leaks into a result.
pub(crate) fn ensure_finite(value: f64, what: &str) -> Result<f64, AnalysisError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AnalysisError::Computation(format!("{what} is not a finite number ({value})")))
    }
}
