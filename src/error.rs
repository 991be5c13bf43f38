use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Rejections of client input. Deterministic for identical input and never retried.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum QueryError {
    #[error("Frequency <{value}> is not valid")]
    InvalidFrequency { value: String, allowed: Vec<String> },
    #[error("No such name <{name}> for <{frequency}> frequency")]
    InvalidName { name: String, frequency: String, allowed: Vec<String> },
    #[error("Invalid date parameter <{value}>")]
    InvalidDateFormat { value: String },
    #[error("Start date {start_date} cannot be in future (today is {current_date})")]
    FutureStartDate { start_date: NaiveDate, current_date: NaiveDate },
    #[error("End date {end_date} must not be before start date {start_date}")]
    EndBeforeStart { start_date: NaiveDate, end_date: NaiveDate },
    #[error("Ambiguous {field} tokens: {found:?}")]
    AmbiguousToken { field: &'static str, found: Vec<String> },
    #[error("Cannot combine rate <{rate}> and aggregation <{aggregator}>")]
    ConflictingRateAndAggregation { rate: String, aggregator: String },
}

impl QueryError {
    /// Errors raised while reading a request apart, as opposed to checking it against the catalog.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            QueryError::InvalidDateFormat { .. }
                | QueryError::AmbiguousToken { .. }
                | QueryError::ConflictingRateAndAggregation { .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Unsupported output format <{value}>")]
    UnsupportedFormat { value: String, allowed: Vec<String> },
    #[error("Invalid API token")]
    Unauthorized,
    #[error("Invalid payload: {0}")]
    Payload(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Execution error: {0}")]
    Execution(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

impl Error {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Query(e) => match e {
                QueryError::InvalidFrequency { .. } => "invalid_frequency",
                QueryError::InvalidName { .. } => "invalid_name",
                QueryError::InvalidDateFormat { .. } => "invalid_date_format",
                QueryError::FutureStartDate { .. } => "future_start_date",
                QueryError::EndBeforeStart { .. } => "end_before_start",
                QueryError::AmbiguousToken { .. } => "ambiguous_token",
                QueryError::ConflictingRateAndAggregation { .. } => "conflicting_rate_and_aggregation",
            },
            Error::MissingParameter(_) => "missing_parameter",
            Error::UnsupportedFormat { .. } => "unsupported_format",
            Error::Unauthorized => "unauthorized",
            Error::Payload(_) => "payload",
            Error::NotFound(_) => "not_found",
            Error::Encoding(_) => "encoding",
            Error::Config(_) => "config",
            Error::Persistence(_) => "persistence",
            Error::Execution(_) => "execution",
            Error::Lock(_) => "lock",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// Helper conversions
impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Self::Encoding(e.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Lock(e.to_string())
    }
}
