//! Error types.
//!
//! The library reports failures as [`ForecastError`]; the `dau` binary folds
//! them into [`AppError`], which carries the process exit code.

use thiserror::Error;

use crate::domain::FamilyKind;

/// Library result alias.
pub type ForecastResult<T> = Result<T, ForecastError>;

#[derive(Debug, Error)]
pub enum ForecastError {
    /// Malformed or out-of-range retention data.
    #[error("Invalid retention data: {0}")]
    Validation(String),

    /// The requested curve form is not a known family name.
    #[error("Invalid retention curve form '{0}'")]
    InvalidForm(String),

    /// A specific family was requested but its fit did not converge.
    #[error("Retention curve could not be fitted with the {} function", .0.name())]
    UnfittedForm(FamilyKind),

    /// Every parametric family failed to fit, so no best fit exists.
    #[error("No retention curve family could be fitted to the data")]
    NoViableFit,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("DAU target timeline ({timeline}) is longer than the number of periods being projected ({periods})")]
    TimelineExceedsPeriods { timeline: usize, periods: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ForecastError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Exit code used when this error terminates the `dau` binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_)
            | Self::InvalidForm(_)
            | Self::InvalidArgument(_)
            | Self::TimelineExceedsPeriods { .. } => 2,
            Self::UnfittedForm(_) | Self::NoViableFit => 3,
            Self::Io(_) | Self::Csv(_) | Self::Json(_) => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<ForecastError> for AppError {
    fn from(err: ForecastError) -> Self {
        Self::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
