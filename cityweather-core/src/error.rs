//! Error taxonomy shared by the lookup pipeline and the history store.

use std::{fmt, path::PathBuf};

/// Coarse classification of a failed lookup, for presentation layers that
/// only need to pick a notice style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    CityNotFound,
    Upstream,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::CityNotFound => "city_not_found",
            ErrorKind::Upstream => "upstream_error",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single `lookup`.
///
/// `InvalidInput`, `CityNotFound` and `Upstream` are meant to be shown to the
/// user as a blocking notice. `Cancelled` means a newer lookup superseded this
/// one and the result should simply be dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("city name must not be empty")]
    InvalidInput,

    #[error("city not found: {0}")]
    CityNotFound(String),

    #[error("weather service error: {0}")]
    Upstream(String),

    #[error("lookup was superseded by a newer request")]
    Cancelled,
}

impl LookupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LookupError::InvalidInput => ErrorKind::InvalidInput,
            LookupError::CityNotFound(_) => ErrorKind::CityNotFound,
            LookupError::Upstream(_) => ErrorKind::Upstream,
            LookupError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Wrap any transport, status or parse failure, keeping the full context chain.
    pub fn upstream(err: impl Into<anyhow::Error>) -> Self {
        LookupError::Upstream(format!("{:#}", err.into()))
    }

    /// Short message suitable for a dialog or a terminal notice.
    pub fn user_message(&self) -> String {
        match self {
            LookupError::InvalidInput => "Please enter a city name.".to_string(),
            LookupError::CityNotFound(city) => format!("Could not find a city named '{city}'."),
            LookupError::Upstream(msg) => format!("The weather service failed: {msg}"),
            LookupError::Cancelled => "The lookup was cancelled.".to_string(),
        }
    }
}

/// History persistence failure. Never fatal: callers log it and move on.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("failed to read history file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history file {} is not a JSON array of names: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize history: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write history file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
