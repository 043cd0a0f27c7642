//! Error types for namelist-server

use thiserror::Error;

use crate::config::ConfigError;

/// Pool could not be opened. Fatal at startup.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("invalid connection options: {0}")]
    Options(#[from] ConfigError),

    #[error("failed to connect to {target}")]
    Connect {
        target: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Why a store operation did not complete.
#[derive(Error, Debug)]
pub enum Cause {
    #[error(transparent)]
    Driver(#[from] sqlx::Error),

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// A row could not be mapped onto a record.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("unrecognized column '{0}'")]
    UnrecognizedColumn(String),

    #[error("missing column '{0}'")]
    MissingColumn(&'static str),

    #[error(transparent)]
    Decode(#[from] sqlx::Error),
}

/// Failure of one listing request. Never fatal to the process.
#[derive(Error, Debug)]
pub enum ListingError {
    #[error("failed to get connection: {0}")]
    Connection(#[source] Cause),

    #[error("failed to run a query {statement:?}: {cause}")]
    Query {
        statement: &'static str,
        #[source]
        cause: Cause,
    },

    #[error("error reading DB query result: {0}")]
    Scan(#[from] ScanError),
}

impl ListingError {
    pub fn query(statement: &'static str, cause: Cause) -> Self {
        Self::Query { statement, cause }
    }

    /// True if the request ran out of time rather than failing outright.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(
            self,
            Self::Connection(Cause::DeadlineExceeded)
                | Self::Query {
                    cause: Cause::DeadlineExceeded,
                    ..
                }
        )
    }
}

/// HTTP server failure.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
