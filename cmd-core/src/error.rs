//! Error types for catalog, isochrone and export operations.

use thiserror::Error;

/// Failure kinds surfaced by the CMD pipeline.
///
/// None of these are fatal: the orchestration layer converts each one into a
/// user-visible [`StatusMessage`](crate::StatusMessage) and stays ready for
/// the next action.
#[derive(Debug, Error)]
pub enum CmdError {
    /// Non-numeric or out-of-range user parameters (radius <= 0, negative tolerance).
    #[error("{0}")]
    InvalidInput(String),

    /// Network/service error or an explicit error payload from the service.
    #[error("{0}")]
    FetchFailure(String),

    /// A response arrived but could not be read (e.g. no data table).
    #[error("{0}")]
    ParseFailure(String),

    /// Well-formed response with zero usable rows.
    ///
    /// Not a hard error, but distinct from success for user messaging.
    #[error("{0}")]
    EmptyResult(String),

    /// File I/O error while loading tracks or writing exports.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl CmdError {
    /// True for [`CmdError::EmptyResult`].
    pub fn is_empty_result(&self) -> bool {
        matches!(self, CmdError::EmptyResult(_))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CmdError>;
