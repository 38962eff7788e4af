//! Error types for segmentation and frequency table handling.

use std::io;
use thiserror::Error;

/// Result type alias for segmentation operations
pub type Result<T> = std::result::Result<T, SegmentError>;

#[derive(Error, Debug)]
pub enum SegmentError {
    /// Empty run, or an empty / zero-count frequency entry
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The search hit its step or frontier ceiling before finishing
    #[error("Search budget exceeded after {steps} steps (frontier size {frontier})")]
    SearchBudgetExceeded { steps: usize, frontier: usize },

    /// A frequency table file line could not be parsed
    #[error("Malformed entry on line {line}: {reason}")]
    MalformedEntry { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SegmentError {
    /// Whether the caller can recover by passing the run through verbatim.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SegmentError::SearchBudgetExceeded { .. })
    }
}
