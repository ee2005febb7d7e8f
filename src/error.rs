//! Error types for consortium projections.

use thiserror::Error;

/// Result type alias for validated calculations.
pub type Result<T> = std::result::Result<T, SimulationError>;

/// Conditions reported before any projection math runs.
///
/// A negative cash flow is a valid outcome and never shows up here, and an empty
/// tier catalog is signalled by the matcher returning `None`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    /// Malformed consortium parameters (installments, contemplation month, rates).
    #[error("Invalid consortium configuration: {0}")]
    InvalidConfiguration(String),

    /// Negative or out of range rental percentages.
    #[error("Invalid rental assumptions: {0}")]
    InvalidRentalAssumptions(String),

    /// Contribution matching needs a positive term to estimate installments.
    #[error("Term in months cannot be zero.")]
    ZeroTerm,
}
