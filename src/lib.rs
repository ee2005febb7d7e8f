//! `br_consortium` is a Rust library for projecting consortium-based real estate investments in Brazil.
//!
//! A consortium quota is paid in monthly installments until it is contemplated, when the
//! full (indexed) credit is released and the remaining debt is spread over the rest of the
//! term. The strategy modeled here buys a property with the credit, rents it out for short
//! stays and reinvests the surplus into new quotas.
//!
//! The library provides:
//! - **Indexation**: annual, discrete updates of the credit value.
//! - **Installments**: the monthly schedule until contemplation and the flat installment after it.
//! - **Product matching**: picking the administrator's credit tiers for a requested value.
//! - **Rental yield**: net income and cash flow of the rented property.
//! - **Patrimonial evolution**: month by month property count, equity and passive income.
//!
//! ## Usage
//!
//! Add `br_consortium` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! br_consortium = "0.1.0"
//! rust_decimal = "1.39.0"
//! rust_decimal_macros = "1.39.0"
//! ```
//!
//! Then, use the `run_simulation` function to get the whole projection:
//!
//! ```rust
//! use br_consortium::{
//!     run_simulation, ConsortiumConfig, EvolutionSettings, ProductTier, RentalAssumptions,
//!     SimulationInput,
//! };
//! use rust_decimal_macros::dec;
//!
//! fn main() {
//!     let input = SimulationInput {
//!         consortium: ConsortiumConfig {
//!             initial_credit: dec!(240_000),
//!             total_installments: 240,
//!             contemplation_month: 24,
//!             annual_update_rate: dec!(0),
//!             update_month: 1,
//!             administration_tax_pct: dec!(0),
//!             reserve_fund_pct: dec!(0),
//!             insurance_pct: dec!(0),
//!         },
//!         tiers: vec![ProductTier {
//!             id: "240k".to_string(),
//!             credit_value: dec!(240_000),
//!             term_options: vec![240],
//!         }],
//!         rental: RentalAssumptions {
//!             daily_rate: dec!(300),
//!             occupancy_rate_pct: dec!(70),
//!             management_pct: dec!(20),
//!             total_expenses_pct: dec!(10),
//!         },
//!         evolution: EvolutionSettings {
//!             horizon_months: 120,
//!             annual_appreciation_pct: dec!(0),
//!             acquisition_threshold: Default::default(),
//!         },
//!     };
//!
//!     match run_simulation(&input) {
//!         Ok(report) => {
//!             println!("Installment after contemplation: {:.2}", report.contemplation.post_contemplation_installment);
//!             println!("Monthly cash flow:                {:.2}", report.rental.monthly_cash_flow);
//!             if let Some(last) = report.evolution.last() {
//!                 println!("Properties after {} months:     {}", last.month, last.properties);
//!             }
//!         }
//!         Err(e) => {
//!             eprintln!("Error running simulation: {}", e);
//!         }
//!     }
//! }
//! ```

pub mod amortization;
pub mod config;
pub mod error;
pub mod evolution;
pub mod indexation;
pub mod matcher;
pub mod rental;
pub mod schedule;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

pub use amortization::{
    ContemplationSummary, PaymentPhase, ScheduledPayment, calculate_contemplation, payment_curve,
    post_contemplation_installment, remaining_debt,
};
pub use config::{ConsortiumConfig, MAX_TOTAL_INSTALLMENTS, SimulationInput};
pub use error::SimulationError;
pub use evolution::{
    AcquisitionThreshold, EvolutionFrame, EvolutionSettings, MAX_HORIZON_MONTHS, simulate_evolution, yearly_frames,
};
pub use indexation::indexed_credit;
pub use matcher::{MatchResult, ProductTier, RoundingBand, match_by_contribution, match_by_credit_value};
pub use rental::{RentalAssumptions, RentalProjection, cash_flow, monthly_rental_income, project_rental};
pub use schedule::{monthly_installment, total_paid};

/// Contains every result of a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    /// The debt position of the configured quota at contemplation.
    pub contemplation: ContemplationSummary,
    /// The tier(s) matching the configured credit, if the catalog has any.
    pub product_match: Option<MatchResult>,
    /// Rental income and cash flow of the contemplated property.
    pub rental: RentalProjection,
    /// One frame per simulated month.
    pub evolution: Vec<EvolutionFrame>,
}

impl SimulationReport {
    /// Serializes the report as pretty-printed camelCase JSON.
    pub fn to_json(&self) -> Result<String, anyhow::Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs the whole projection for a set of user parameters.
///
/// This is the main entry point of the library. It validates the input and returns the
/// contemplation summary, the product match, the rental projection and the patrimonial
/// evolution in a single report.
///
/// # Arguments
///
/// * `input` - A `SimulationInput` with the quota, the tier catalog, the rental assumptions and the horizon.
///
/// # Errors
///
/// Returns an error if the consortium configuration or the rental assumptions are invalid.
#[instrument(skip_all, fields(credit = %input.consortium.initial_credit))]
pub fn run_simulation(input: &SimulationInput) -> Result<SimulationReport, anyhow::Error> {
    input.validate()?;

    let contemplation = calculate_contemplation(&input.consortium)?;
    let product_match = match_by_credit_value(&input.tiers, input.consortium.initial_credit);
    let rental = project_rental(
        &input.rental,
        contemplation.post_contemplation_installment,
        contemplation.credit_at_contemplation,
    );
    let evolution = simulate_evolution(&input.consortium, &input.tiers, &input.rental, &input.evolution);

    info!(
        post_installment = %contemplation.post_contemplation_installment,
        cash_flow = %rental.monthly_cash_flow,
        frames = evolution.len(),
        "simulation finished"
    );

    Ok(SimulationReport {
        contemplation,
        product_match,
        rental,
        evolution,
    })
}
