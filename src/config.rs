//! User-entered simulation parameters.
//!
//! Everything the engine needs arrives through these structs, usually deserialized from
//! the camelCase JSON a form produces. The calculation modules assume a config that already
//! passed [`ConsortiumConfig::validate`]; they never coerce bad input on their own.

use std::path::Path;

use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::evolution::EvolutionSettings;
use crate::indexation::{checked_indexed_credit, update_factor};
use crate::matcher::ProductTier;
use crate::rental::RentalAssumptions;

/// Longest term accepted, in months (50 years).
pub const MAX_TOTAL_INSTALLMENTS: u32 = 600;

/// Multiple of the peak credit that must still fit in a `Decimal`, covering running sums
/// and percentage scaling.
const OVERFLOW_HEADROOM: Decimal = Decimal::ONE_HUNDRED;

/// Terms of a single consortium quota.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsortiumConfig {
    /// Face value of the credit at month 0.
    pub initial_credit: Decimal,
    /// Total number of monthly installments.
    pub total_installments: u32,
    /// Month in which the full credit is granted (1-based).
    pub contemplation_month: u32,
    /// Annual indexation as a percentage (e.g., 10 for 10%).
    pub annual_update_rate: Decimal,
    /// Month of the 12-month cycle on which indexation hits the installment stream.
    pub update_month: u32,
    /// Administration tax as a percentage of the credit.
    #[serde(default)]
    pub administration_tax_pct: Decimal,
    /// Reserve fund as a percentage of the credit.
    #[serde(default)]
    pub reserve_fund_pct: Decimal,
    /// Insurance as a percentage of the credit.
    #[serde(default)]
    pub insurance_pct: Decimal,
}

impl ConsortiumConfig {
    /// Rejects configurations the projection functions are not defined for.
    pub fn validate(&self) -> Result<()> {
        if self.total_installments == 0 {
            return Err(invalid("total installments must be positive"));
        }
        if self.total_installments > MAX_TOTAL_INSTALLMENTS {
            return Err(invalid(format!(
                "total installments {} above the {MAX_TOTAL_INSTALLMENTS} month limit",
                self.total_installments
            )));
        }
        if self.contemplation_month == 0 || self.contemplation_month > self.total_installments {
            return Err(invalid(format!(
                "contemplation month {} outside 1..={}",
                self.contemplation_month, self.total_installments
            )));
        }
        if !(1..=12).contains(&self.update_month) {
            return Err(invalid(format!("update month {} outside 1..=12", self.update_month)));
        }
        if self.initial_credit < Decimal::ZERO {
            return Err(invalid("initial credit cannot be negative"));
        }

        let rates = [
            ("annual update rate", self.annual_update_rate),
            ("administration tax", self.administration_tax_pct),
            ("reserve fund", self.reserve_fund_pct),
            ("insurance", self.insurance_pct),
        ];
        if let Some((name, _)) = rates.iter().find(|(_, rate)| *rate < Decimal::ZERO) {
            return Err(invalid(format!("{name} cannot be negative")));
        }

        self.check_headroom()
    }

    /// Rejects credit, rate and term combinations whose projections overflow `Decimal`.
    ///
    /// The credit indexed over the whole term, times the anniversary factor and the loads,
    /// bounds every installment, debt and running sum the projections produce.
    pub(crate) fn check_headroom(&self) -> Result<()> {
        let overflow = || invalid("credit, update rate and term overflow the decimal range");

        let load_pct = self
            .administration_tax_pct
            .checked_add(self.reserve_fund_pct)
            .and_then(|sum| sum.checked_add(self.insurance_pct))
            .ok_or_else(overflow)?;
        let load_factor = Decimal::ONE
            .checked_add(load_pct / Decimal::ONE_HUNDRED)
            .ok_or_else(overflow)?;

        checked_indexed_credit(self.initial_credit, self.annual_update_rate, self.total_installments)
            .and_then(|peak| peak.checked_mul(update_factor(self.annual_update_rate)))
            .and_then(|peak| peak.checked_mul(load_factor))
            .and_then(|peak| peak.checked_mul(OVERFLOW_HEADROOM))
            .ok_or_else(overflow)?;

        Ok(())
    }

    /// Installments left after contemplation, zero once the term is exhausted.
    pub fn remaining_installments(&self) -> u32 {
        self.total_installments.saturating_sub(self.contemplation_month)
    }

    /// Administration, reserve and insurance loads combined, as a percentage.
    pub fn total_load_pct(&self) -> Decimal {
        self.administration_tax_pct + self.reserve_fund_pct + self.insurance_pct
    }

    /// Same terms applied to a different face value.
    pub fn with_credit(&self, credit: Decimal) -> Self {
        Self {
            initial_credit: credit,
            ..self.clone()
        }
    }
}

fn invalid(message: impl Into<String>) -> SimulationError {
    SimulationError::InvalidConfiguration(message.into())
}

/// The complete parameter set of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationInput {
    pub consortium: ConsortiumConfig,
    /// Product catalog of the administrator. May be empty.
    #[serde(default)]
    pub tiers: Vec<ProductTier>,
    pub rental: RentalAssumptions,
    pub evolution: EvolutionSettings,
}

impl SimulationInput {
    /// Parses a JSON document and validates it.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let input: Self = serde_json::from_str(json).context("Failed to parse simulation input")?;
        input.validate()?;
        Ok(input)
    }

    /// Reads and parses a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read simulation input from {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Validates the quota, every tier under the quota's terms, the rental assumptions and the horizon.
    pub fn validate(&self) -> Result<()> {
        self.consortium.validate()?;
        for tier in &self.tiers {
            tier.validate()?;
            self.consortium.with_credit(tier.credit_value).check_headroom()?;
        }
        self.rental.validate()?;
        self.evolution.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn valid_config() -> ConsortiumConfig {
        ConsortiumConfig {
            initial_credit: dec!(240000),
            total_installments: 240,
            contemplation_month: 24,
            annual_update_rate: dec!(0),
            update_month: 1,
            administration_tax_pct: dec!(0),
            reserve_fund_pct: dec!(0),
            insurance_pct: dec!(0),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert_eq!(valid_config().validate(), Ok(()));
    }

    #[rstest]
    #[case::zero_installments(ConsortiumConfig { total_installments: 0, ..valid_config() })]
    #[case::contemplation_zero(ConsortiumConfig { contemplation_month: 0, ..valid_config() })]
    #[case::contemplation_past_term(ConsortiumConfig { contemplation_month: 241, ..valid_config() })]
    #[case::update_month_zero(ConsortiumConfig { update_month: 0, ..valid_config() })]
    #[case::update_month_thirteen(ConsortiumConfig { update_month: 13, ..valid_config() })]
    #[case::negative_rate(ConsortiumConfig { annual_update_rate: dec!(-1), ..valid_config() })]
    #[case::negative_insurance(ConsortiumConfig { insurance_pct: dec!(-0.5), ..valid_config() })]
    #[case::negative_credit(ConsortiumConfig { initial_credit: dec!(-10), ..valid_config() })]
    #[case::term_above_limit(ConsortiumConfig { total_installments: 601, ..valid_config() })]
    #[case::u32_max_term(ConsortiumConfig { total_installments: u32::MAX, contemplation_month: 1, ..valid_config() })]
    #[case::indexation_overflows(ConsortiumConfig {
        total_installments: 360,
        contemplation_month: 360,
        annual_update_rate: dec!(1000),
        ..valid_config()
    })]
    #[case::loads_overflow(ConsortiumConfig { administration_tax_pct: Decimal::MAX, ..valid_config() })]
    fn test_invalid_config_is_rejected(#[case] config: ConsortiumConfig) {
        assert!(matches!(
            config.validate(),
            Err(SimulationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_longest_term_with_moderate_rate_passes() {
        let config = ConsortiumConfig {
            total_installments: MAX_TOTAL_INSTALLMENTS,
            contemplation_month: MAX_TOTAL_INSTALLMENTS,
            annual_update_rate: dec!(15),
            ..valid_config()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_remaining_installments_saturates() {
        let config = ConsortiumConfig { contemplation_month: 240, ..valid_config() };
        assert_eq!(config.remaining_installments(), 0);
        assert_eq!(valid_config().remaining_installments(), 216);
    }

    #[test]
    fn test_input_from_json_applies_defaults() {
        let json = r#"{
            "consortium": {
                "initialCredit": 240000,
                "totalInstallments": 240,
                "contemplationMonth": 24,
                "annualUpdateRate": "5.5",
                "updateMonth": 12
            },
            "rental": {
                "dailyRate": 300,
                "occupancyRatePct": 70,
                "managementPct": 20,
                "totalExpensesPct": 10
            },
            "evolution": { "horizonMonths": 120 }
        }"#;

        let input = SimulationInput::from_json_str(json).unwrap();

        assert_eq!(input.consortium.annual_update_rate, dec!(5.5));
        assert_eq!(input.consortium.total_load_pct(), dec!(0));
        assert!(input.tiers.is_empty());
        assert_eq!(input.evolution.horizon_months, 120);
    }

    #[test]
    fn test_input_from_json_rejects_invalid_consortium() {
        let json = r#"{
            "consortium": {
                "initialCredit": 1000,
                "totalInstallments": 10,
                "contemplationMonth": 11,
                "annualUpdateRate": 0,
                "updateMonth": 1
            },
            "rental": { "dailyRate": 0, "occupancyRatePct": 0, "managementPct": 0, "totalExpensesPct": 0 },
            "evolution": { "horizonMonths": 1 }
        }"#;

        let error = SimulationInput::from_json_str(json).unwrap_err();
        assert!(error.downcast_ref::<SimulationError>().is_some());
    }

    #[rstest]
    #[case::horizon_above_limit(r#"{ "horizonMonths": 4294967295 }"#)]
    #[case::appreciation_below_total_loss(r#"{ "horizonMonths": 12, "annualAppreciationPct": -150 }"#)]
    fn test_input_from_json_rejects_invalid_evolution(#[case] evolution: &str) {
        let json = format!(
            r#"{{
                "consortium": {{
                    "initialCredit": 1000,
                    "totalInstallments": 10,
                    "contemplationMonth": 5,
                    "annualUpdateRate": 0,
                    "updateMonth": 1
                }},
                "rental": {{ "dailyRate": 0, "occupancyRatePct": 0, "managementPct": 0, "totalExpensesPct": 0 }},
                "evolution": {evolution}
            }}"#
        );

        let error = SimulationInput::from_json_str(&json).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<SimulationError>(),
            Some(SimulationError::InvalidConfiguration(_))
        ));
    }

    #[rstest]
    #[case::negative_credit(dec!(-1))]
    #[case::credit_overflows_under_quota_terms(Decimal::MAX)]
    fn test_input_rejects_invalid_tier(#[case] credit_value: Decimal) {
        let input = SimulationInput {
            consortium: valid_config(),
            tiers: vec![ProductTier {
                id: "bad".to_string(),
                credit_value,
                term_options: vec![240],
            }],
            rental: RentalAssumptions {
                daily_rate: dec!(300),
                occupancy_rate_pct: dec!(70),
                management_pct: dec!(20),
                total_expenses_pct: dec!(10),
            },
            evolution: EvolutionSettings {
                horizon_months: 12,
                annual_appreciation_pct: dec!(0),
                acquisition_threshold: Default::default(),
            },
        };

        assert!(matches!(
            input.validate(),
            Err(SimulationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_input_from_missing_path_errors() {
        assert!(SimulationInput::from_path("/definitely/not/here.json").is_err());
    }
}
