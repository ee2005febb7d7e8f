//! Debt left at contemplation and its flat amortization over the remaining term.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::ConsortiumConfig;
use crate::indexation::indexed_credit;
use crate::schedule::{monthly_installment, total_paid};

/// Which side of the contemplation a payment falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentPhase {
    PreContemplation,
    PostContemplation,
}

/// Represents the payment due in a single month of the quota.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPayment {
    /// The 1-based month number.
    pub month: u32,
    /// The installment charged in this month.
    pub installment: Decimal,
    /// Whether the payment happens before or after contemplation.
    pub phase: PaymentPhase,
    /// The total paid up to and including this month.
    pub cumulative_paid: Decimal,
}

/// Contains the debt position of a quota at its contemplation month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContemplationSummary {
    /// The credit value indexed up to the contemplation month.
    pub credit_at_contemplation: Decimal,
    /// Administration, reserve fund and insurance charged on that credit.
    pub loads: Decimal,
    /// Sum of the installments paid until contemplation.
    pub total_paid: Decimal,
    /// Debt still owed after contemplation.
    pub remaining_debt: Decimal,
    /// Number of installments left after contemplation.
    pub remaining_installments: u32,
    /// The flat installment charged after contemplation.
    pub post_contemplation_installment: Decimal,
    /// A vector containing every payment of the term.
    pub payment_curve: Vec<ScheduledPayment>,
}

fn loads(cfg: &ConsortiumConfig, updated_credit: Decimal) -> Decimal {
    updated_credit * cfg.total_load_pct() / Decimal::ONE_HUNDRED
}

/// Debt owed at contemplation, never negative.
///
/// The indexed credit plus its loads, minus everything already paid. Overpayment clamps
/// to zero instead of turning into a credit balance.
pub fn remaining_debt(cfg: &ConsortiumConfig) -> Decimal {
    let updated_credit = indexed_credit(cfg.initial_credit, cfg.annual_update_rate, cfg.contemplation_month);
    let debt = updated_credit + loads(cfg, updated_credit) - total_paid(cfg);

    debt.max(dec!(0))
}

/// Flat installment that clears [`remaining_debt`] over the installments left.
///
/// Returns zero when contemplation happens on (or after) the last installment. No further
/// indexation is modeled after contemplation.
pub fn post_contemplation_installment(cfg: &ConsortiumConfig) -> Decimal {
    match cfg.remaining_installments() {
        0 => dec!(0),
        remaining => remaining_debt(cfg) / Decimal::from(remaining),
    }
}

/// Builds the full payment curve of the quota.
///
/// Months up to contemplation follow the indexed schedule; the rest repeat the flat
/// post-contemplation installment.
pub fn payment_curve(cfg: &ConsortiumConfig) -> Vec<ScheduledPayment> {
    let post_installment = post_contemplation_installment(cfg);
    let mut cumulative_paid = dec!(0);
    let mut curve = Vec::with_capacity(cfg.total_installments as usize);

    for month in 1..=cfg.total_installments {
        let (installment, phase) = if month <= cfg.contemplation_month {
            (monthly_installment(cfg, month), PaymentPhase::PreContemplation)
        } else {
            (post_installment, PaymentPhase::PostContemplation)
        };

        cumulative_paid += installment;
        curve.push(ScheduledPayment {
            month,
            installment,
            phase,
            cumulative_paid,
        });
    }

    curve
}

/// Calculates the contemplation position of a quota.
///
/// This is the entry point for a single quota: it validates the configuration and then
/// gathers the debt, the new installment and the complete payment curve.
///
/// # Errors
///
/// Returns an error if the configuration is invalid (see [`ConsortiumConfig::validate`]).
pub fn calculate_contemplation(cfg: &ConsortiumConfig) -> Result<ContemplationSummary, anyhow::Error> {
    cfg.validate()?;

    let credit_at_contemplation = indexed_credit(cfg.initial_credit, cfg.annual_update_rate, cfg.contemplation_month);

    Ok(ContemplationSummary {
        credit_at_contemplation,
        loads: loads(cfg, credit_at_contemplation),
        total_paid: total_paid(cfg),
        remaining_debt: remaining_debt(cfg),
        remaining_installments: cfg.remaining_installments(),
        post_contemplation_installment: post_contemplation_installment(cfg),
        payment_curve: payment_curve(cfg),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn flat_config() -> ConsortiumConfig {
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
    fn test_scenario_without_indexation_or_loads() {
        let config = flat_config();

        assert_eq!(total_paid(&config), dec!(24000));
        assert_eq!(remaining_debt(&config), dec!(216000));
        assert_eq!(post_contemplation_installment(&config), dec!(1000));
    }

    #[test]
    fn test_loads_are_added_to_debt() {
        let config = ConsortiumConfig {
            administration_tax_pct: dec!(15),
            reserve_fund_pct: dec!(2),
            insurance_pct: dec!(1),
            ..flat_config()
        };

        // 240000 + 18% loads - 24000 paid
        assert_eq!(remaining_debt(&config), dec!(259200));
        assert_eq!(post_contemplation_installment(&config), dec!(1200));
    }

    #[test]
    fn test_remaining_debt_clamps_to_zero() {
        // The anniversary month indexes before the credit itself does, so the
        // paid sum ends up above the credit at contemplation.
        let config = ConsortiumConfig {
            initial_credit: dec!(1200),
            total_installments: 2,
            contemplation_month: 2,
            annual_update_rate: dec!(50),
            update_month: 2,
            ..flat_config()
        };

        assert_eq!(total_paid(&config), dec!(1500));
        assert_eq!(remaining_debt(&config), dec!(0));
    }

    #[test]
    fn test_contemplation_on_last_installment_has_no_post_installment() {
        let config = ConsortiumConfig {
            contemplation_month: 240,
            ..flat_config()
        };
        assert_eq!(post_contemplation_installment(&config), dec!(0));
    }

    #[test]
    fn test_payment_curve_switches_phase_after_contemplation() {
        let curve = payment_curve(&flat_config());

        assert_eq!(curve.len(), 240);
        assert_eq!(curve[23].phase, PaymentPhase::PreContemplation);
        assert_eq!(curve[24].phase, PaymentPhase::PostContemplation);
        assert_eq!(curve[23].cumulative_paid, dec!(24000));
        assert_eq!(curve.last().unwrap().cumulative_paid, dec!(240000));
    }

    #[test]
    fn test_calculate_contemplation_happy_path() {
        let summary = calculate_contemplation(&flat_config()).unwrap();

        assert_eq!(summary.credit_at_contemplation, dec!(240000));
        assert_eq!(summary.loads, dec!(0));
        assert_eq!(summary.remaining_installments, 216);
        assert_eq!(summary.post_contemplation_installment, dec!(1000));
        assert_eq!(summary.payment_curve.len(), 240);
    }

    #[test]
    fn test_calculate_contemplation_rejects_invalid_config() {
        let config = ConsortiumConfig {
            total_installments: 0,
            ..flat_config()
        };
        assert!(calculate_contemplation(&config).is_err());
    }

    fn valid_configs() -> impl Strategy<Value = ConsortiumConfig> {
        (1u32..=360, 1u32..=12, 1i64..=5_000_000_00, 0i64..=1_500, 0i64..=2_000)
            .prop_flat_map(|(total, update_month, cents, rate_bp, load_bp)| {
                (1u32..=total).prop_map(move |contemplation| ConsortiumConfig {
                    initial_credit: Decimal::new(cents, 2),
                    total_installments: total,
                    contemplation_month: contemplation,
                    annual_update_rate: Decimal::new(rate_bp, 2),
                    update_month,
                    administration_tax_pct: Decimal::new(load_bp, 2),
                    reserve_fund_pct: dec!(0),
                    insurance_pct: dec!(0),
                })
            })
    }

    proptest! {
        #[test]
        fn prop_remaining_debt_is_never_negative(config in valid_configs()) {
            prop_assert!(remaining_debt(&config) >= dec!(0));
        }

        #[test]
        fn prop_post_installment_amortizes_remaining_debt(config in valid_configs()) {
            let remaining = config.remaining_installments();
            prop_assume!(remaining > 0);

            let rebuilt = post_contemplation_installment(&config) * Decimal::from(remaining);
            prop_assert!((rebuilt - remaining_debt(&config)).abs() < dec!(0.000001));
        }
    }
}
