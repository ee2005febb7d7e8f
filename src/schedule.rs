//! Installments due before contemplation.
//!
//! The installment of a month is the credit indexed up to the start of its year, spread
//! over the whole term. On the update month the yearly factor is applied once more on top
//! of that, so anniversary months carry two steps of indexation for the same year.

use rust_decimal::Decimal;

use crate::config::ConsortiumConfig;
use crate::indexation::{indexed_credit, update_factor};

/// Whether indexation is recognized on `current_month`.
pub fn is_update_month(update_month: u32, current_month: u32) -> bool {
    let cycle = current_month % 12;
    cycle == update_month || (update_month == 12 && cycle == 0)
}

/// Installment due in `current_month` (1-based).
///
/// # Panics
///
/// Panics if `cfg.total_installments` is zero. Validate the config first.
pub fn monthly_installment(cfg: &ConsortiumConfig, current_month: u32) -> Decimal {
    let current_year = current_month.saturating_sub(1) / 12;
    let updated_credit = indexed_credit(cfg.initial_credit, cfg.annual_update_rate, current_year * 12);
    let base = updated_credit / Decimal::from(cfg.total_installments);

    if current_month > 1 && is_update_month(cfg.update_month, current_month) {
        base * update_factor(cfg.annual_update_rate)
    } else {
        base
    }
}

/// Sum of the installments from month 1 through the contemplation month.
pub fn total_paid(cfg: &ConsortiumConfig) -> Decimal {
    (1..=cfg.contemplation_month)
        .map(|month| monthly_installment(cfg, month))
        .sum()
}
