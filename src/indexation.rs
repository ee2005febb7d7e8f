//! Annual indexation of the credit value.

use rust_decimal::Decimal;

/// Converts an annual update percentage into its yearly multiplier (10 -> 1.10).
pub fn update_factor(annual_update_rate: Decimal) -> Decimal {
    Decimal::ONE + annual_update_rate / Decimal::ONE_HUNDRED
}

/// Compounds a credit value once per full year elapsed.
///
/// Months that do not complete a year are ignored: 23 elapsed months index the value
/// exactly once. The factor is applied by repeated multiplication, one step per year, so
/// the result matches a yearly statement rather than a continuous curve.
///
/// # Arguments
///
/// * `initial_credit` - The face value at month 0.
/// * `annual_update_rate` - The yearly update as a percentage (e.g., 10 for 10%).
/// * `elapsed_months` - Months since the quota started.
///
/// # Panics
///
/// Panics if the indexed value leaves the `Decimal` range. Configs that passed
/// [`ConsortiumConfig::validate`](crate::config::ConsortiumConfig::validate) never do.
pub fn indexed_credit(initial_credit: Decimal, annual_update_rate: Decimal, elapsed_months: u32) -> Decimal {
    let full_years = elapsed_months / 12;
    let factor = update_factor(annual_update_rate);

    let mut value = initial_credit;
    for _ in 0..full_years {
        value *= factor;
    }

    value
}

/// Same as [`indexed_credit`], returning `None` when the value overflows.
pub fn checked_indexed_credit(initial_credit: Decimal, annual_update_rate: Decimal, elapsed_months: u32) -> Option<Decimal> {
    let factor = update_factor(annual_update_rate);

    (0..elapsed_months / 12).try_fold(initial_credit, |value, _| value.checked_mul(factor))
}
