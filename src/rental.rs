//! Short-term rental income of a contemplated property.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// Nights billed in a month.
pub const DAYS_PER_MONTH: u32 = 30;

/// Expected operation of a short-term rental property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalAssumptions {
    /// Nightly rate charged to guests.
    pub daily_rate: Decimal,
    /// Share of nights booked, as a percentage.
    pub occupancy_rate_pct: Decimal,
    /// Property management fee, as a percentage of gross income.
    pub management_pct: Decimal,
    /// Operating expenses (cleaning, utilities, platform fees), as a percentage of gross income.
    pub total_expenses_pct: Decimal,
}

impl RentalAssumptions {
    /// Rejects negative values, percentages above 100% and rates whose income overflows.
    pub fn validate(&self) -> Result<()> {
        let values = [
            ("daily rate", self.daily_rate),
            ("occupancy rate", self.occupancy_rate_pct),
            ("management", self.management_pct),
            ("total expenses", self.total_expenses_pct),
        ];
        if let Some((name, _)) = values.iter().find(|(_, value)| *value < dec!(0)) {
            return Err(SimulationError::InvalidRentalAssumptions(format!("{name} cannot be negative")));
        }
        let percentages = [
            ("occupancy rate", self.occupancy_rate_pct),
            ("management", self.management_pct),
            ("total expenses", self.total_expenses_pct),
        ];
        if let Some((name, _)) = percentages.iter().find(|(_, value)| *value > Decimal::ONE_HUNDRED) {
            return Err(SimulationError::InvalidRentalAssumptions(format!("{name} cannot exceed 100%")));
        }
        // Twelve months of a fully booked property, scaled to a percentage yield.
        let annual_scale = Decimal::from(DAYS_PER_MONTH * 12) * Decimal::ONE_HUNDRED * Decimal::ONE_HUNDRED;
        if self.daily_rate.checked_mul(annual_scale).is_none() {
            return Err(SimulationError::InvalidRentalAssumptions(
                "daily rate overflows the decimal range".to_string(),
            ));
        }

        Ok(())
    }
}

/// Contains the monthly rental picture of one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalProjection {
    /// Income before management and expenses.
    pub gross_monthly_income: Decimal,
    /// Income after management and expenses.
    pub net_monthly_income: Decimal,
    /// Net income minus the post-contemplation installment. May be negative.
    pub monthly_cash_flow: Decimal,
    /// Twelve months of net income over the property value, as a percentage.
    pub annual_net_yield_pct: Decimal,
}

/// Booked nights times the nightly rate.
pub fn gross_monthly_income(assumptions: &RentalAssumptions) -> Decimal {
    assumptions.daily_rate * Decimal::from(DAYS_PER_MONTH) * assumptions.occupancy_rate_pct / Decimal::ONE_HUNDRED
}

/// Monthly income net of management and operating expenses.
pub fn monthly_rental_income(assumptions: &RentalAssumptions) -> Decimal {
    let retained = dec!(1)
        - assumptions.management_pct / Decimal::ONE_HUNDRED
        - assumptions.total_expenses_pct / Decimal::ONE_HUNDRED;

    gross_monthly_income(assumptions) * retained
}

/// Free cash left after paying the installment. Negative means the property needs funding.
pub fn cash_flow(post_contemplation_installment: Decimal, monthly_rental_income: Decimal) -> Decimal {
    monthly_rental_income - post_contemplation_installment
}

/// Projects income, cash flow and yield of a property worth `property_value`.
pub fn project_rental(
    assumptions: &RentalAssumptions,
    post_contemplation_installment: Decimal,
    property_value: Decimal,
) -> RentalProjection {
    let net_monthly_income = monthly_rental_income(assumptions);
    let annual_net_yield_pct = if property_value.is_zero() {
        dec!(0)
    } else {
        (net_monthly_income * dec!(12))
            .checked_div(property_value)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(if net_monthly_income < dec!(0) { Decimal::MIN } else { Decimal::MAX })
    };

    RentalProjection {
        gross_monthly_income: gross_monthly_income(assumptions),
        net_monthly_income,
        monthly_cash_flow: cash_flow(post_contemplation_installment, net_monthly_income),
        annual_net_yield_pct,
    }
}
