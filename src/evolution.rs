//! Patrimonial evolution: reinvesting rental surplus into new consortium credits.
//!
//! The run starts with the contemplated property of the configured quota. Every month the
//! net cash flow of the owned properties goes into a cash reserve, and whenever the reserve
//! covers the acquisition cost of a new unit (the tier matching the configured credit) the
//! reserve buys as many units as it can. Each unit adds its credit to equity and its own
//! cash flow to the monthly passive income.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::amortization::post_contemplation_installment;
use crate::config::ConsortiumConfig;
use crate::error::{Result, SimulationError};
use crate::indexation::{indexed_credit, update_factor};
use crate::matcher::{ProductTier, match_by_credit_value};
use crate::rental::{RentalAssumptions, cash_flow, monthly_rental_income};
use crate::schedule::total_paid;

/// What the cash reserve must hold before a new unit is bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AcquisitionThreshold {
    /// Everything the new quota pays until its own contemplation.
    #[default]
    PreContemplationPayments,
    /// A single post-contemplation installment of the new quota.
    PostContemplationInstallment,
}

/// Longest simulated horizon accepted by [`EvolutionSettings::validate`] (100 years).
pub const MAX_HORIZON_MONTHS: u32 = 1200;

/// Input parameters for the patrimonial evolution simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionSettings {
    /// Number of simulated months.
    pub horizon_months: u32,
    /// Yearly appreciation of the owned equity, as a percentage.
    #[serde(default)]
    pub annual_appreciation_pct: Decimal,
    #[serde(default)]
    pub acquisition_threshold: AcquisitionThreshold,
}

impl EvolutionSettings {
    /// Rejects horizons above [`MAX_HORIZON_MONTHS`] and depreciation beyond a total loss.
    pub fn validate(&self) -> Result<()> {
        if self.horizon_months > MAX_HORIZON_MONTHS {
            return Err(SimulationError::InvalidConfiguration(format!(
                "horizon of {} months exceeds the limit of {MAX_HORIZON_MONTHS}",
                self.horizon_months
            )));
        }
        if self.annual_appreciation_pct < -Decimal::ONE_HUNDRED {
            return Err(SimulationError::InvalidConfiguration(
                "annual appreciation cannot be below -100%".to_string(),
            ));
        }

        Ok(())
    }
}

/// Running totals at the end of a simulated month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionFrame {
    pub month: u32,
    pub properties: u64,
    pub equity: Decimal,
    /// Net monthly cash flow of every owned property.
    pub passive_income: Decimal,
    /// Cash accrued and not yet reinvested.
    pub cash_reserve: Decimal,
}

/// One more property bought with the cash reserve.
#[derive(Debug, Clone)]
struct ReinvestmentUnit {
    credit: Decimal,
    cost: Decimal,
    cash_flow: Decimal,
}

impl ReinvestmentUnit {
    fn new(cfg: &ConsortiumConfig, credit: Decimal, rental_income: Decimal, threshold: AcquisitionThreshold) -> Self {
        let unit_cfg = cfg.with_credit(credit);
        let installment = post_contemplation_installment(&unit_cfg);
        let cost = match threshold {
            AcquisitionThreshold::PreContemplationPayments => total_paid(&unit_cfg),
            AcquisitionThreshold::PostContemplationInstallment => installment,
        };

        Self {
            credit,
            cost,
            cash_flow: cash_flow(installment, rental_income),
        }
    }
}

struct Portfolio {
    properties: u64,
    equity: Decimal,
    passive_income: Decimal,
    cash_reserve: Decimal,
}

impl Portfolio {
    fn accrue(&mut self) {
        self.cash_reserve = self.cash_reserve.saturating_add(self.passive_income);
    }

    /// Buys as many units as the reserve covers and returns how many were bought.
    fn reinvest(&mut self, unit: &ReinvestmentUnit) -> u64 {
        let Some(quotient) = self.cash_reserve.checked_div(unit.cost) else {
            return 0;
        };
        if quotient < dec!(1) {
            return 0;
        }

        let count = quotient.floor().to_u64().unwrap_or(u64::MAX);
        let units = Decimal::from(count);

        self.properties = self.properties.saturating_add(count);
        self.cash_reserve = self.cash_reserve.saturating_sub(unit.cost.saturating_mul(units));
        self.equity = self.equity.saturating_add(unit.credit.saturating_mul(units));
        self.passive_income = self.passive_income.saturating_add(unit.cash_flow.saturating_mul(units));

        count
    }

    fn frame(&self, month: u32) -> EvolutionFrame {
        EvolutionFrame {
            month,
            properties: self.properties,
            equity: self.equity,
            passive_income: self.passive_income,
            cash_reserve: self.cash_reserve,
        }
    }
}

/// Simulates `settings.horizon_months` months of reinvestment.
///
/// Always returns exactly one frame per month. Without product tiers there is nothing to
/// reinvest in: the run stays at a single property with constant equity, and only the cash
/// reserve grows with the base cash flow. Appreciation applies to portfolios that can grow.
#[instrument(skip_all, fields(horizon = settings.horizon_months, tiers = tiers.len()))]
pub fn simulate_evolution(
    cfg: &ConsortiumConfig,
    tiers: &[ProductTier],
    rental: &RentalAssumptions,
    settings: &EvolutionSettings,
) -> Vec<EvolutionFrame> {
    let rental_income = monthly_rental_income(rental);
    let appreciation = update_factor(settings.annual_appreciation_pct);

    let unit = match match_by_credit_value(tiers, cfg.initial_credit) {
        Some(matched) => Some(ReinvestmentUnit::new(
            cfg,
            matched.credit_value(),
            rental_income,
            settings.acquisition_threshold,
        )),
        None => {
            warn!("no product tiers configured, projecting a single property");
            None
        }
    };
    let unit = unit.filter(|unit| unit.cost > dec!(0));

    let mut portfolio = Portfolio {
        properties: 1,
        equity: indexed_credit(cfg.initial_credit, cfg.annual_update_rate, cfg.contemplation_month),
        passive_income: cash_flow(post_contemplation_installment(cfg), rental_income),
        cash_reserve: dec!(0),
    };
    let mut frames = Vec::with_capacity(settings.horizon_months as usize);

    for month in 1..=settings.horizon_months {
        portfolio.accrue();

        if let Some(unit) = &unit {
            let bought = portfolio.reinvest(unit);
            if bought > 0 {
                debug!(month, bought, properties = portfolio.properties, "reinvested cash reserve");
            }
        }

        if unit.is_some() && month % 12 == 0 {
            portfolio.equity = portfolio.equity.saturating_mul(appreciation);
        }

        frames.push(portfolio.frame(month));
    }

    info!(
        properties = portfolio.properties,
        equity = %portfolio.equity,
        passive_income = %portfolio.passive_income,
        "evolution finished"
    );

    frames
}

/// Keeps the last frame of every year, plus the final frame of an incomplete year.
pub fn yearly_frames(frames: &[EvolutionFrame]) -> Vec<EvolutionFrame> {
    let mut yearly: Vec<EvolutionFrame> = frames.iter().filter(|frame| frame.month % 12 == 0).cloned().collect();

    if let Some(last) = frames.last() {
        if last.month % 12 != 0 {
            yearly.push(last.clone());
        }
    }

    yearly
}
