//! Matching requested values against an administrator's product tiers.
//!
//! Administrators sell credits in fixed face values. A request is served by the closest
//! tier, or, when it is larger than the biggest tier, by the biggest tier plus a second one
//! covering the shortfall. The second tier is the first one (ascending) that covers the
//! shortfall and then goes through the percentage rounding policy of [`RoundingBand`].

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SimulationError};

/// A credit value offered by an administrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTier {
    pub id: String,
    pub credit_value: Decimal,
    /// Terms (in months) the tier can be contracted with.
    #[serde(default)]
    pub term_options: Vec<u32>,
}

impl ProductTier {
    /// Rejects tiers with a negative credit value.
    pub fn validate(&self) -> Result<()> {
        if self.credit_value < dec!(0) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "tier {} has a negative credit value",
                self.id
            )));
        }
        Ok(())
    }

    /// The longest non-zero term on offer.
    pub fn longest_term(&self) -> Option<u32> {
        self.term_options.iter().copied().filter(|term| *term > 0).max()
    }

    /// Installment over the longest term, or zero when the tier lists none.
    pub fn estimated_installment(&self) -> Decimal {
        self.longest_term()
            .map_or(dec!(0), |term| self.credit_value / Decimal::from(term))
    }
}

/// How the shortfall percentage moves the second tier of a combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoundingBand {
    /// 1% to 40% of the selected tier: use the next smaller tier instead, if any.
    RoundDown,
    /// 41% to 100%: keep the selected tier.
    RoundUp,
    /// Any other percentage, including the gap between 40 and 41. Keeps the selected tier.
    Unbanded,
}

impl RoundingBand {
    /// Places a shortfall percentage in its band.
    pub fn classify(percentage: Decimal) -> Self {
        if percentage >= dec!(1) && percentage <= dec!(40) {
            RoundingBand::RoundDown
        } else if percentage >= dec!(41) && percentage <= dec!(100) {
            RoundingBand::RoundUp
        } else {
            RoundingBand::Unbanded
        }
    }
}

/// The tier (or pair of tiers) chosen for a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MatchResult {
    /// The request fits within the catalog.
    Single {
        tier: ProductTier,
        estimated_installment: Decimal,
    },
    /// The request exceeds the largest tier and needs a second one.
    Combined {
        /// The largest tier of the catalog.
        primary: ProductTier,
        /// The tier covering the shortfall, after rounding.
        secondary: ProductTier,
        /// The shortfall the second tier had to cover.
        additional: Decimal,
        /// The shortfall as a percentage of the tier first selected for it.
        percentage: Decimal,
        band: RoundingBand,
        combined_credit: Decimal,
        combined_installment: Decimal,
    },
}

impl MatchResult {
    /// The single tier, or the largest tier of a combination.
    pub fn primary(&self) -> &ProductTier {
        match self {
            MatchResult::Single { tier, .. } => tier,
            MatchResult::Combined { primary, .. } => primary,
        }
    }

    /// Whether two tiers were needed.
    pub fn is_combined(&self) -> bool {
        matches!(self, MatchResult::Combined { .. })
    }

    /// Total credit delivered by the match.
    pub fn credit_value(&self) -> Decimal {
        match self {
            MatchResult::Single { tier, .. } => tier.credit_value,
            MatchResult::Combined { combined_credit, .. } => *combined_credit,
        }
    }

    /// Total estimated installment of the match.
    pub fn installment(&self) -> Decimal {
        match self {
            MatchResult::Single { estimated_installment, .. } => *estimated_installment,
            MatchResult::Combined { combined_installment, .. } => *combined_installment,
        }
    }
}

/// A tier paired with the value it is compared on.
struct Candidate<'a> {
    tier: &'a ProductTier,
    value: Decimal,
}

fn candidates<'a>(tiers: &'a [ProductTier], metric: impl Fn(&ProductTier) -> Decimal) -> Vec<Candidate<'a>> {
    let mut sorted: Vec<&ProductTier> = tiers.iter().collect();
    sorted.sort_by(|a, b| a.credit_value.cmp(&b.credit_value));

    sorted
        .into_iter()
        .map(|tier| Candidate { tier, value: metric(tier) })
        .collect()
}

/// First candidate with the smallest distance to `target`.
fn closest<'c, 'a>(candidates: &'c [Candidate<'a>], target: Decimal) -> Option<&'c Candidate<'a>> {
    let mut best: Option<(&Candidate, Decimal)> = None;
    for candidate in candidates {
        let distance = (candidate.value - target).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((candidate, distance)),
        }
    }
    best.map(|(candidate, _)| candidate)
}

fn select(
    candidates: &[Candidate<'_>],
    target: Decimal,
    installment: impl Fn(&ProductTier) -> Decimal,
) -> Option<MatchResult> {
    let largest = candidates.last()?;

    if target <= largest.value {
        let best = closest(candidates, target)?;
        return Some(MatchResult::Single {
            tier: best.tier.clone(),
            estimated_installment: installment(best.tier),
        });
    }

    let additional = target - largest.value;
    let selected = candidates
        .iter()
        .position(|candidate| candidate.value >= additional)
        .unwrap_or(0);

    // A zero-valued tier yields no percentage; an overflowing one lands above every band.
    let selected_value = candidates[selected].value;
    let percentage = if selected_value.is_zero() {
        dec!(0)
    } else {
        additional
            .checked_div(selected_value)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::MAX)
    };

    let band = RoundingBand::classify(percentage);
    let secondary = match band {
        RoundingBand::RoundDown if selected > 0 => candidates[selected - 1].tier,
        _ => candidates[selected].tier,
    };

    debug!(
        primary = %largest.tier.id,
        secondary = %secondary.id,
        %additional,
        %percentage,
        ?band,
        "combining tiers"
    );

    Some(MatchResult::Combined {
        primary: largest.tier.clone(),
        secondary: secondary.clone(),
        additional,
        percentage,
        band,
        combined_credit: largest.tier.credit_value + secondary.credit_value,
        combined_installment: installment(largest.tier) + installment(secondary),
    })
}

/// Finds the tier (or tier pair) that best serves a requested credit value.
///
/// Returns `None` when the catalog is empty. Installments are estimated over each tier's
/// longest term.
pub fn match_by_credit_value(tiers: &[ProductTier], target_credit: Decimal) -> Option<MatchResult> {
    let candidates = candidates(tiers, |tier| tier.credit_value);
    select(&candidates, target_credit, ProductTier::estimated_installment)
}

/// Finds the tier (or tier pair) whose installment over `term_months` best fits a
/// monthly contribution.
///
/// # Errors
///
/// Returns [`SimulationError::ZeroTerm`] if `term_months` is zero.
pub fn match_by_contribution(
    tiers: &[ProductTier],
    target_installment: Decimal,
    term_months: u32,
) -> Result<Option<MatchResult>> {
    if term_months == 0 {
        return Err(SimulationError::ZeroTerm);
    }

    let term = Decimal::from(term_months);
    let installment = |tier: &ProductTier| tier.credit_value / term;
    let candidates = candidates(tiers, installment);

    Ok(select(&candidates, target_installment, installment))
}
