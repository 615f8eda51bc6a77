//! Currency arithmetic.
//!
//! Amounts are exact [`Decimal`]s throughout the computation. Rounding to
//! cents happens once, at presentation, using round-half-up (midpoint away
//! from zero).

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Money;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Months per year.
pub const MONTHS_PER_YEAR: i64 = 12;
/// Weeks per year, used to monthlise weekly contributions.
pub const WEEKS_PER_YEAR: i64 = 52;
/// Fortnights per year, used to monthlise fortnightly contributions.
pub const FORTNIGHTS_PER_YEAR: i64 = 26;

/// Valid frequency strings for a reasonable rent contribution.
pub const RENT_FREQUENCY_WEEKLY: &str = "weekly";
pub const RENT_FREQUENCY_FORTNIGHTLY: &str = "fortnightly";
pub const RENT_FREQUENCY_MONTHLY: &str = "monthly";

// ---------------------------------------------------------------------------
// Rounding
// ---------------------------------------------------------------------------

/// Round to whole cents, half-up.
pub fn round_cents(amount: Money) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// How often a participant pays their reasonable rent contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentFrequency {
    Weekly,
    Fortnightly,
    Monthly,
}

impl RentFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => RENT_FREQUENCY_WEEKLY,
            Self::Fortnightly => RENT_FREQUENCY_FORTNIGHTLY,
            Self::Monthly => RENT_FREQUENCY_MONTHLY,
        }
    }

    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            RENT_FREQUENCY_WEEKLY => Ok(Self::Weekly),
            RENT_FREQUENCY_FORTNIGHTLY => Ok(Self::Fortnightly),
            RENT_FREQUENCY_MONTHLY => Ok(Self::Monthly),
            other => Err(CoreError::InvalidInput(format!(
                "Unknown rent contribution frequency: '{other}'. Valid values: weekly, fortnightly, monthly"
            ))),
        }
    }

    /// Number of payments of this frequency in a year.
    fn periods_per_year(self) -> i64 {
        match self {
            Self::Weekly => WEEKS_PER_YEAR,
            Self::Fortnightly => FORTNIGHTS_PER_YEAR,
            Self::Monthly => MONTHS_PER_YEAR,
        }
    }
}

/// Monthly share of an annual amount.
pub fn monthly_from_annual(annual: Money) -> Money {
    annual / Decimal::from(MONTHS_PER_YEAR)
}

/// Normalise a rent contribution to a monthly figure by annualising it
/// first: weekly x 52 / 12, fortnightly x 26 / 12, monthly unchanged.
pub fn monthly_rrc(amount: Money, frequency: RentFrequency) -> Money {
    match frequency {
        RentFrequency::Monthly => amount,
        other => amount * Decimal::from(other.periods_per_year()) / Decimal::from(MONTHS_PER_YEAR),
    }
}

/// `amount x percent / 100`.
pub fn percent_of(amount: Money, percent: Decimal) -> Money {
    amount * percent / Decimal::ONE_HUNDRED
}
