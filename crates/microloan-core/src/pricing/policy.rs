use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MicroloanError;
use crate::types::{Money, Rate};
use crate::MicroloanResult;

/// How interest accrues on the principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum InterestModel {
    /// Simple interest at a nominal annual rate, pro-rated by
    /// `term_days / day_count_basis`.
    AnnualizedSimple {
        annual_rate: Rate,
        #[serde(default = "default_day_count_basis")]
        day_count_basis: u32,
    },
    /// One rate applied to the principal regardless of term length.
    FlatPerTerm { rate: Rate },
}

fn default_day_count_basis() -> u32 {
    365
}

impl InterestModel {
    pub fn rate(&self) -> Rate {
        match self {
            InterestModel::AnnualizedSimple { annual_rate, .. } => *annual_rate,
            InterestModel::FlatPerTerm { rate } => *rate,
        }
    }

    /// Interest owed over `term_days`. `None` when the amount overflows
    /// `Decimal` or the day-count basis is zero.
    pub fn interest(&self, principal: Money, term_days: u32) -> Option<Money> {
        match self {
            InterestModel::AnnualizedSimple {
                annual_rate,
                day_count_basis,
            } => principal
                .checked_mul(*annual_rate)?
                .checked_mul(Decimal::from(term_days))?
                .checked_div(Decimal::from(*day_count_basis)),
            InterestModel::FlatPerTerm { rate } => principal.checked_mul(*rate),
        }
    }
}

/// Where the fee comes from and whether the borrower sees it deducted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeePolicy {
    /// `clamp(principal * rate, floor, ceiling)`, deducted from the
    /// disbursement.
    Proportional {
        rate: Rate,
        floor: Money,
        ceiling: Money,
    },
    /// Fixed disbursement fee reported alongside the quote; the borrower
    /// receives the full principal.
    Flat { amount: Money },
}

/// Which side of a proportional fee's clamp was hit, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeClamp {
    Floor,
    Ceiling,
}

impl FeePolicy {
    /// Returns `(fee, deducted, clamp)`.
    pub fn charge(&self, principal: Money) -> (Money, bool, Option<FeeClamp>) {
        match self {
            FeePolicy::Proportional {
                rate,
                floor,
                ceiling,
            } => {
                // Overflow only happens far above any ceiling
                let raw = principal.checked_mul(*rate).unwrap_or(Decimal::MAX);
                if raw < *floor {
                    (*floor, true, Some(FeeClamp::Floor))
                } else if raw > *ceiling {
                    (*ceiling, true, Some(FeeClamp::Ceiling))
                } else {
                    (raw, true, None)
                }
            }
            FeePolicy::Flat { amount } => (*amount, false, None),
        }
    }
}

/// The one pricing rule every surface quotes with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub interest: InterestModel,
    pub fee: FeePolicy,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self::flat_rate()
    }
}

impl PricingPolicy {
    /// 8% a year simple interest, 2% service fee clamped to [50, 500] and
    /// deducted at disbursement.
    pub fn annualized_simple() -> Self {
        Self {
            interest: InterestModel::AnnualizedSimple {
                annual_rate: dec!(0.08),
                day_count_basis: 365,
            },
            fee: FeePolicy::Proportional {
                rate: dec!(0.02),
                floor: dec!(50),
                ceiling: dec!(500),
            },
        }
    }

    /// 8.5% flat per term with a separate 100 disbursement fee. Matches the
    /// backend's `/loans/calculate/` endpoint.
    pub fn flat_rate() -> Self {
        Self {
            interest: InterestModel::FlatPerTerm { rate: dec!(0.085) },
            fee: FeePolicy::Flat { amount: dec!(100) },
        }
    }

    pub fn interest_rate_percent(&self) -> Decimal {
        (self.interest.rate() * dec!(100)).normalize()
    }

    pub fn methodology(&self) -> &'static str {
        match self.interest {
            InterestModel::AnnualizedSimple { .. } => "Annualized simple interest",
            InterestModel::FlatPerTerm { .. } => "Flat per-term interest",
        }
    }

    /// Reject policies that would price nonsense.
    pub fn check(&self) -> MicroloanResult<()> {
        match &self.interest {
            InterestModel::AnnualizedSimple {
                annual_rate,
                day_count_basis,
            } => {
                if *annual_rate < Decimal::ZERO {
                    return Err(MicroloanError::Config(
                        "pricing.interest.annual_rate cannot be negative".into(),
                    ));
                }
                if *day_count_basis == 0 {
                    return Err(MicroloanError::Config(
                        "pricing.interest.day_count_basis must be positive".into(),
                    ));
                }
            }
            InterestModel::FlatPerTerm { rate } => {
                if *rate < Decimal::ZERO {
                    return Err(MicroloanError::Config(
                        "pricing.interest.rate cannot be negative".into(),
                    ));
                }
            }
        }
        match &self.fee {
            FeePolicy::Proportional {
                rate,
                floor,
                ceiling,
            } => {
                if *rate < Decimal::ZERO || *floor < Decimal::ZERO {
                    return Err(MicroloanError::Config(
                        "pricing.fee rate and floor cannot be negative".into(),
                    ));
                }
                if floor > ceiling {
                    return Err(MicroloanError::Config(format!(
                        "pricing.fee.floor ({floor}) exceeds pricing.fee.ceiling ({ceiling})"
                    )));
                }
            }
            FeePolicy::Flat { amount } => {
                if *amount < Decimal::ZERO {
                    return Err(MicroloanError::Config(
                        "pricing.fee.amount cannot be negative".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}
