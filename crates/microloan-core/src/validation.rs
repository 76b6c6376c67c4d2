//! Bounds checking for user-supplied principal and term values.
//!
//! Runs before the pricing engine so that out-of-range selections are
//! reported against the offending field and the engine only ever sees
//! values the product actually offers.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MicroloanError;
use crate::types::{LoanQuoteRequest, Money, RepaymentFrequency};
use crate::MicroloanResult;

/// Which repayment terms a surface offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum TermPolicy {
    /// Term must be one of an enumerated list (the application form).
    Discrete { allowed: Vec<u32> },
    /// Term must fall in `[min_days, max_days]` on a `step_days` grid
    /// anchored at `min_days` (the slider widget).
    Range {
        min_days: u32,
        max_days: u32,
        step_days: u32,
    },
}

impl TermPolicy {
    fn min_days(&self) -> u32 {
        match self {
            TermPolicy::Discrete { allowed } => allowed.iter().copied().min().unwrap_or(0),
            TermPolicy::Range { min_days, .. } => *min_days,
        }
    }

    fn max_days(&self) -> u32 {
        match self {
            TermPolicy::Discrete { allowed } => allowed.iter().copied().max().unwrap_or(0),
            TermPolicy::Range { max_days, .. } => *max_days,
        }
    }

    fn offers(&self, term_days: u32) -> bool {
        match self {
            TermPolicy::Discrete { allowed } => allowed.contains(&term_days),
            TermPolicy::Range {
                min_days,
                step_days,
                ..
            } => term_days
                .checked_sub(*min_days)
                .and_then(|offset| offset.checked_rem(*step_days))
                .is_some_and(|rem| rem == 0),
        }
    }

    fn describe(&self) -> String {
        match self {
            TermPolicy::Discrete { allowed } => allowed
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            TermPolicy::Range {
                min_days,
                max_days,
                step_days,
            } => format!("{min_days}-{max_days} in steps of {step_days}"),
        }
    }
}

/// Allowed principal and term ranges for one product surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteBounds {
    pub min_principal: Money,
    pub max_principal: Money,
    pub term: TermPolicy,
}

impl Default for QuoteBounds {
    fn default() -> Self {
        Self {
            min_principal: dec!(500),
            max_principal: dec!(500000),
            term: TermPolicy::Discrete {
                allowed: vec![15, 30, 60, 90],
            },
        }
    }
}

impl QuoteBounds {
    /// Slider bounds used by the marketing calculator widget.
    pub fn slider() -> Self {
        Self {
            min_principal: dec!(500),
            max_principal: dec!(50000),
            term: TermPolicy::Range {
                min_days: 15,
                max_days: 90,
                step_days: 15,
            },
        }
    }

    /// Check the bounds themselves are usable.
    pub fn check(&self) -> MicroloanResult<()> {
        if self.min_principal <= Decimal::ZERO {
            return Err(MicroloanError::Config(
                "bounds.min_principal must be positive".into(),
            ));
        }
        if self.min_principal > self.max_principal {
            return Err(MicroloanError::Config(format!(
                "bounds.min_principal ({}) exceeds bounds.max_principal ({})",
                self.min_principal, self.max_principal
            )));
        }
        match &self.term {
            TermPolicy::Discrete { allowed } => {
                if allowed.is_empty() {
                    return Err(MicroloanError::Config(
                        "bounds.term.allowed must list at least one term".into(),
                    ));
                }
                if allowed.contains(&0) {
                    return Err(MicroloanError::Config(
                        "bounds.term.allowed cannot contain a zero-day term".into(),
                    ));
                }
            }
            TermPolicy::Range {
                min_days,
                max_days,
                step_days,
            } => {
                if *min_days == 0 || *step_days == 0 {
                    return Err(MicroloanError::Config(
                        "bounds.term min_days and step_days must be positive".into(),
                    ));
                }
                if min_days > max_days {
                    return Err(MicroloanError::Config(format!(
                        "bounds.term.min_days ({min_days}) exceeds max_days ({max_days})"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A principal/term pair that passed [`validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidatedInput {
    principal: Money,
    term_days: u32,
}

impl ValidatedInput {
    pub fn principal(&self) -> Money {
        self.principal
    }

    pub fn term_days(&self) -> u32 {
        self.term_days
    }

    pub fn into_request(self, frequency: RepaymentFrequency) -> LoanQuoteRequest {
        LoanQuoteRequest::new(self.principal, self.term_days).with_frequency(frequency)
    }
}

/// Check a principal/term selection against the configured bounds.
pub fn validate(
    principal: Money,
    term_days: u32,
    bounds: &QuoteBounds,
) -> MicroloanResult<ValidatedInput> {
    if principal < bounds.min_principal || principal > bounds.max_principal {
        return Err(MicroloanError::OutOfRange {
            field: "principal".into(),
            min: bounds.min_principal,
            max: bounds.max_principal,
        });
    }

    let min_days = bounds.term.min_days();
    let max_days = bounds.term.max_days();
    if term_days < min_days || term_days > max_days {
        return Err(MicroloanError::OutOfRange {
            field: "term_days".into(),
            min: Decimal::from(min_days),
            max: Decimal::from(max_days),
        });
    }
    if !bounds.term.offers(term_days) {
        return Err(MicroloanError::UnsupportedTerm {
            term_days,
            allowed: bounds.term.describe(),
        });
    }

    Ok(ValidatedInput {
        principal,
        term_days,
    })
}
