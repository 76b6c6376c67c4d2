//! Installment schedule, due dates and balances for a quoted loan.

use chrono::{Days, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MicroloanError;
use crate::types::{LoanQuoteResult, Money};
use crate::MicroloanResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub number: u32,
    pub due_date: NaiveDate,
    pub amount: Money,
    /// Balance left once this installment is paid
    pub remaining_after: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentSchedule {
    pub disbursed_on: NaiveDate,
    pub final_due_date: NaiveDate,
    pub total_due: Money,
    pub installments: Vec<Installment>,
}

/// Ten years of daily repayments.
pub const MAX_INSTALLMENTS: u32 = 3650;

/// Date the whole balance falls due.
pub fn loan_due_date(disbursed_on: NaiveDate, term_days: u32) -> MicroloanResult<NaiveDate> {
    add_days(disbursed_on, term_days)
}

/// Lay the quote out as dated installments rounded to cents. The last
/// installment absorbs the rounding residue and always falls on the loan's
/// due date.
pub fn build_schedule(
    quote: &LoanQuoteResult,
    disbursed_on: NaiveDate,
) -> MicroloanResult<RepaymentSchedule> {
    if quote.term_days == 0 {
        return Err(MicroloanError::InvalidQuoteInput {
            field: "term_days".into(),
            reason: "Quote has no installments to schedule".into(),
        });
    }
    let count = quote.frequency.installments(quote.term_days);
    if quote.installments != count {
        return Err(MicroloanError::InvalidQuoteInput {
            field: "installments".into(),
            reason: format!(
                "{} installments do not fit a {}-day term paid {:?}; expected {}",
                quote.installments, quote.term_days, quote.frequency, count
            ),
        });
    }

    if count > MAX_INSTALLMENTS {
        return Err(MicroloanError::InvalidQuoteInput {
            field: "term_days".into(),
            reason: format!("Schedules are limited to {MAX_INSTALLMENTS} installments, got {count}"),
        });
    }

    let final_due_date = loan_due_date(disbursed_on, quote.term_days)?;
    let total = round_cents(quote.total_due);
    let regular = round_cents(quote.periodic_payment);
    let period = quote.frequency.period_days();

    let mut installments = Vec::with_capacity(count as usize);
    let mut remaining = total;
    for number in 1..=count {
        let is_last = number == count;
        let amount = if is_last { remaining } else { regular.min(remaining) };
        let due_date = if is_last {
            final_due_date
        } else {
            add_days(disbursed_on, number * period)?
        };
        remaining -= amount;
        installments.push(Installment {
            number,
            due_date,
            amount,
            remaining_after: remaining,
        });
    }

    Ok(RepaymentSchedule {
        disbursed_on,
        final_due_date,
        total_due: total,
        installments,
    })
}

/// What is still owed after `repaid`; never negative.
pub fn outstanding_balance(total_due: Money, repaid: Money) -> MicroloanResult<Money> {
    if repaid < Decimal::ZERO {
        return Err(MicroloanError::InvalidQuoteInput {
            field: "repaid".into(),
            reason: "Repaid amount cannot be negative".into(),
        });
    }
    Ok((total_due - repaid).max(Decimal::ZERO))
}

/// Share of `total_due` repaid, as a percentage capped at 100.
pub fn repayment_progress(total_due: Money, repaid: Money) -> MicroloanResult<Decimal> {
    if total_due <= Decimal::ZERO {
        return Err(MicroloanError::InvalidQuoteInput {
            field: "total_due".into(),
            reason: "Total due must be positive".into(),
        });
    }
    outstanding_balance(total_due, repaid)?;
    Ok((repaid / total_due * dec!(100)).min(dec!(100)))
}

fn round_cents(amount: Money) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn add_days(date: NaiveDate, days: u32) -> MicroloanResult<NaiveDate> {
    date.checked_add_days(Days::new(u64::from(days)))
        .ok_or_else(|| MicroloanError::InvalidQuoteInput {
            field: "disbursed_on".into(),
            reason: format!("{date} + {days} days is outside the supported calendar"),
        })
}
