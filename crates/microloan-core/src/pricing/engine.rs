//! Loan quote computation.
//!
//! `compute_quote` is the single pricing function every surface goes
//! through. It is pure: no clamping of inputs, no rounding, no I/O. Rounding
//! to display precision is left to [`crate::format`] and the repayment
//! schedule.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::policy::{FeeClamp, PricingPolicy};
use crate::error::MicroloanError;
use crate::types::{
    with_metadata, ComputationOutput, LoanQuoteRequest, LoanQuoteResult, Money,
    RepaymentFrequency,
};
use crate::validation::{self, QuoteBounds};
use crate::MicroloanResult;

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// Input for [`price_quote`]: a selection plus the product rules it is priced
/// and bounded by.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuoteInput {
    pub principal: Money,
    pub term_days: u32,
    #[serde(default)]
    pub frequency: RepaymentFrequency,
    #[serde(default)]
    pub policy: PricingPolicy,
    #[serde(default)]
    pub bounds: QuoteBounds,
}

/// The same request priced under both rate models found in the product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelComparison {
    pub annualized: LoanQuoteResult,
    pub flat: LoanQuoteResult,
    /// flat.total_due - annualized.total_due
    pub total_due_difference: Money,
    /// flat.disbursed_amount - annualized.disbursed_amount
    pub disbursed_difference: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Price a loan request under `policy`.
///
/// Fails with `Config` on an unusable policy, and with `InvalidQuoteInput`
/// on a non-positive principal, a zero-day term, an amount too large to
/// price, or a principal that does not cover a deducted fee.
pub fn compute_quote(
    request: &LoanQuoteRequest,
    policy: &PricingPolicy,
) -> MicroloanResult<LoanQuoteResult> {
    policy.check()?;
    if request.principal <= Decimal::ZERO {
        return Err(MicroloanError::InvalidQuoteInput {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }
    if request.term_days == 0 {
        return Err(MicroloanError::InvalidQuoteInput {
            field: "term_days".into(),
            reason: "Term must be at least one day".into(),
        });
    }

    let principal = request.principal;
    let (interest_amount, total_due) = policy
        .interest
        .interest(principal, request.term_days)
        .and_then(|interest| Some((interest, principal.checked_add(interest)?)))
        .ok_or_else(|| MicroloanError::InvalidQuoteInput {
            field: "principal".into(),
            reason: format!(
                "Principal {principal} over {} days is too large to price",
                request.term_days
            ),
        })?;

    let (service_fee, fee_deducted, _) = policy.fee.charge(principal);
    let disbursed_amount = if fee_deducted {
        principal - service_fee
    } else {
        principal
    };
    if disbursed_amount <= Decimal::ZERO {
        return Err(MicroloanError::InvalidQuoteInput {
            field: "principal".into(),
            reason: format!("Principal {principal} does not cover the service fee {service_fee}"),
        });
    }

    let installments = request.frequency.installments(request.term_days);
    let periodic_payment = total_due / Decimal::from(installments);

    tracing::debug!(
        principal = %principal,
        term_days = request.term_days,
        total_due = %total_due,
        "quote computed"
    );

    Ok(LoanQuoteResult {
        principal,
        term_days: request.term_days,
        frequency: request.frequency,
        interest_rate_percent: policy.interest_rate_percent(),
        service_fee,
        fee_deducted,
        interest_amount,
        total_due,
        disbursed_amount,
        installments,
        periodic_payment,
    })
}

/// Validate a selection against its bounds, price it, and wrap the result in
/// the standard output envelope.
pub fn price_quote(
    input: &PriceQuoteInput,
) -> MicroloanResult<ComputationOutput<LoanQuoteResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.bounds.check()?;
    input.policy.check()?;
    let request =
        validation::validate(input.principal, input.term_days, &input.bounds)?
            .into_request(input.frequency);

    let quote = compute_quote(&request, &input.policy)?;

    match input.policy.fee.charge(request.principal).2 {
        Some(FeeClamp::Floor) => warnings.push(format!(
            "Service fee raised to its minimum of {}",
            quote.service_fee
        )),
        Some(FeeClamp::Ceiling) => warnings.push(format!(
            "Service fee capped at its maximum of {}",
            quote.service_fee
        )),
        None => {}
    }
    if !quote.fee_deducted && !quote.service_fee.is_zero() {
        warnings.push(format!(
            "Disbursement fee of {} is charged separately and not deducted from the payout",
            quote.service_fee
        ));
    }
    if quote.term_days % request.frequency.period_days() != 0 {
        warnings.push(format!(
            "Term of {} days is not a whole number of {:?} periods; final installment covers a partial period",
            quote.term_days, request.frequency
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        &format!("Loan quote — {}", input.policy.methodology()),
        &serde_json::json!({
            "interest": input.policy.interest,
            "fee": input.policy.fee,
            "bounds": input.bounds,
            "rounding": "none; full decimal precision until display",
        }),
        warnings,
        elapsed,
        quote,
    ))
}

/// Price one request under both the annualized and the flat rate model.
pub fn compare_models(request: &LoanQuoteRequest) -> MicroloanResult<ModelComparison> {
    let annualized = compute_quote(request, &PricingPolicy::annualized_simple())?;
    let flat = compute_quote(request, &PricingPolicy::flat_rate())?;
    Ok(ModelComparison {
        total_due_difference: flat.total_due - annualized.total_due,
        disbursed_difference: flat.disbursed_amount - annualized.disbursed_amount,
        annualized,
        flat,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::InterestModel;
    use rust_decimal_macros::dec;

    fn assert_close(actual: Decimal, expected: Decimal) {
        assert!(
            (actual - expected).abs() < dec!(0.01),
            "expected ~{expected}, got {actual}"
        );
    }

    // -----------------------------------------------------------------------
    // 1. Annualized: 5000 over 30 days
    // -----------------------------------------------------------------------
    #[test]
    fn test_annualized_5000_over_30_days() {
        let req = LoanQuoteRequest::new(dec!(5000), 30);
        let q = compute_quote(&req, &PricingPolicy::annualized_simple()).unwrap();

        // fee = clamp(100, 50, 500) = 100
        assert_eq!(q.service_fee, dec!(100));
        assert!(q.fee_deducted);
        // 5000 * 0.08 * 30 / 365 = 32.8767...
        assert_close(q.interest_amount, dec!(32.88));
        assert_close(q.total_due, dec!(5032.88));
        assert_eq!(q.disbursed_amount, dec!(4900));
        assert_close(q.periodic_payment, dec!(167.76));
        assert_eq!(q.installments, 30);
        assert_eq!(q.interest_rate_percent, dec!(8));
    }

    // -----------------------------------------------------------------------
    // 2. Flat: 10000 over 60 days
    // -----------------------------------------------------------------------
    #[test]
    fn test_flat_10000_over_60_days() {
        let req = LoanQuoteRequest::new(dec!(10000), 60);
        let q = compute_quote(&req, &PricingPolicy::flat_rate()).unwrap();

        assert_eq!(q.interest_amount, dec!(850));
        assert_eq!(q.total_due, dec!(10850));
        assert_eq!(q.service_fee, dec!(100));
        assert!(!q.fee_deducted);
        assert_eq!(q.disbursed_amount, dec!(10000));
        assert_close(q.periodic_payment, dec!(180.83));
        assert_eq!(q.interest_rate_percent, dec!(8.5));
    }

    // -----------------------------------------------------------------------
    // 3. Minimum principal and term: fee clamps to floor
    // -----------------------------------------------------------------------
    #[test]
    fn test_minimum_loan_fee_floor() {
        let req = LoanQuoteRequest::new(dec!(500), 15);
        let q = compute_quote(&req, &PricingPolicy::annualized_simple()).unwrap();

        assert_eq!(q.service_fee, dec!(50));
        assert_eq!(q.disbursed_amount, dec!(450));
        assert!(q.interest_amount > Decimal::ZERO);
        assert!(q.total_due > q.principal);
    }

    #[test]
    fn test_zero_principal_rejected() {
        let req = LoanQuoteRequest::new(Decimal::ZERO, 30);
        match compute_quote(&req, &PricingPolicy::default()).unwrap_err() {
            MicroloanError::InvalidQuoteInput { field, .. } => assert_eq!(field, "principal"),
            other => panic!("Expected InvalidQuoteInput, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_principal_rejected() {
        let req = LoanQuoteRequest::new(dec!(-100), 30);
        assert!(matches!(
            compute_quote(&req, &PricingPolicy::annualized_simple()),
            Err(MicroloanError::InvalidQuoteInput { .. })
        ));
    }

    #[test]
    fn test_zero_term_rejected() {
        let req = LoanQuoteRequest::new(dec!(5000), 0);
        match compute_quote(&req, &PricingPolicy::default()).unwrap_err() {
            MicroloanError::InvalidQuoteInput { field, .. } => assert_eq!(field, "term_days"),
            other => panic!("Expected InvalidQuoteInput, got {:?}", other),
        }
    }

    #[test]
    fn test_principal_below_fee_floor_rejected() {
        // 40 < fee floor of 50: payout would be negative
        let req = LoanQuoteRequest::new(dec!(40), 30);
        assert!(matches!(
            compute_quote(&req, &PricingPolicy::annualized_simple()),
            Err(MicroloanError::InvalidQuoteInput { .. })
        ));
    }

    #[test]
    fn test_zero_day_count_basis_is_config_error() {
        let policy = PricingPolicy {
            interest: InterestModel::AnnualizedSimple {
                annual_rate: dec!(0.08),
                day_count_basis: 0,
            },
            ..PricingPolicy::annualized_simple()
        };
        let req = LoanQuoteRequest::new(dec!(5000), 30);
        match compute_quote(&req, &policy).unwrap_err() {
            MicroloanError::Config(msg) => assert!(msg.contains("day_count_basis")),
            other => panic!("Expected Config, got {:?}", other),
        }
    }

    #[test]
    fn test_overflowing_principal_rejected() {
        let req = LoanQuoteRequest::new(Decimal::MAX, 365);
        match compute_quote(&req, &PricingPolicy::annualized_simple()).unwrap_err() {
            MicroloanError::InvalidQuoteInput { field, reason } => {
                assert_eq!(field, "principal");
                assert!(reason.contains("too large"));
            }
            other => panic!("Expected InvalidQuoteInput, got {:?}", other),
        }
        // Flat interest on the largest principal still overflows the total
        assert!(matches!(
            compute_quote(&req, &PricingPolicy::flat_rate()),
            Err(MicroloanError::InvalidQuoteInput { .. })
        ));
    }

    #[test]
    fn test_weekly_installments() {
        let req = LoanQuoteRequest::new(dec!(10000), 28).with_frequency(RepaymentFrequency::Weekly);
        let q = compute_quote(&req, &PricingPolicy::flat_rate()).unwrap();
        assert_eq!(q.installments, 4);
        assert_eq!(q.periodic_payment, dec!(2712.5));
    }

    #[test]
    fn test_price_quote_envelope() {
        let input = PriceQuoteInput {
            principal: dec!(500),
            term_days: 15,
            frequency: RepaymentFrequency::Daily,
            policy: PricingPolicy::annualized_simple(),
            bounds: QuoteBounds::default(),
        };
        let out = price_quote(&input).unwrap();
        assert!(out.methodology.contains("Annualized"));
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
        assert!(out.warnings.iter().any(|w| w.contains("minimum")));
        assert_eq!(out.result.service_fee, dec!(50));
    }

    #[test]
    fn test_price_quote_rejects_out_of_range_before_pricing() {
        let input = PriceQuoteInput {
            principal: dec!(600000),
            term_days: 30,
            frequency: RepaymentFrequency::Daily,
            policy: PricingPolicy::default(),
            bounds: QuoteBounds::default(),
        };
        match price_quote(&input).unwrap_err() {
            MicroloanError::OutOfRange { field, max, .. } => {
                assert_eq!(field, "principal");
                assert_eq!(max, dec!(500000));
            }
            other => panic!("Expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_price_quote_partial_period_warning() {
        let input = PriceQuoteInput {
            principal: dec!(5000),
            term_days: 30,
            frequency: RepaymentFrequency::Weekly,
            policy: PricingPolicy::default(),
            bounds: QuoteBounds::default(),
        };
        let out = price_quote(&input).unwrap();
        assert_eq!(out.result.installments, 5);
        assert!(out.warnings.iter().any(|w| w.contains("partial period")));
    }

    #[test]
    fn test_compare_models() {
        let cmp = compare_models(&LoanQuoteRequest::new(dec!(10000), 60)).unwrap();
        assert_eq!(cmp.flat.total_due, dec!(10850));
        assert!(cmp.total_due_difference > Decimal::ZERO);
        // flat pays out the full principal, annualized deducts 200
        assert_eq!(cmp.disbursed_difference, dec!(200));
    }
}
