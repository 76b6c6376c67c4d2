//! Quote providers: where a surface gets its numbers from.
//!
//! Surfaces are written against [`QuoteProvider`] only. The local provider
//! prices in-process with the canonical policy; the remote provider asks the
//! backend's `/loans/calculate/` endpoint. Both must agree to within
//! [`RECONCILE_TOLERANCE`] for the same request.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{LoanQuoteRequest, LoanQuoteResult, Money};
use crate::MicroloanResult;

pub mod local;
#[cfg(feature = "remote")]
pub mod remote;

pub use local::LocalQuoteProvider;
#[cfg(feature = "remote")]
pub use remote::{RemoteQuoteProvider, BACKEND_MIN_PRINCIPAL};

/// Largest per-field difference at which two quotes still agree.
pub const RECONCILE_TOLERANCE: Money = dec!(0.01);

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Short name for logs and reports.
    fn name(&self) -> &str;

    async fn quote(&self, request: &LoanQuoteRequest) -> MicroloanResult<LoanQuoteResult>;
}

/// One compared field of a reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDifference {
    pub field: String,
    pub left: Money,
    pub right: Money,
    pub difference: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reconciliation {
    pub left_provider: String,
    pub right_provider: String,
    pub request: LoanQuoteRequest,
    pub fields: Vec<FieldDifference>,
    pub max_difference: Money,
    pub agrees: bool,
}

/// Compare the monetary fields two quotes have in common.
pub fn compare_quotes(left: &LoanQuoteResult, right: &LoanQuoteResult) -> Vec<FieldDifference> {
    let pairs = [
        ("principal", left.principal, right.principal),
        (
            "interest_rate_percent",
            left.interest_rate_percent,
            right.interest_rate_percent,
        ),
        ("service_fee", left.service_fee, right.service_fee),
        ("interest_amount", left.interest_amount, right.interest_amount),
        ("total_due", left.total_due, right.total_due),
        ("disbursed_amount", left.disbursed_amount, right.disbursed_amount),
        ("periodic_payment", left.periodic_payment, right.periodic_payment),
    ];
    pairs
        .into_iter()
        .map(|(field, l, r)| FieldDifference {
            field: field.to_string(),
            left: l,
            right: r,
            difference: (l - r).abs(),
        })
        .collect()
}

/// Quote the same request through two providers and check they agree.
pub async fn reconcile(
    left: &dyn QuoteProvider,
    right: &dyn QuoteProvider,
    request: &LoanQuoteRequest,
) -> MicroloanResult<Reconciliation> {
    let l = left.quote(request).await?;
    let r = right.quote(request).await?;
    let fields = compare_quotes(&l, &r);
    let max_difference = fields
        .iter()
        .map(|f| f.difference)
        .max()
        .unwrap_or(Decimal::ZERO);
    let agrees = max_difference <= RECONCILE_TOLERANCE;

    if !agrees {
        tracing::warn!(
            left = left.name(),
            right = right.name(),
            max_difference = %max_difference,
            "providers disagree on quote"
        );
    }

    Ok(Reconciliation {
        left_provider: left.name().to_string(),
        right_provider: right.name().to_string(),
        request: request.clone(),
        fields,
        max_difference,
        agrees,
    })
}
