use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use microloan_core::format::CurrencyFormatter;
use microloan_core::pricing::{self, PriceQuoteInput, PricingPolicy};
use microloan_core::validation::{self, QuoteBounds};
use microloan_core::{repayment, LoanQuoteRequest, LoanQuoteResult, Money};

fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_or_default<T>(json: Option<String>) -> NapiResult<T>
where
    T: for<'de> Deserialize<'de> + Default,
{
    match json {
        Some(s) => serde_json::from_str(&s).map_err(to_napi_error),
        None => Ok(T::default()),
    }
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// Price a `{principal, term_days, frequency?}` request. The policy defaults
/// to the product's flat rate.
#[napi]
pub fn compute_quote(request_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let request: LoanQuoteRequest = serde_json::from_str(&request_json).map_err(to_napi_error)?;
    let policy: PricingPolicy = parse_or_default(policy_json)?;
    let quote = pricing::compute_quote(&request, &policy).map_err(to_napi_error)?;
    serde_json::to_string(&quote).map_err(to_napi_error)
}

/// Bounds check plus pricing, with warnings and metadata.
#[napi]
pub fn price_quote(input_json: String) -> NapiResult<String> {
    let input: PriceQuoteInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = pricing::price_quote(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ValidateQuoteInput {
    principal: Money,
    term_days: u32,
    #[serde(default)]
    bounds: QuoteBounds,
}

#[napi]
pub fn validate_quote(input_json: String) -> NapiResult<String> {
    let input: ValidateQuoteInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let validated = validation::validate(input.principal, input.term_days, &input.bounds)
        .map_err(to_napi_error)?;
    serde_json::to_string(&validated).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// Display strings for a computed quote. The formatter defaults to KES.
#[napi]
pub fn format_quote(quote_json: String, formatter_json: Option<String>) -> NapiResult<String> {
    let quote: LoanQuoteResult = serde_json::from_str(&quote_json).map_err(to_napi_error)?;
    let formatter: CurrencyFormatter = parse_or_default(formatter_json)?;
    serde_json::to_string(&formatter.display(&quote)).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Repayment
// ---------------------------------------------------------------------------

/// Installment schedule for a quote disbursed on `disbursed_on` (YYYY-MM-DD).
#[napi]
pub fn build_schedule(quote_json: String, disbursed_on: String) -> NapiResult<String> {
    let quote: LoanQuoteResult = serde_json::from_str(&quote_json).map_err(to_napi_error)?;
    let date = chrono::NaiveDate::parse_from_str(&disbursed_on, "%Y-%m-%d")
        .map_err(|e| to_napi_error(format!("disbursed_on: {}", e)))?;
    let schedule = repayment::build_schedule(&quote, date).map_err(to_napi_error)?;
    serde_json::to_string(&schedule).map_err(to_napi_error)
}
