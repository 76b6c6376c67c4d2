//! Calculator view-model shared by every quoting surface.
//!
//! Holds the borrower's current selection and the quote (or error) for it.
//! Each change re-validates and issues a [`QuoteTicket`]; the outcome for a
//! ticket is only stored if no newer ticket has been issued since, so a slow
//! response can never overwrite a later one.

use serde::Serialize;

use crate::error::MicroloanError;
use crate::format::{CurrencyFormatter, QuoteDisplay};
use crate::provider::QuoteProvider;
use crate::types::{LoanQuoteRequest, LoanQuoteResult, Money, RepaymentFrequency};
use crate::validation::{self, QuoteBounds};
use crate::MicroloanResult;

/// A validated request waiting for its quote.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteTicket {
    generation: u64,
    request: LoanQuoteRequest,
}

impl QuoteTicket {
    pub fn request(&self) -> &LoanQuoteRequest {
        &self.request
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Error as rendered next to a field or in a banner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    pub retryable: bool,
}

impl From<&MicroloanError> for ErrorView {
    fn from(e: &MicroloanError) -> Self {
        Self {
            field: e.field().map(str::to_string),
            message: e.to_string(),
            retryable: e.is_retryable(),
        }
    }
}

/// What the view layer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculatorSnapshot {
    pub principal: Money,
    pub term_days: u32,
    pub frequency: RepaymentFrequency,
    pub result: Option<LoanQuoteResult>,
    pub error: Option<ErrorView>,
    pub display: Option<QuoteDisplay>,
}

#[derive(Debug, Clone)]
pub struct CalculatorViewModel {
    bounds: QuoteBounds,
    principal: Money,
    term_days: u32,
    frequency: RepaymentFrequency,
    result: Option<LoanQuoteResult>,
    error: Option<MicroloanError>,
    generation: u64,
}

impl CalculatorViewModel {
    pub fn new(bounds: QuoteBounds, principal: Money, term_days: u32) -> Self {
        Self {
            bounds,
            principal,
            term_days,
            frequency: RepaymentFrequency::Daily,
            result: None,
            error: None,
            generation: 0,
        }
    }

    pub fn principal(&self) -> Money {
        self.principal
    }

    pub fn term_days(&self) -> u32 {
        self.term_days
    }

    pub fn frequency(&self) -> RepaymentFrequency {
        self.frequency
    }

    pub fn result(&self) -> Option<&LoanQuoteResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&MicroloanError> {
        self.error.as_ref()
    }

    pub fn set_principal(&mut self, value: Money) -> Option<QuoteTicket> {
        self.principal = value;
        self.revalidate()
    }

    pub fn set_term_days(&mut self, value: u32) -> Option<QuoteTicket> {
        self.term_days = value;
        self.revalidate()
    }

    pub fn set_frequency(&mut self, value: RepaymentFrequency) -> Option<QuoteTicket> {
        self.frequency = value;
        self.revalidate()
    }

    /// Re-issue a ticket for the current selection (initial load, retry).
    pub fn refresh(&mut self) -> Option<QuoteTicket> {
        self.revalidate()
    }

    /// Store the outcome for `ticket`. Returns `false` and leaves state
    /// untouched if a newer ticket has been issued.
    pub fn apply(
        &mut self,
        ticket: &QuoteTicket,
        outcome: MicroloanResult<LoanQuoteResult>,
    ) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                stale = ticket.generation,
                current = self.generation,
                "ignoring stale quote"
            );
            return false;
        }
        match outcome {
            Ok(quote) => {
                self.result = Some(quote);
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "quote failed");
                self.result = None;
                self.error = Some(e);
            }
        }
        true
    }

    pub async fn update_principal(&mut self, provider: &dyn QuoteProvider, value: Money) {
        let ticket = self.set_principal(value);
        self.resolve(provider, ticket).await;
    }

    pub async fn update_term_days(&mut self, provider: &dyn QuoteProvider, value: u32) {
        let ticket = self.set_term_days(value);
        self.resolve(provider, ticket).await;
    }

    pub async fn update_frequency(
        &mut self,
        provider: &dyn QuoteProvider,
        value: RepaymentFrequency,
    ) {
        let ticket = self.set_frequency(value);
        self.resolve(provider, ticket).await;
    }

    pub async fn reload(&mut self, provider: &dyn QuoteProvider) {
        let ticket = self.refresh();
        self.resolve(provider, ticket).await;
    }

    pub fn snapshot(&self, formatter: &CurrencyFormatter) -> CalculatorSnapshot {
        CalculatorSnapshot {
            principal: self.principal,
            term_days: self.term_days,
            frequency: self.frequency,
            result: self.result.clone(),
            error: self.error.as_ref().map(ErrorView::from),
            display: self.result.as_ref().map(|q| formatter.display(q)),
        }
    }

    async fn resolve(&mut self, provider: &dyn QuoteProvider, ticket: Option<QuoteTicket>) {
        if let Some(ticket) = ticket {
            let outcome = provider.quote(ticket.request()).await;
            self.apply(&ticket, outcome);
        }
    }

    fn revalidate(&mut self) -> Option<QuoteTicket> {
        // Any in-flight ticket is stale from here on, valid or not.
        self.generation += 1;
        match validation::validate(self.principal, self.term_days, &self.bounds) {
            Ok(valid) => Some(QuoteTicket {
                generation: self.generation,
                request: valid.into_request(self.frequency),
            }),
            Err(e) => {
                self.result = None;
                self.error = Some(e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::PricingPolicy;
    use crate::provider::LocalQuoteProvider;
    use rust_decimal_macros::dec;

    fn vm() -> CalculatorViewModel {
        CalculatorViewModel::new(QuoteBounds::default(), dec!(5000), 30)
    }

    #[tokio::test]
    async fn test_update_recomputes() {
        let provider = LocalQuoteProvider::new(PricingPolicy::flat_rate());
        let mut vm = vm();
        vm.update_principal(&provider, dec!(10000)).await;
        vm.update_term_days(&provider, 60).await;

        let q = vm.result().unwrap();
        assert_eq!(q.total_due, dec!(10850));
        assert_eq!(q.term_days, 60);
        assert!(vm.error().is_none());
    }

    #[tokio::test]
    async fn test_out_of_range_clears_result() {
        let provider = LocalQuoteProvider::new(PricingPolicy::flat_rate());
        let mut vm = vm();
        vm.reload(&provider).await;
        assert!(vm.result().is_some());

        vm.update_principal(&provider, dec!(600000)).await;
        assert!(vm.result().is_none());
        match vm.error().unwrap() {
            MicroloanError::OutOfRange { field, max, .. } => {
                assert_eq!(field, "principal");
                assert_eq!(*max, dec!(500000));
            }
            other => panic!("Expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_selection_issues_no_ticket() {
        let mut vm = vm();
        assert!(vm.set_term_days(45).is_none());
        assert!(matches!(
            vm.error(),
            Some(MicroloanError::UnsupportedTerm { .. })
        ));
    }

    #[test]
    fn test_stale_ticket_ignored() {
        let provider = LocalQuoteProvider::new(PricingPolicy::flat_rate());
        let mut vm = vm();

        let first = vm.set_principal(dec!(1000)).unwrap();
        let second = vm.set_principal(dec!(2000)).unwrap();

        // later request resolves first
        let second_quote = provider.quote_now(second.request());
        assert!(vm.apply(&second, second_quote));
        let first_quote = provider.quote_now(first.request());
        assert!(!vm.apply(&first, first_quote));

        assert_eq!(vm.result().unwrap().principal, dec!(2000));
    }

    #[test]
    fn test_invalid_edit_invalidates_in_flight_ticket() {
        let provider = LocalQuoteProvider::new(PricingPolicy::flat_rate());
        let mut vm = vm();
        let ticket = vm.set_principal(dec!(1000)).unwrap();
        assert!(vm.set_principal(dec!(10)).is_none());

        assert!(!vm.apply(&ticket, provider.quote_now(ticket.request())));
        assert!(vm.result().is_none());
        assert!(vm.error().is_some());
    }

    #[test]
    fn test_snapshot_formats_result() {
        let provider = LocalQuoteProvider::new(PricingPolicy::annualized_simple());
        let mut vm = vm();
        let ticket = vm.refresh().unwrap();
        vm.apply(&ticket, provider.quote_now(ticket.request()));

        let snap = vm.snapshot(&CurrencyFormatter::default());
        let display = snap.display.unwrap();
        assert_eq!(display.disbursed_amount, "KSh 4,900");
        assert_eq!(display.total_due, "KSh 5,033");
        assert_eq!(display.periodic_payment, "KSh 168");
        assert_eq!(display.interest_rate, "8.0%");
        assert!(snap.error.is_none());
    }

    #[test]
    fn test_snapshot_error_view() {
        let mut vm = vm();
        vm.set_principal(dec!(100));
        let snap = vm.snapshot(&CurrencyFormatter::default());
        let err = snap.error.unwrap();
        assert_eq!(err.field.as_deref(), Some("principal"));
        assert!(!err.retryable);
        assert!(snap.result.is_none());
        assert!(snap.display.is_none());
    }
}
