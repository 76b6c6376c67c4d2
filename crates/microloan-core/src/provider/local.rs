use async_trait::async_trait;

use super::QuoteProvider;
use crate::pricing::{compute_quote, PricingPolicy};
use crate::types::{LoanQuoteRequest, LoanQuoteResult};
use crate::MicroloanResult;

/// Prices in-process with the canonical policy. Never touches the network.
#[derive(Debug, Clone, Default)]
pub struct LocalQuoteProvider {
    policy: PricingPolicy,
}

impl LocalQuoteProvider {
    pub fn new(policy: PricingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Synchronous form for surfaces without an executor.
    pub fn quote_now(&self, request: &LoanQuoteRequest) -> MicroloanResult<LoanQuoteResult> {
        compute_quote(request, &self.policy)
    }
}

#[async_trait]
impl QuoteProvider for LocalQuoteProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn quote(&self, request: &LoanQuoteRequest) -> MicroloanResult<LoanQuoteResult> {
        self.quote_now(request)
    }
}
