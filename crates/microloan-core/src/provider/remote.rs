use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::QuoteProvider;
use crate::error::MicroloanError;
use crate::types::{LoanQuoteRequest, LoanQuoteResult, Money, RepaymentFrequency};
use crate::MicroloanResult;

const CALCULATE_PATH: &str = "/loans/calculate/";

/// Smallest amount the calculate endpoint accepts. Lower than this is
/// rejected with a 400 even where the product bounds allow it.
pub const BACKEND_MIN_PRINCIPAL: Money = dec!(1000);

/// Asks the backend to price the loan. The backend is authoritative; its
/// numbers are mapped onto [`LoanQuoteResult`] unchanged.
#[derive(Debug, Clone)]
pub struct RemoteQuoteProvider {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct CalculateRequest {
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    term_days: u32,
}

#[derive(Debug, Deserialize)]
struct CalculateResponse {
    success: bool,
    #[serde(default)]
    calculation: Option<Calculation>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Calculation {
    #[serde(default)]
    loan_amount: Option<Money>,
    total_repayable: Money,
    daily_repayment: Money,
    /// Percent (8.5 = 8.5%)
    interest_rate: Decimal,
    disbursement_fee: Money,
    #[serde(default)]
    total_interest: Option<Money>,
}

impl RemoteQuoteProvider {
    pub fn new(base_url: &str, timeout: Duration) -> MicroloanResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MicroloanError::Config(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), CALCULATE_PATH),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn error_message(body: &CalculateResponse) -> String {
        if let Some(msg) = &body.error {
            return msg.clone();
        }
        match &body.errors {
            Some(serde_json::Value::Object(map)) => map
                .iter()
                .map(|(field, v)| format!("{field}: {}", flatten_error(v)))
                .collect::<Vec<_>>()
                .join("; "),
            Some(other) => flatten_error(other),
            None => "calculation failed".to_string(),
        }
    }

    fn into_quote(request: &LoanQuoteRequest, calc: Calculation) -> LoanQuoteResult {
        let principal = calc.loan_amount.unwrap_or(request.principal);
        let interest_amount = calc
            .total_interest
            .unwrap_or(calc.total_repayable - principal);
        let installments = request.frequency.installments(request.term_days);
        let periodic_payment = match request.frequency {
            RepaymentFrequency::Daily => calc.daily_repayment,
            _ => calc.total_repayable / Decimal::from(installments),
        };

        LoanQuoteResult {
            principal,
            term_days: request.term_days,
            frequency: request.frequency,
            interest_rate_percent: calc.interest_rate.normalize(),
            service_fee: calc.disbursement_fee,
            fee_deducted: false,
            interest_amount,
            total_due: calc.total_repayable,
            disbursed_amount: principal,
            installments,
            periodic_payment,
        }
    }
}

fn flatten_error(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(flatten_error)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[async_trait]
impl QuoteProvider for RemoteQuoteProvider {
    fn name(&self) -> &str {
        "remote"
    }

    async fn quote(&self, request: &LoanQuoteRequest) -> MicroloanResult<LoanQuoteResult> {
        let body = CalculateRequest {
            amount: request.principal,
            term_days: request.term_days,
        };
        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let response = req.send().await.map_err(|e| {
            tracing::warn!(endpoint = %self.endpoint, error = %e, "quote request failed");
            MicroloanError::Network(e.to_string())
        })?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| MicroloanError::Network(e.to_string()))?;

        let parsed: CalculateResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => {
                tracing::warn!(status = status.as_u16(), "backend returned non-JSON error");
                return Err(MicroloanError::Backend {
                    status: status.as_u16(),
                    message: status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string(),
                });
            }
        };

        if !status.is_success() || !parsed.success {
            let message = Self::error_message(&parsed);
            tracing::warn!(status = status.as_u16(), %message, "backend rejected quote");
            return Err(MicroloanError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let calc = parsed.calculation.ok_or_else(|| {
            MicroloanError::SerializationError("response missing `calculation`".into())
        })?;
        Ok(Self::into_quote(request, calc))
    }
}
