use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.08 = 8%). Never as percentages.
pub type Rate = Decimal;

/// Currency code
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    KES,
    UGX,
    TZS,
    USD,
    Other(String),
}

impl Currency {
    /// Symbol shown in front of formatted amounts.
    pub fn symbol(&self) -> &str {
        match self {
            Currency::KES => "KSh",
            Currency::UGX => "USh",
            Currency::TZS => "TSh",
            Currency::USD => "$",
            Currency::Other(code) => code,
        }
    }
}

/// How often the borrower repays over the term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepaymentFrequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl RepaymentFrequency {
    pub fn period_days(self) -> u32 {
        match self {
            RepaymentFrequency::Daily => 1,
            RepaymentFrequency::Weekly => 7,
            RepaymentFrequency::Monthly => 30,
        }
    }

    /// Number of installments over `term_days`; a trailing partial period
    /// counts as a full installment.
    pub fn installments(self, term_days: u32) -> u32 {
        let period = self.period_days();
        term_days.div_ceil(period).max(1)
    }
}

/// A borrower's requested loan: principal in the base currency unit and a
/// repayment term in days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanQuoteRequest {
    pub principal: Money,
    pub term_days: u32,
    #[serde(default)]
    pub frequency: RepaymentFrequency,
}

impl LoanQuoteRequest {
    pub fn new(principal: Money, term_days: u32) -> Self {
        Self {
            principal,
            term_days,
            frequency: RepaymentFrequency::Daily,
        }
    }

    pub fn with_frequency(mut self, frequency: RepaymentFrequency) -> Self {
        self.frequency = frequency;
        self
    }
}

/// Full breakdown of a priced loan. Derived from a [`LoanQuoteRequest`] and
/// never mutated; a new selection produces a new quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanQuoteResult {
    pub principal: Money,
    pub term_days: u32,
    pub frequency: RepaymentFrequency,
    /// Nominal rate as shown to the borrower (8.5 = 8.5%)
    pub interest_rate_percent: Decimal,
    /// One-time fee charged at issuance
    pub service_fee: Money,
    /// Whether `service_fee` was taken out of the disbursement
    pub fee_deducted: bool,
    pub interest_amount: Money,
    /// principal + interest_amount
    pub total_due: Money,
    /// Net amount paid out to the borrower
    pub disbursed_amount: Money,
    pub installments: u32,
    /// total_due / installments
    pub periodic_payment: Money,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installment_counts() {
        assert_eq!(RepaymentFrequency::Daily.installments(30), 30);
        assert_eq!(RepaymentFrequency::Weekly.installments(28), 4);
        assert_eq!(RepaymentFrequency::Weekly.installments(30), 5);
        assert_eq!(RepaymentFrequency::Monthly.installments(90), 3);
        assert_eq!(RepaymentFrequency::Monthly.installments(15), 1);
    }

    #[test]
    fn test_request_frequency_defaults_to_daily() {
        let req: LoanQuoteRequest =
            serde_json::from_str(r#"{"principal": "5000", "term_days": 30}"#).unwrap();
        assert_eq!(req.frequency, RepaymentFrequency::Daily);
        assert_eq!(req.term_days, 30);
    }

    #[test]
    fn test_currency_symbols() {
        assert_eq!(Currency::default().symbol(), "KSh");
        assert_eq!(Currency::Other("ZMW".into()).symbol(), "ZMW");
    }
}
