use std::time::Instant;

use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use microloan_core::config::{ProductConfig, ProviderConfig};
use microloan_core::format;
use microloan_core::pricing::{self, PriceQuoteInput, PricingPolicy};
use microloan_core::provider::QuoteProvider;
use microloan_core::validation::{self, QuoteBounds};
use microloan_core::{
    with_metadata, ComputationOutput, LoanQuoteRequest, LoanQuoteResult, RepaymentFrequency,
};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FrequencyArg {
    Daily,
    Weekly,
    Monthly,
}

impl From<FrequencyArg> for RepaymentFrequency {
    fn from(f: FrequencyArg) -> Self {
        match f {
            FrequencyArg::Daily => RepaymentFrequency::Daily,
            FrequencyArg::Weekly => RepaymentFrequency::Weekly,
            FrequencyArg::Monthly => RepaymentFrequency::Monthly,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModelArg {
    /// 8% a year, 2% fee clamped to 50..500 and deducted
    Annualized,
    /// 8.5% per term, flat 100 disbursement fee
    Flat,
}

impl From<ModelArg> for PricingPolicy {
    fn from(m: ModelArg) -> Self {
        match m {
            ModelArg::Annualized => PricingPolicy::annualized_simple(),
            ModelArg::Flat => PricingPolicy::flat_rate(),
        }
    }
}

/// Principal/term selection shared by every pricing command
#[derive(Args)]
pub struct SelectionArgs {
    /// Loan principal in KES
    #[arg(long, alias = "amount")]
    pub principal: Option<Decimal>,

    /// Repayment term in days
    #[arg(long, alias = "term")]
    pub term_days: Option<u32>,

    /// Repayment frequency
    #[arg(long, default_value = "daily")]
    pub frequency: FrequencyArg,
}

impl SelectionArgs {
    pub fn request(&self) -> Result<LoanQuoteRequest, Box<dyn std::error::Error>> {
        let principal = self
            .principal
            .ok_or("--principal is required (or provide --input)")?;
        let term_days = self
            .term_days
            .ok_or("--term-days is required (or provide --input)")?;
        Ok(LoanQuoteRequest::new(principal, term_days).with_frequency(self.frequency.into()))
    }
}

/// Arguments for pricing a loan
#[derive(Args)]
pub struct QuoteArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Override the configured rate model (prices in-process)
    #[arg(long)]
    pub model: Option<ModelArg>,

    /// Price in-process even when the config selects the backend
    #[arg(long)]
    pub local: bool,
}

/// Arguments for a bounds check
#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
}

/// Arguments for the rate model comparison
#[derive(Args)]
pub struct CompareArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
}

/// Quote input read from a file or a pipe. Policy and bounds left out
/// come from the product config.
#[derive(Debug, Deserialize)]
struct QuoteFileInput {
    principal: Decimal,
    term_days: u32,
    #[serde(default)]
    frequency: RepaymentFrequency,
    policy: Option<PricingPolicy>,
    bounds: Option<QuoteBounds>,
}

pub async fn run_quote(
    args: QuoteArgs,
    config: &ProductConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let supplied: Option<QuoteFileInput> = match args.input {
        Some(ref path) => Some(input::file::read_input(path)?),
        None => input::stdin::read_stdin()?,
    };
    let (request, file_policy, bounds) = match supplied {
        Some(i) => (
            LoanQuoteRequest::new(i.principal, i.term_days).with_frequency(i.frequency),
            i.policy,
            i.bounds.unwrap_or_else(|| config.bounds.clone()),
        ),
        None => (args.selection.request()?, None, config.bounds.clone()),
    };
    let policy = args.model.map(PricingPolicy::from).or(file_policy);

    let output = match (&config.provider, policy) {
        // An explicit policy always prices in-process
        (ProviderConfig::Remote { .. }, None) if !args.local => {
            let provider = config.provider()?;
            quote_from_provider(provider.as_ref(), &request, &bounds).await?
        }
        (_, policy) => pricing::price_quote(&PriceQuoteInput {
            principal: request.principal,
            term_days: request.term_days,
            frequency: request.frequency,
            policy: policy.unwrap_or_else(|| config.pricing.clone()),
            bounds,
        })?,
    };
    let display = config.formatter().display(&output.result);

    let mut value = serde_json::to_value(&output)?;
    value["display"] = serde_json::to_value(display)?;
    Ok(value)
}

async fn quote_from_provider(
    provider: &dyn QuoteProvider,
    request: &LoanQuoteRequest,
    bounds: &QuoteBounds,
) -> Result<ComputationOutput<LoanQuoteResult>, Box<dyn std::error::Error>> {
    let start = Instant::now();
    bounds.check()?;
    validation::validate(request.principal, request.term_days, bounds)?;
    let quote = provider.quote(request).await?;
    tracing::debug!(provider = provider.name(), "quote served by configured provider");

    Ok(with_metadata(
        &format!("Loan quote — {} provider", provider.name()),
        &json!({ "provider": provider.name(), "bounds": bounds }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        quote,
    ))
}

pub fn run_validate(
    args: ValidateArgs,
    config: &ProductConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = args.selection.request()?;
    let validated = validation::validate(request.principal, request.term_days, &config.bounds)?;
    Ok(json!({
        "valid": true,
        "principal": validated.principal(),
        "term_days": validated.term_days(),
        "bounds": config.bounds,
    }))
}

pub fn run_compare(
    args: CompareArgs,
    config: &ProductConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = args.selection.request()?;
    validation::validate(request.principal, request.term_days, &config.bounds)?;
    let comparison = pricing::compare_models(&request)?;

    let formatter = config.formatter();
    let row = |model: &str, q: &LoanQuoteResult| {
        json!({
            "model": model,
            "interest_rate": format::format_percent(q.interest_rate_percent),
            "interest": formatter.format(q.interest_amount),
            "fee": formatter.format(q.service_fee),
            "fee_deducted": q.fee_deducted,
            "you_receive": formatter.format(q.disbursed_amount),
            "total_due": formatter.format(q.total_due),
            "installment": formatter.format(q.periodic_payment),
        })
    };

    Ok(json!({
        "results": [
            row("annualized", &comparison.annualized),
            row("flat", &comparison.flat),
        ],
        "total_due_difference": comparison.total_due_difference,
        "disbursed_difference": comparison.disbursed_difference,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use rust_decimal_macros::dec;

    fn input_file(name: &str, body: &str) -> String {
        let path = std::env::temp_dir().join(format!("mloan-{}-{}", std::process::id(), name));
        std::fs::write(&path, body).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn file_args(path: String) -> QuoteArgs {
        QuoteArgs {
            input: Some(path),
            selection: SelectionArgs {
                principal: None,
                term_days: None,
                frequency: FrequencyArg::Daily,
            },
            model: None,
            local: false,
        }
    }

    fn total_due(value: &Value) -> Decimal {
        value["result"]["total_due"].as_str().unwrap().parse().unwrap()
    }

    fn remote_config(base_url: String) -> ProductConfig {
        ProductConfig {
            provider: ProviderConfig::Remote {
                base_url,
                timeout_seconds: 5,
                token: None,
            },
            ..ProductConfig::default()
        }
    }

    #[tokio::test]
    async fn test_file_input_priced_with_configured_policy() {
        let config = ProductConfig {
            pricing: PricingPolicy::annualized_simple(),
            ..ProductConfig::default()
        };
        let path = input_file("annualized.json", r#"{"principal": "5000", "term_days": 30}"#);
        let value = run_quote(file_args(path), &config).await.unwrap();

        assert_eq!(value["result"]["fee_deducted"], true);
        assert!(value["methodology"].as_str().unwrap().contains("Annualized"));
        assert_eq!(value["display"]["disbursed_amount"], "KSh 4,900");
    }

    #[tokio::test]
    async fn test_file_policy_wins_over_config() {
        let config = ProductConfig {
            pricing: PricingPolicy::annualized_simple(),
            ..ProductConfig::default()
        };
        let path = input_file(
            "flat.json",
            r#"{"principal": "10000", "term_days": 60,
                "policy": {"interest": {"model": "flat_per_term", "rate": "0.085"},
                           "fee": {"kind": "flat", "amount": "100"}}}"#,
        );
        let value = run_quote(file_args(path), &config).await.unwrap();
        assert_eq!(total_due(&value), dec!(10850));
        assert_eq!(value["result"]["fee_deducted"], false);
    }

    #[tokio::test]
    async fn test_quote_served_by_configured_backend() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/loans/calculate/");
                then.status(200).json_body(serde_json::json!({
                    "success": true,
                    "calculation": {
                        "loan_amount": 10000.0,
                        "term_days": 60,
                        "interest_rate": 8.5,
                        "total_repayable": 10850.0,
                        "daily_repayment": 180.83,
                        "total_interest": 850.0,
                        "disbursement_fee": 100.0
                    }
                }));
            })
            .await;

        let path = input_file("remote.json", r#"{"principal": "10000", "term_days": 60}"#);
        let value = run_quote(file_args(path), &remote_config(server.base_url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(total_due(&value), dec!(10850));
        assert!(value["methodology"].as_str().unwrap().contains("remote"));
        assert_eq!(value["display"]["total_due"], "KSh 10,850");
    }

    #[tokio::test]
    async fn test_local_flag_bypasses_backend() {
        let path = input_file("local.json", r#"{"principal": "10000", "term_days": 60}"#);
        let mut args = file_args(path);
        args.local = true;
        // Nothing listens on port 1; a backend call would fail
        let value = run_quote(args, &remote_config("http://127.0.0.1:1".into()))
            .await
            .unwrap();
        assert_eq!(total_due(&value), dec!(10850));
        assert!(value["methodology"].as_str().unwrap().contains("Flat"));
    }

    #[tokio::test]
    async fn test_backend_quote_still_bounds_checked() {
        let path = input_file("bounds.json", r#"{"principal": "5000", "term_days": 45}"#);
        let err = run_quote(file_args(path), &remote_config("http://127.0.0.1:1".into()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("45"));
    }

    fn selection(principal: Decimal, term_days: u32) -> SelectionArgs {
        SelectionArgs {
            principal: Some(principal),
            term_days: Some(term_days),
            frequency: FrequencyArg::Daily,
        }
    }

    #[test]
    fn test_validate_rejects_unoffered_term() {
        let args = ValidateArgs {
            selection: selection(dec!(5000), 45),
        };
        let err = run_validate(args, &ProductConfig::default()).unwrap_err();
        assert!(err.to_string().contains("45"));
    }

    #[test]
    fn test_compare_rows() {
        let args = CompareArgs {
            selection: selection(dec!(5000), 30),
        };
        let value = run_compare(args, &ProductConfig::default()).unwrap();
        let rows = value["results"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["you_receive"], "KSh 4,900");
        assert_eq!(rows[1]["interest_rate"], "8.5%");
    }

    #[test]
    fn test_missing_principal() {
        let args = SelectionArgs {
            principal: None,
            term_days: Some(30),
            frequency: FrequencyArg::Daily,
        };
        assert!(args.request().is_err());
    }
}
