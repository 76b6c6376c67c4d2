use std::time::Duration;

use clap::Args;
use serde_json::{json, Value};

use microloan_core::config::{ProductConfig, ProviderConfig};
use microloan_core::provider::{self, RemoteQuoteProvider};
use microloan_core::validation;

use super::quote::SelectionArgs;

/// Arguments for reconciling local and backend quotes
#[derive(Args)]
pub struct ReconcileArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Backend API base URL (overrides [provider] in the config)
    #[arg(long, env = "MLOAN_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Bearer token for the backend
    #[arg(long, env = "MLOAN_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,
}

pub async fn run_reconcile(
    args: ReconcileArgs,
    config: &ProductConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = args.selection.request()?;
    validation::validate(request.principal, request.term_days, &config.bounds)?;
    if request.principal < provider::BACKEND_MIN_PRINCIPAL {
        return Err(format!(
            "principal {} is within the product bounds but below the backend minimum of {}",
            request.principal,
            provider::BACKEND_MIN_PRINCIPAL
        )
        .into());
    }

    let (base_url, config_token, timeout) = match (&args.endpoint, &config.provider) {
        (Some(url), _) => (url.clone(), None, args.timeout),
        (
            None,
            ProviderConfig::Remote {
                base_url,
                timeout_seconds,
                token,
            },
        ) => (base_url.clone(), token.clone(), *timeout_seconds),
        (None, ProviderConfig::Local) => {
            return Err("--endpoint is required when the config has no remote provider".into())
        }
    };

    let mut remote = RemoteQuoteProvider::new(&base_url, Duration::from_secs(timeout))?;
    if let Some(token) = args.token.or(config_token) {
        remote = remote.with_token(token);
    }
    tracing::info!(endpoint = remote.endpoint(), "reconciling against backend");

    let local = config.local_provider();
    let rec = provider::reconcile(&local, &remote, &request).await?;

    Ok(json!({
        "result": {
            "left_provider": rec.left_provider,
            "right_provider": rec.right_provider,
            "principal": rec.request.principal,
            "term_days": rec.request.term_days,
            "max_difference": rec.max_difference,
            "tolerance": provider::RECONCILE_TOLERANCE,
            "agrees": rec.agrees,
        },
        "results": rec.fields,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::quote::FrequencyArg;
    use rust_decimal_macros::dec;

    fn args(principal: rust_decimal::Decimal, endpoint: Option<&str>) -> ReconcileArgs {
        ReconcileArgs {
            selection: SelectionArgs {
                principal: Some(principal),
                term_days: Some(30),
                frequency: FrequencyArg::Daily,
            },
            endpoint: endpoint.map(String::from),
            token: None,
            timeout: 2,
        }
    }

    #[tokio::test]
    async fn test_below_backend_minimum_rejected_before_request() {
        let err = run_reconcile(args(dec!(750), Some("http://127.0.0.1:1")), &ProductConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("backend minimum of 1000"));
    }

    #[tokio::test]
    async fn test_endpoint_required_without_remote_config() {
        let err = run_reconcile(args(dec!(5000), None), &ProductConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--endpoint"));
    }
}
