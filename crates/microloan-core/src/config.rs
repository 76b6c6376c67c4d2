//! Product configuration: the canonical pricing policy, the bounds a surface
//! enforces, display settings, and which quote provider to wire in.
//!
//! ```toml
//! currency = "KES"
//!
//! [pricing.interest]
//! model = "flat_per_term"
//! rate = "0.085"
//!
//! [pricing.fee]
//! kind = "flat"
//! amount = "100"
//!
//! [bounds]
//! min_principal = "500"
//! max_principal = "500000"
//!
//! [bounds.term]
//! policy = "discrete"
//! allowed = [15, 30, 60, 90]
//!
//! [provider]
//! kind = "remote"
//! base_url = "https://api.ubuntucap.co.ke/api"
//! timeout_seconds = 10
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MicroloanError;
use crate::format::CurrencyFormatter;
use crate::pricing::PricingPolicy;
use crate::provider::{LocalQuoteProvider, QuoteProvider};
use crate::types::Currency;
use crate::validation::QuoteBounds;
use crate::MicroloanResult;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    #[default]
    Local,
    Remote {
        base_url: String,
        #[serde(default = "default_timeout_seconds")]
        timeout_seconds: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
}

fn default_timeout_seconds() -> u64 {
    10
}

/// Overrides on top of the currency's own formatting. Unset keys follow
/// `currency`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thousands_separator: Option<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal_separator: Option<char>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductConfig {
    pub currency: Currency,
    pub pricing: PricingPolicy,
    pub bounds: QuoteBounds,
    pub display: DisplayConfig,
    pub provider: ProviderConfig,
}

impl ProductConfig {
    pub fn from_toml_str(s: &str) -> MicroloanResult<Self> {
        let config: ProductConfig = toml::from_str(s)?;
        config.check()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> MicroloanResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            MicroloanError::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), "loaded product config");
        Ok(config)
    }

    pub fn check(&self) -> MicroloanResult<()> {
        self.pricing.check()?;
        self.bounds.check()?;
        if let ProviderConfig::Remote {
            base_url,
            timeout_seconds,
            ..
        } = &self.provider
        {
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                return Err(MicroloanError::Config(format!(
                    "provider.base_url must be an http(s) URL, got '{base_url}'"
                )));
            }
            if *timeout_seconds == 0 {
                return Err(MicroloanError::Config(
                    "provider.timeout_seconds must be positive".into(),
                ));
            }
        }
        Ok(())
    }

    /// The product currency's formatter with any `[display]` overrides.
    pub fn formatter(&self) -> CurrencyFormatter {
        let mut formatter = CurrencyFormatter::for_currency(&self.currency);
        let display = &self.display;
        if let Some(symbol) = &display.symbol {
            formatter.symbol = symbol.clone();
        }
        if let Some(decimals) = display.decimals {
            formatter.decimals = decimals;
        }
        if let Some(sep) = display.thousands_separator {
            formatter.thousands_separator = sep;
        }
        if let Some(sep) = display.decimal_separator {
            formatter.decimal_separator = sep;
        }
        formatter
    }

    pub fn local_provider(&self) -> LocalQuoteProvider {
        LocalQuoteProvider::new(self.pricing.clone())
    }

    /// Build the configured provider.
    pub fn provider(&self) -> MicroloanResult<Box<dyn QuoteProvider>> {
        match &self.provider {
            ProviderConfig::Local => Ok(Box::new(self.local_provider())),
            #[cfg(feature = "remote")]
            ProviderConfig::Remote {
                base_url,
                timeout_seconds,
                token,
            } => {
                let mut remote = crate::provider::RemoteQuoteProvider::new(
                    base_url,
                    std::time::Duration::from_secs(*timeout_seconds),
                )?;
                if let Some(token) = token {
                    remote = remote.with_token(token.clone());
                }
                Ok(Box::new(remote))
            }
            #[cfg(not(feature = "remote"))]
            ProviderConfig::Remote { .. } => Err(MicroloanError::Config(
                "provider.kind = \"remote\" needs the `remote` feature".into(),
            )),
        }
    }
}
