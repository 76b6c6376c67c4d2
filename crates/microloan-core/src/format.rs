//! Display formatting for quotes: `KSh 12,345`, `8.5%`, `30 days`.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::{Currency, LoanQuoteResult, Money, RepaymentFrequency};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyFormatter {
    pub symbol: String,
    /// Digits after the decimal separator
    pub decimals: u32,
    pub thousands_separator: char,
    pub decimal_separator: char,
}

impl Default for CurrencyFormatter {
    fn default() -> Self {
        Self::for_currency(&Currency::KES)
    }
}

/// Every monetary field of a quote as a display string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteDisplay {
    pub principal: String,
    pub interest_rate: String,
    pub service_fee: String,
    pub interest_amount: String,
    pub total_due: String,
    pub disbursed_amount: String,
    pub periodic_payment: String,
    pub payment_label: String,
    pub term: String,
}

impl CurrencyFormatter {
    pub fn for_currency(currency: &Currency) -> Self {
        Self {
            symbol: currency.symbol().to_string(),
            decimals: 0,
            thousands_separator: ',',
            decimal_separator: '.',
        }
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    /// Format without the currency symbol.
    pub fn format_number(&self, amount: Money) -> String {
        let rounded =
            amount.round_dp_with_strategy(self.decimals, RoundingStrategy::MidpointAwayFromZero);
        let digits = format!("{:.*}", self.decimals as usize, rounded.abs());
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (digits.as_str(), None),
        };

        let mut out = String::with_capacity(digits.len() + int_part.len() / 3 + 1);
        if rounded.is_sign_negative() && !rounded.is_zero() {
            out.push('-');
        }
        out.push_str(&group_thousands(int_part, self.thousands_separator));
        if let Some(frac) = frac_part {
            out.push(self.decimal_separator);
            out.push_str(frac);
        }
        out
    }

    pub fn format(&self, amount: Money) -> String {
        let number = self.format_number(amount);
        match number.strip_prefix('-') {
            Some(abs) => format!("-{} {}", self.symbol, abs),
            None => format!("{} {}", self.symbol, number),
        }
    }

    pub fn display(&self, quote: &LoanQuoteResult) -> QuoteDisplay {
        QuoteDisplay {
            principal: self.format(quote.principal),
            interest_rate: format_percent(quote.interest_rate_percent),
            service_fee: self.format(quote.service_fee),
            interest_amount: self.format(quote.interest_amount),
            total_due: self.format(quote.total_due),
            disbursed_amount: self.format(quote.disbursed_amount),
            periodic_payment: self.format(quote.periodic_payment),
            payment_label: payment_label(quote.frequency).to_string(),
            term: format_term(quote.term_days),
        }
    }
}

/// One decimal place, as the rate badge shows it.
pub fn format_percent(rate_percent: Decimal) -> String {
    let rounded = rate_percent.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.1}%", rounded)
}

pub fn format_term(term_days: u32) -> String {
    if term_days == 1 {
        "1 day".to_string()
    } else {
        format!("{term_days} days")
    }
}

pub fn payment_label(frequency: RepaymentFrequency) -> &'static str {
    match frequency {
        RepaymentFrequency::Daily => "Daily payment",
        RepaymentFrequency::Weekly => "Weekly payment",
        RepaymentFrequency::Monthly => "Monthly payment",
    }
}

fn group_thousands(int_part: &str, sep: char) -> String {
    let len = int_part.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_whole_shillings() {
        let f = CurrencyFormatter::default();
        assert_eq!(f.format(dec!(12345)), "KSh 12,345");
        assert_eq!(f.format(dec!(500)), "KSh 500");
        assert_eq!(f.format(dec!(1000000)), "KSh 1,000,000");
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        let f = CurrencyFormatter::default();
        assert_eq!(f.format(dec!(5032.5)), "KSh 5,033");
        assert_eq!(f.format(dec!(167.49)), "KSh 167");
    }

    #[test]
    fn test_two_decimals_pads() {
        let f = CurrencyFormatter::default().with_decimals(2);
        assert_eq!(f.format(dec!(4900)), "KSh 4,900.00");
        assert_eq!(f.format(dec!(180.833333)), "KSh 180.83");
        assert_eq!(f.format(dec!(0.005)), "KSh 0.01");
    }

    #[test]
    fn test_negative_amount() {
        let f = CurrencyFormatter::default();
        assert_eq!(f.format(dec!(-1234)), "-KSh 1,234");
        // rounds to zero: no sign
        assert_eq!(f.format(dec!(-0.2)), "KSh 0");
    }

    #[test]
    fn test_custom_separators() {
        let f = CurrencyFormatter {
            symbol: "USh".into(),
            decimals: 2,
            thousands_separator: '.',
            decimal_separator: ',',
        };
        assert_eq!(f.format(dec!(1234567.891)), "USh 1.234.567,89");
    }

    #[test]
    fn test_percent_and_term() {
        assert_eq!(format_percent(dec!(8.5)), "8.5%");
        assert_eq!(format_percent(dec!(8)), "8.0%");
        assert_eq!(format_term(30), "30 days");
        assert_eq!(format_term(1), "1 day");
    }
}
