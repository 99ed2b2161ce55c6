use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    #[serde(alias = "inr")]
    Inr,
    #[serde(alias = "usd")]
    Usd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Inr => "₹",
            Currency::Usd => "$",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Currency::Inr => Currency::Usd,
            Currency::Usd => Currency::Inr,
        }
    }
}

/// Stored amounts are INR; USD applies the configured rate.
pub fn convert(amount: Decimal, currency: Currency, usd_rate: Decimal) -> Decimal {
    match currency {
        Currency::Inr => amount,
        Currency::Usd => amount * usd_rate,
    }
}

fn whole_digits(amount: Decimal) -> (bool, String) {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    (negative, rounded.abs().trunc().to_string())
}

fn group_western(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// last three digits, then pairs: 12,00,000
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut out = String::new();
    for (i, ch) in head.chars().enumerate() {
        if i > 0 && (head.len() - i) % 2 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push(',');
    out.push_str(tail);
    out
}

/// Whole-unit money text, e.g. `₹12,00,000` or `$2,000,000`.
pub fn format_money(amount: Decimal, currency: Currency) -> String {
    let (negative, digits) = whole_digits(amount);
    let grouped = match currency {
        Currency::Inr => group_indian(&digits),
        Currency::Usd => group_western(&digits),
    };
    let sign = if negative { "-" } else { "" };
    format!("{sign}{}{grouped}", currency.symbol())
}

/// Western thousands grouping without a symbol.
pub fn format_grouped(amount: Decimal) -> String {
    let (negative, digits) = whole_digits(amount);
    let sign = if negative { "-" } else { "" };
    format!("{sign}{}", group_western(&digits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn usd_conversion_uses_rate() {
        let rate = Decimal::from_str("0.012").unwrap();
        assert_eq!(convert(Decimal::from(1_000_000), Currency::Usd, rate), Decimal::from(12_000));
        assert_eq!(convert(Decimal::from(1_000_000), Currency::Inr, rate), Decimal::from(1_000_000));
    }

    #[test]
    fn indian_grouping() {
        assert_eq!(format_money(Decimal::from(1_200_000), Currency::Inr), "₹12,00,000");
        assert_eq!(format_money(Decimal::from(999), Currency::Inr), "₹999");
        assert_eq!(format_money(Decimal::from(12_345_678), Currency::Inr), "₹1,23,45,678");
    }

    #[test]
    fn western_grouping() {
        assert_eq!(format_money(Decimal::from(2_000_000), Currency::Usd), "$2,000,000");
        assert_eq!(format_grouped(Decimal::from_str("1500000.4").unwrap()), "1,500,000");
        assert_eq!(format_grouped(Decimal::from(-1234)), "-1,234");
    }

    #[test]
    fn currency_parses_either_case() {
        let c: Currency = serde_json::from_str("\"usd\"").unwrap();
        assert_eq!(c, Currency::Usd);
        assert_eq!(Currency::default(), Currency::Inr);
        assert_eq!(Currency::Inr.toggle(), Currency::Usd);
    }
}
