use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::currency::{convert, format_money, Currency};

/// Converts an INR amount for display in `currency`.
pub fn fmt_money(amount: Decimal, currency: Currency, rate: Decimal) -> String {
    format_money(convert(amount, currency, rate), currency)
}

pub fn fmt_pct(d: Decimal) -> String {
    format!("{}%", d.round_dp(1))
}

pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

pub fn iso(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

pub fn ellipsize(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_text_is_cut_with_an_ellipsis() {
        assert_eq!(ellipsize("Annual Sports Meet", 8), "Annual …");
        assert_eq!(ellipsize("Library", 8), "Library");
    }

    #[test]
    fn percent_keeps_one_decimal() {
        assert_eq!(fmt_pct(Decimal::new(7526, 2)), "75.3%");
    }
}
