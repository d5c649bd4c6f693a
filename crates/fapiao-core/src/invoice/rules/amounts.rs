//! Amount extraction for Chinese invoices.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::FieldExtractor;
use super::patterns::{AMOUNT, AMOUNT_WITH_CURRENCY};

/// Amount field extractor.
///
/// Prefers amounts written after a yuan sign; otherwise takes plain numbers.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = Decimal;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        if let Some(caps) = AMOUNT_WITH_CURRENCY.captures(text) {
            if let Some(amount) = parse_amount(&caps[1]) {
                return Some(amount);
            }
        }

        // Labels like 价税合计（小写） carry no digits, so the last number is the value
        self.extract_all(text).pop()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        AMOUNT
            .find_iter(text)
            .filter_map(|m| parse_amount(m.as_str()))
            .collect()
    }
}

/// Parse an amount such as `1,130.00` or `-56.60`.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .trim()
        .trim_start_matches(['¥', '￥'])
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned).ok()
}

/// Sum every parseable amount, `None` if there is none.
pub fn sum_amounts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Option<Decimal> {
    texts
        .into_iter()
        .filter_map(parse_amount)
        .fold(None, |acc, amount| Some(acc.unwrap_or(Decimal::ZERO) + amount))
}
