//! Date extraction for Chinese invoices.

use chrono::NaiveDate;

use super::FieldExtractor;
use super::patterns::{DATE_CJK, DATE_NUMERIC};

/// Date field extractor.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = NaiveDate;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        // 2024年03月15日
        for caps in DATE_CJK.captures_iter(text) {
            if let Some(date) = ymd(&caps[1], &caps[2], &caps[3]) {
                results.push(date);
            }
        }

        // 2024-03-15 or 2024/03/15
        for caps in DATE_NUMERIC.captures_iter(text) {
            if let Some(date) = ymd(&caps[1], &caps[2], &caps[3]) {
                if !results.contains(&date) {
                    results.push(date);
                }
            }
        }

        results
    }
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Extract the first date in a field text.
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    DateExtractor::new().extract(text)
}
