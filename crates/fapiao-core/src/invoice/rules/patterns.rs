//! Common regex patterns for Chinese invoice field normalisation.
//!
//! CJK characters count as word characters, so `\b` never fires between a
//! label and the digits glued to it. Patterns use `\D` guards instead.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Invoice number: 8 digits on legacy invoices, 20 on digital ones
    pub static ref INVOICE_NUMBER: Regex = Regex::new(
        r"发票号码\s*[:：]?\s*(\d{8,20})"
    ).unwrap();

    // Invoice code (legacy invoices only)
    pub static ref INVOICE_CODE: Regex = Regex::new(
        r"发票代码\s*[:：]?\s*(\d{10,12})"
    ).unwrap();

    pub static ref DIGIT_RUN: Regex = Regex::new(
        r"\d{8,20}"
    ).unwrap();

    // 2024年03月15日
    pub static ref DATE_CJK: Regex = Regex::new(
        r"(\d{4})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日"
    ).unwrap();

    // 2024-03-15, 2024/03/15, 2024.03.15
    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"(?:^|\D)(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})(?:\D|$)"
    ).unwrap();

    // Unified social credit code (18) or legacy taxpayer id (15, 17, 20)
    pub static ref TAX_ID: Regex = Regex::new(
        r"(?:^|[^0-9A-Z])([0-9A-Z]{15,20})(?:[^0-9A-Z]|$)"
    ).unwrap();

    // Amount following a yuan sign
    pub static ref AMOUNT_WITH_CURRENCY: Regex = Regex::new(
        r"[¥￥]\s*(-?\d[\d,]*(?:\.\d+)?)"
    ).unwrap();

    pub static ref AMOUNT: Regex = Regex::new(
        r"-?\d[\d,]*(?:\.\d+)?"
    ).unwrap();

    // Label separators
    pub static ref LABEL_SEPARATOR: Regex = Regex::new(
        r"^[\s:：]+"
    ).unwrap();
}
