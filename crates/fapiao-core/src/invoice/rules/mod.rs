//! Rule-based normalisation of resolved field texts into typed values.

pub mod amounts;
pub mod dates;
pub mod party;
pub mod patterns;

pub use amounts::{AmountExtractor, parse_amount, sum_amounts};
pub use dates::{DateExtractor, extract_date};
pub use party::{TaxIdExtractor, extract_party, labeled_value};

use std::collections::BTreeMap;

use crate::layout::SegmentName;
use crate::models::invoice::{InvoiceFields, Segment, Table};
use patterns::{DIGIT_RUN, INVOICE_CODE, INVOICE_NUMBER};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

const TAX_ID_LABELS: [&str; 2] = ["统一社会信用代码", "纳税人识别号"];

/// Derive typed fields from the parsed segments and line-item table.
pub fn normalize_fields(
    segments: &BTreeMap<SegmentName, Segment>,
    table: &Table,
    pivot: &str,
) -> InvoiceFields {
    let header = segments.get(&SegmentName::Header);
    let header_field = |phrase: &str| header.and_then(|seg| seg.field(phrase));

    let invoice_number = header_field("发票号码").and_then(|text| {
        INVOICE_NUMBER
            .captures(text)
            .map(|caps| caps[1].to_string())
            .or_else(|| DIGIT_RUN.find(text).map(|m| m.as_str().to_string()))
    });

    let invoice_code = header_field("发票代码")
        .and_then(|text| INVOICE_CODE.captures(text).map(|caps| caps[1].to_string()));

    let issue_date = header_field("开票日期").and_then(extract_date);

    let buyer = segments
        .get(&SegmentName::Buyer)
        .map(|seg| extract_party(seg, &TAX_ID_LABELS))
        .unwrap_or_default();
    let seller = segments
        .get(&SegmentName::Seller)
        .map(|seg| extract_party(seg, &TAX_ID_LABELS))
        .unwrap_or_default();

    let total_amount = segments
        .get(&SegmentName::Summary)
        .and_then(|seg| seg.field("小写"))
        .and_then(|text| AmountExtractor::new().extract(text));

    let total_tax = table
        .columns
        .iter()
        .find(|col| col.name.contains(pivot))
        .and_then(|col| {
            sum_amounts(
                table
                    .rows
                    .iter()
                    .filter_map(|row| row.get(&col.name).and_then(|cell| cell.as_deref())),
            )
        });

    InvoiceFields {
        invoice_code,
        invoice_number,
        issue_date,
        buyer,
        seller,
        total_amount,
        total_tax,
    }
}
