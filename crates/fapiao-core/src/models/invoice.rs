//! Parsed invoice document and its parts.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::layout::SegmentName;

/// Result of parsing one invoice's tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDocument {
    /// Name of the selected layout variant, `None` if no variant matched.
    pub layout: Option<String>,

    /// Inferred invoice bounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Rect>,

    /// Classified invoice kind.
    pub title: TitleKind,

    /// One entry per fixed segment name.
    pub segments: BTreeMap<SegmentName, Segment>,

    /// Line items reconstructed from the details segment.
    pub table: Table,

    /// Typed view over the resolved fields.
    pub fields: InvoiceFields,

    /// Non-fatal problems met while parsing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ParseIssue>,
}

impl InvoiceDocument {
    /// An empty document for tokens that match no known layout.
    pub fn unrecognized(mut issues: Vec<ParseIssue>) -> Self {
        issues.insert(0, ParseIssue::UnrecognizedLayout);
        Self {
            layout: None,
            bounds: None,
            title: TitleKind::Unrecognized,
            segments: SegmentName::ALL
                .iter()
                .map(|name| (*name, Segment::empty(*name)))
                .collect(),
            table: Table::default(),
            fields: InvoiceFields::default(),
            issues,
        }
    }

    /// Whether a layout variant was recognised.
    pub fn is_recognized(&self) -> bool {
        self.layout.is_some()
    }

    /// The parsed segment with the given name.
    pub fn segment(&self, name: SegmentName) -> Option<&Segment> {
        self.segments.get(&name)
    }

    /// Text resolved for `phrase` in segment `name`.
    pub fn field(&self, name: SegmentName, phrase: &str) -> Option<&str> {
        self.segment(name).and_then(|seg| seg.field(phrase))
    }

    /// Human-readable parse issues plus any core field left underived.
    pub fn validate(&self) -> Vec<String> {
        let mut problems: Vec<String> = self.issues.iter().map(|i| i.to_string()).collect();

        if self.is_recognized() {
            for missing in self.fields.missing() {
                problems.push(format!("could not derive {}", missing));
            }
        }

        problems
    }
}

/// Kind of invoice, read from the title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleKind {
    /// No classifying phrase found.
    #[default]
    Unrecognized,
    /// Ordinary invoice (普通发票).
    Ordinary,
    /// VAT special invoice (增值税专用发票).
    VatSpecial,
}

impl TitleKind {
    /// Label as printed on Chinese invoices.
    pub fn label(&self) -> &'static str {
        match self {
            TitleKind::Unrecognized => "未识别发票",
            TitleKind::Ordinary => "电子发票（普通发票）",
            TitleKind::VatSpecial => "电子发票（增值税专用发票）",
        }
    }
}

impl fmt::Display for TitleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A named region of the invoice and what was found in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub name: SegmentName,

    /// Absolute region the tokens were filtered into.
    pub region: Rect,

    /// Texts of tokens inside the region, in OCR order.
    pub tokens: Vec<String>,

    /// Required phrase -> first token text containing it.
    pub fields: BTreeMap<String, String>,
}

impl Segment {
    pub fn empty(name: SegmentName) -> Self {
        Self {
            name,
            region: Rect::default(),
            tokens: Vec::new(),
            fields: BTreeMap::new(),
        }
    }

    pub fn field(&self, phrase: &str) -> Option<&str> {
        self.fields.get(phrase).map(String::as_str)
    }
}

/// A table column derived from a header token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    pub name: String,
    pub left: i32,
    pub right: i32,
}

/// Column name -> cell text. Every column has a key; empty cells are `None`.
pub type TableRow = BTreeMap<String, Option<String>>;

/// Reconstructed line-item table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Columns ordered left to right.
    pub columns: Vec<TableColumn>,
    /// Rows ordered top to bottom.
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell text at `row` under column `column`.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|c| c.as_deref())
    }

    /// Column names, left to right.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// A non-fatal problem met while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseIssue {
    /// No catalog keyword found in any token.
    UnrecognizedLayout,
    /// A required phrase matched no token in its segment.
    MissingField { segment: SegmentName, field: String },
    /// The details region has no usable pivot column.
    MalformedTable { pivot: String },
    /// Token at `index` does not have a four-value box.
    MalformedBox { index: usize },
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseIssue::UnrecognizedLayout => write!(f, "no known invoice layout recognised"),
            ParseIssue::MissingField { segment, field } => {
                write!(f, "missing field {:?} in {}", field, segment)
            }
            ParseIssue::MalformedTable { pivot } => {
                write!(f, "details table has no {:?} column", pivot)
            }
            ParseIssue::MalformedBox { index } => {
                write!(f, "token {} has a malformed bounding box", index)
            }
        }
    }
}

/// Buyer or seller details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Unified social credit code or taxpayer identification number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,

    /// Bank name and account, as printed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<String>,
}

/// Typed values normalised from the resolved field texts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,

    pub buyer: Party,

    pub seller: Party,

    /// Total including tax (价税合计, 小写).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,

    /// Sum of the 税额 column over all line items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tax: Option<Decimal>,
}

impl InvoiceFields {
    /// Names of the core fields that could not be derived.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.invoice_number.is_none() {
            missing.push("invoice_number");
        }
        if self.issue_date.is_none() {
            missing.push("issue_date");
        }
        if self.buyer.name.is_none() {
            missing.push("buyer.name");
        }
        if self.seller.name.is_none() {
            missing.push("seller.name");
        }
        if self.seller.tax_id.is_none() {
            missing.push("seller.tax_id");
        }
        if self.total_amount.is_none() {
            missing.push("total_amount");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_document_has_every_segment() {
        let doc = InvoiceDocument::unrecognized(vec![ParseIssue::MalformedBox { index: 3 }]);

        assert!(!doc.is_recognized());
        assert_eq!(doc.segments.len(), 6);
        assert_eq!(doc.issues[0], ParseIssue::UnrecognizedLayout);
        assert_eq!(doc.issues.len(), 2);
        assert!(doc.table.is_empty());
        assert_eq!(doc.title, TitleKind::Unrecognized);
    }

    #[test]
    fn test_table_cell_lookup() {
        let mut row = TableRow::new();
        row.insert("税额".to_string(), Some("13.00".to_string()));
        row.insert("数量".to_string(), None);
        let table = Table {
            columns: vec![],
            rows: vec![row],
        };

        assert_eq!(table.cell(0, "税额"), Some("13.00"));
        assert_eq!(table.cell(0, "数量"), None);
        assert_eq!(table.cell(1, "税额"), None);
    }

    #[test]
    fn test_issue_serialization() {
        let issue = ParseIssue::MissingField {
            segment: SegmentName::Header,
            field: "发票号码".to_string(),
        };
        let json = serde_json::to_value(&issue).unwrap();

        assert_eq!(json["kind"], "missing_field");
        assert_eq!(json["segment"], "header");
    }

    #[test]
    fn test_title_labels() {
        assert_eq!(TitleKind::default().label(), "未识别发票");
        assert_eq!(TitleKind::VatSpecial.to_string(), "电子发票（增值税专用发票）");
    }

    #[test]
    fn test_missing_fields() {
        let fields = InvoiceFields {
            invoice_number: Some("1".to_string()),
            ..Default::default()
        };

        assert!(!fields.missing().contains(&"invoice_number"));
        assert!(fields.missing().contains(&"total_amount"));
    }
}
