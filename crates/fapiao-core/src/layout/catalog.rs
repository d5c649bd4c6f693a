//! Catalog of known invoice layouts.
//!
//! Each variant is recognised by one keyword and carves the invoice bounds
//! into the six fixed segments. The catalog is plain data: it is built once,
//! shared behind an `Arc`, and never mutated while parsing.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::geometry::RelativeRect;
use crate::ocr::Token;

/// The fixed set of semantic regions on an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentName {
    Title,
    Header,
    Buyer,
    Seller,
    Details,
    Summary,
}

impl SegmentName {
    /// All segments in parse order.
    pub const ALL: [SegmentName; 6] = [
        SegmentName::Title,
        SegmentName::Header,
        SegmentName::Buyer,
        SegmentName::Seller,
        SegmentName::Details,
        SegmentName::Summary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentName::Title => "title",
            SegmentName::Header => "header",
            SegmentName::Buyer => "buyer",
            SegmentName::Seller => "seller",
            SegmentName::Details => "details",
            SegmentName::Summary => "summary",
        }
    }

    /// How tokens in this segment are interpreted.
    pub fn kind(&self) -> SegmentKind {
        match self {
            SegmentName::Title => SegmentKind::Title,
            SegmentName::Details => SegmentKind::Table,
            _ => SegmentKind::Fields,
        }
    }
}

impl fmt::Display for SegmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extraction strategy for a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Resolve required field phrases to token texts.
    Fields,
    /// Classify the invoice kind from title tokens.
    Title,
    /// Rebuild the line-item table.
    Table,
}

/// Where a segment sits and which phrases it must yield.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentTemplate {
    /// Region as percentages of the invoice bounds.
    pub rect: RelativeRect,

    /// Field phrases, matched as substrings of token text.
    #[serde(default)]
    pub required_fields: Vec<String>,
}

impl SegmentTemplate {
    pub fn new(rect: RelativeRect, required_fields: &[&str]) -> Self {
        Self {
            rect,
            required_fields: required_fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// One known invoice template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutVariant {
    /// Short identifier, e.g. `electronic`.
    pub name: String,

    /// Phrase whose presence in any token selects this variant.
    pub keyword: String,

    /// Phrase anchoring the top of the invoice bounds.
    pub title_marker: String,

    /// Phrase anchoring the bottom of the invoice bounds.
    pub total_marker: String,

    /// Segment templates. A missing segment resolves to an empty region.
    pub segments: BTreeMap<SegmentName, SegmentTemplate>,
}

impl LayoutVariant {
    pub fn new(
        name: impl Into<String>,
        keyword: impl Into<String>,
        title_marker: impl Into<String>,
        total_marker: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            keyword: keyword.into(),
            title_marker: title_marker.into(),
            total_marker: total_marker.into(),
            segments: BTreeMap::new(),
        }
    }

    /// Add or replace a segment template.
    pub fn with_segment(mut self, name: SegmentName, template: SegmentTemplate) -> Self {
        self.segments.insert(name, template);
        self
    }

    pub fn segment(&self, name: SegmentName) -> Option<&SegmentTemplate> {
        self.segments.get(&name)
    }

    /// Check whether any token mentions this variant's keyword.
    pub fn matches(&self, tokens: &[Token]) -> bool {
        tokens.iter().any(|tok| tok.text.contains(&self.keyword))
    }

    /// Fully digital e-invoice (全电发票), identified by the unified social
    /// credit code label.
    pub fn electronic() -> Self {
        Self::new("electronic", "社会信用代码", "发票", "价税合计")
            .with_segment(
                SegmentName::Title,
                SegmentTemplate::new(RelativeRect::new(20, 0, 80, 20), &[]),
            )
            .with_segment(
                SegmentName::Header,
                SegmentTemplate::new(RelativeRect::new(70, 0, 100, 20), &["发票号码", "开票日期"]),
            )
            .with_segment(
                SegmentName::Buyer,
                SegmentTemplate::new(RelativeRect::new(1, 20, 50, 45), &["名称", "统一社会信用代码"]),
            )
            .with_segment(
                SegmentName::Seller,
                SegmentTemplate::new(RelativeRect::new(51, 20, 100, 45), &["名称", "统一社会信用代码"]),
            )
            .with_segment(
                SegmentName::Details,
                SegmentTemplate::new(RelativeRect::new(0, 43, 100, 90), &[]),
            )
            .with_segment(
                SegmentName::Summary,
                SegmentTemplate::new(RelativeRect::new(1, 90, 100, 100), &["小写"]),
            )
    }

    /// Pre-digital VAT invoice, identified by the bank account label. The
    /// seller block sits at the bottom, so its bank line closes the bounds.
    pub fn legacy_vat() -> Self {
        Self::new("legacy_vat", "开户行及账号", "发票", "开户行及账号")
            .with_segment(
                SegmentName::Title,
                SegmentTemplate::new(RelativeRect::new(20, 0, 80, 18), &[]),
            )
            .with_segment(
                SegmentName::Header,
                SegmentTemplate::new(
                    RelativeRect::new(60, 0, 100, 20),
                    &["发票代码", "发票号码", "开票日期"],
                ),
            )
            .with_segment(
                SegmentName::Buyer,
                SegmentTemplate::new(
                    RelativeRect::new(0, 18, 62, 42),
                    &["名称", "纳税人识别号", "开户行及账号"],
                ),
            )
            .with_segment(
                SegmentName::Details,
                SegmentTemplate::new(RelativeRect::new(0, 38, 100, 76), &[]),
            )
            .with_segment(
                SegmentName::Summary,
                SegmentTemplate::new(RelativeRect::new(0, 72, 100, 84), &["小写"]),
            )
            .with_segment(
                SegmentName::Seller,
                SegmentTemplate::new(
                    RelativeRect::new(0, 80, 62, 100),
                    &["名称", "纳税人识别号", "开户行及账号"],
                ),
            )
    }
}

lazy_static! {
    static ref BUILTIN_CATALOG: Arc<LayoutCatalog> = Arc::new(LayoutCatalog::new(vec![
        LayoutVariant::electronic(),
        LayoutVariant::legacy_vat(),
    ]));
}

/// Ordered list of layout variants.
///
/// Selection takes the first variant whose keyword appears, so variants with
/// more specific keywords must come first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutCatalog {
    pub variants: Vec<LayoutVariant>,
}

impl LayoutCatalog {
    pub fn new(variants: Vec<LayoutVariant>) -> Self {
        Self { variants }
    }

    /// The shared built-in catalog.
    pub fn builtin() -> Arc<LayoutCatalog> {
        Arc::clone(&BUILTIN_CATALOG)
    }

    /// Pick the first variant whose keyword occurs in any token.
    pub fn select(&self, tokens: &[Token]) -> Option<&LayoutVariant> {
        self.variants.iter().find(|variant| variant.matches(tokens))
    }

    pub fn get(&self, name: &str) -> Option<&LayoutVariant> {
        self.variants.iter().find(|variant| variant.name == name)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Check the catalog for entries that could never match sensibly.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for variant in &self.variants {
            if variant.name.is_empty() {
                issues.push("layout variant with empty name".to_string());
            }
            if variant.keyword.is_empty() {
                issues.push(format!("layout {}: empty keyword matches every invoice", variant.name));
            }

            for (name, template) in &variant.segments {
                let r = template.rect;
                let in_range = [r.left, r.top, r.right, r.bottom]
                    .iter()
                    .all(|v| (0..=100).contains(v));
                if !in_range {
                    issues.push(format!(
                        "layout {}: segment {} has percentages outside 0-100",
                        variant.name, name
                    ));
                }
            }
        }

        let mut seen = BTreeSet::new();
        let duplicates: BTreeSet<&str> = self
            .variants
            .iter()
            .map(|variant| variant.name.as_str())
            .filter(|name| !seen.insert(*name))
            .collect();
        for name in duplicates {
            issues.push(format!("layout {}: duplicate name", name));
        }

        issues
    }
}

impl Default for LayoutCatalog {
    fn default() -> Self {
        BUILTIN_CATALOG.as_ref().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(texts: &[&str]) -> Vec<Token> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Token::new(*t, 0, i as i32 * 10, 100, i as i32 * 10 + 8))
            .collect()
    }

    #[test]
    fn test_select_electronic() {
        let catalog = LayoutCatalog::builtin();
        let toks = tokens(&["电子发票（普通发票）", "统一社会信用代码/纳税人识别号：91310000"]);

        assert_eq!(catalog.select(&toks).map(|v| v.name.as_str()), Some("electronic"));
    }

    #[test]
    fn test_select_legacy() {
        let catalog = LayoutCatalog::builtin();
        let toks = tokens(&["增值税专用发票", "开户行及账号：工商银行 1234"]);

        assert_eq!(catalog.select(&toks).map(|v| v.name.as_str()), Some("legacy_vat"));
    }

    #[test]
    fn test_first_variant_wins_when_both_keywords_present() {
        let catalog = LayoutCatalog::builtin();
        let toks = tokens(&["开户行及账号", "社会信用代码"]);

        assert_eq!(catalog.select(&toks).map(|v| v.name.as_str()), Some("electronic"));
    }

    #[test]
    fn test_select_none() {
        let catalog = LayoutCatalog::builtin();
        let toks = tokens(&["Invoice", "Total"]);

        assert!(catalog.select(&toks).is_none());
    }

    #[test]
    fn test_order_is_configuration() {
        let catalog = LayoutCatalog::new(vec![LayoutVariant::legacy_vat(), LayoutVariant::electronic()]);
        let toks = tokens(&["开户行及账号", "社会信用代码"]);

        assert_eq!(catalog.select(&toks).map(|v| v.name.as_str()), Some("legacy_vat"));
    }

    #[test]
    fn test_builtin_has_all_segments() {
        let catalog = LayoutCatalog::builtin();
        for variant in &catalog.variants {
            for name in SegmentName::ALL {
                assert!(variant.segment(name).is_some(), "{} lacks {}", variant.name, name);
            }
        }
        assert!(catalog.validate().is_empty());
    }

    #[test]
    fn test_validate_flags_bad_entries() {
        let bad = LayoutVariant::new("broken", "", "发票", "价税合计").with_segment(
            SegmentName::Title,
            SegmentTemplate::new(RelativeRect::new(0, 0, 120, 10), &[]),
        );
        let issues = LayoutCatalog::new(vec![bad]).validate();

        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_validate_reports_each_duplicate_name_once() {
        let mut broken = LayoutVariant::electronic();
        broken.keyword = String::new();
        let catalog = LayoutCatalog::new(vec![
            LayoutVariant::electronic(),
            broken,
            LayoutVariant::legacy_vat(),
            LayoutVariant::electronic(),
            LayoutVariant::legacy_vat(),
        ]);
        let issues = catalog.validate();

        assert_eq!(
            issues,
            vec![
                "layout electronic: empty keyword matches every invoice".to_string(),
                "layout electronic: duplicate name".to_string(),
                "layout legacy_vat: duplicate name".to_string(),
            ]
        );
    }

    #[test]
    fn test_get_by_name() {
        let catalog = LayoutCatalog::builtin();

        assert_eq!(catalog.get("legacy_vat").map(|v| v.keyword.as_str()), Some("开户行及账号"));
        assert!(catalog.get("receipt").is_none());
    }

    #[test]
    fn test_segment_name_serde() {
        let json = serde_json::to_string(&SegmentName::Details).unwrap();
        assert_eq!(json, "\"details\"");
    }
}
