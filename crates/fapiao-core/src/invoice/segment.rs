//! Segment field extraction and title classification.

use std::collections::BTreeMap;

use crate::geometry::Rect;
use crate::layout::SegmentName;
use crate::models::config::TitleMarker;
use crate::models::invoice::{Segment, TitleKind};
use crate::ocr::Token;

/// Collect the tokens inside `region` and resolve each required phrase.
///
/// A phrase resolves to the text of the first token (in OCR order) that
/// contains it; later matches are ignored. Phrases without a match are simply
/// absent from the segment's fields.
pub fn extract_segment(
    tokens: &[Token],
    name: SegmentName,
    region: Rect,
    required_fields: &[String],
) -> Segment {
    let texts: Vec<String> = tokens
        .iter()
        .filter(|tok| region.contains(&tok.bbox))
        .map(|tok| tok.text.clone())
        .collect();

    let fields = resolve_fields(&texts, required_fields);

    Segment {
        name,
        region,
        tokens: texts,
        fields,
    }
}

/// Map each phrase to the first text containing it.
pub fn resolve_fields(texts: &[String], phrases: &[String]) -> BTreeMap<String, String> {
    phrases
        .iter()
        .filter_map(|phrase| {
            texts
                .iter()
                .find(|text| text.contains(phrase.as_str()))
                .map(|text| (phrase.clone(), text.clone()))
        })
        .collect()
}

/// Classify the invoice from its title texts.
///
/// Texts are scanned in order and each is checked against the markers in
/// order; the first text that contains any marker decides.
pub fn classify_title(texts: &[String], markers: &[TitleMarker]) -> TitleKind {
    texts
        .iter()
        .find_map(|text| {
            markers
                .iter()
                .find(|marker| text.contains(marker.phrase.as_str()))
                .map(|marker| marker.kind)
        })
        .unwrap_or(TitleKind::Unrecognized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::ParserConfig;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_filters_by_region() {
        let tokens = vec![
            Token::new("发票号码：24312000000012345678", 700, 20, 990, 40),
            Token::new("开票日期：2024年03月15日", 700, 50, 990, 70),
            Token::new("名称：上海某某有限公司", 20, 220, 400, 240),
        ];

        let segment = extract_segment(
            &tokens,
            SegmentName::Header,
            Rect::new(690, 0, 1000, 200),
            &strings(&["发票号码", "开票日期"]),
        );

        assert_eq!(segment.tokens.len(), 2);
        assert_eq!(segment.field("发票号码"), Some("发票号码：24312000000012345678"));
        assert_eq!(segment.field("开票日期"), Some("开票日期：2024年03月15日"));
    }

    #[test]
    fn test_first_match_wins() {
        let texts = strings(&["名称：甲公司", "名称：乙公司"]);
        let fields = resolve_fields(&texts, &strings(&["名称"]));

        assert_eq!(fields.get("名称").map(String::as_str), Some("名称：甲公司"));
    }

    #[test]
    fn test_substring_match() {
        let texts = strings(&["统一社会信用代码/纳税人识别号：91310115MA1K4XXXXX"]);
        let fields = resolve_fields(&texts, &strings(&["统一社会信用代码"]));

        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_missing_field_is_absent() {
        let texts = strings(&["名称：甲公司"]);
        let fields = resolve_fields(&texts, &strings(&["名称", "统一社会信用代码"]));

        assert_eq!(fields.len(), 1);
        assert!(!fields.contains_key("统一社会信用代码"));
    }

    #[test]
    fn test_malformed_boxes_match_no_region() {
        let tokens = vec![Token {
            text: "名称：甲公司".to_string(),
            bbox: vec![10, 10, 20],
        }];

        let segment = extract_segment(
            &tokens,
            SegmentName::Buyer,
            Rect::new(0, 0, 1000, 1000),
            &strings(&["名称"]),
        );

        assert!(segment.tokens.is_empty());
        assert!(segment.fields.is_empty());
    }

    #[test]
    fn test_classify_title() {
        let markers = ParserConfig::default().title_markers;

        assert_eq!(
            classify_title(&strings(&["电子发票（增值税专用发票）"]), &markers),
            TitleKind::VatSpecial
        );
        assert_eq!(
            classify_title(&strings(&["电子发票（普通发票）"]), &markers),
            TitleKind::Ordinary
        );
        assert_eq!(
            classify_title(&strings(&["发票"]), &markers),
            TitleKind::Unrecognized
        );
    }

    #[test]
    fn test_classify_title_stops_at_first_classifying_token() {
        let markers = ParserConfig::default().title_markers;
        let texts = strings(&["国家税务总局", "普通发票", "增值税"]);

        assert_eq!(classify_title(&texts, &markers), TitleKind::Ordinary);
    }

    #[test]
    fn test_vat_marker_checked_before_ordinary() {
        let markers = ParserConfig::default().title_markers;

        assert_eq!(
            classify_title(&strings(&["增值税普通发票"]), &markers),
            TitleKind::VatSpecial
        );
    }
}
