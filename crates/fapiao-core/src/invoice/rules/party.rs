//! Buyer and seller normalisation.

use super::FieldExtractor;
use super::patterns::{LABEL_SEPARATOR, TAX_ID};
use crate::models::invoice::Party;
use crate::models::invoice::Segment;

/// Taxpayer id extractor (unified social credit code or legacy id).
pub struct TaxIdExtractor;

impl TaxIdExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TaxIdExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for TaxIdExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        TAX_ID
            .captures_iter(text)
            .map(|caps| caps[1].to_string())
            .collect()
    }
}

/// The text after `label`, with separators trimmed. `None` if empty.
pub fn labeled_value(text: &str, label: &str) -> Option<String> {
    let start = text.find(label)? + label.len();
    let rest = LABEL_SEPARATOR.replace(&text[start..], "");
    let value = rest.trim();

    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Build a party from a buyer or seller segment.
///
/// `id_labels` are tried in order; the first resolved field holding an id wins.
pub fn extract_party(segment: &Segment, id_labels: &[&str]) -> Party {
    let name = segment
        .field("名称")
        .and_then(|text| labeled_value(text, "名称"));

    let extractor = TaxIdExtractor::new();
    let tax_id = id_labels
        .iter()
        .filter_map(|label| segment.field(label))
        .find_map(|text| extractor.extract(text));

    let bank_account = segment
        .field("开户行及账号")
        .and_then(|text| labeled_value(text, "开户行及账号"));

    Party {
        name,
        tax_id,
        bank_account,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::layout::SegmentName;

    fn segment(fields: &[(&str, &str)]) -> Segment {
        Segment {
            name: SegmentName::Seller,
            region: Rect::default(),
            tokens: fields.iter().map(|(_, v)| v.to_string()).collect(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_labeled_value() {
        assert_eq!(
            labeled_value("名称：深圳市某某科技有限公司", "名称"),
            Some("深圳市某某科技有限公司".to_string())
        );
        assert_eq!(
            labeled_value("名 称:", "名 称"),
            None
        );
        assert_eq!(labeled_value("地址", "名称"), None);
    }

    #[test]
    fn test_tax_id() {
        let extractor = TaxIdExtractor::new();

        assert_eq!(
            extractor.extract("统一社会信用代码/纳税人识别号：91440300MA5G9ABC1X"),
            Some("91440300MA5G9ABC1X".to_string())
        );
        assert_eq!(extractor.extract("纳税人识别号：123"), None);
    }

    #[test]
    fn test_extract_party() {
        let seg = segment(&[
            ("名称", "名称：杭州某某餐饮有限公司"),
            ("统一社会信用代码", "统一社会信用代码/纳税人识别号：91330106MA2B0XYZ7K"),
        ]);

        let party = extract_party(&seg, &["统一社会信用代码", "纳税人识别号"]);

        assert_eq!(party.name.as_deref(), Some("杭州某某餐饮有限公司"));
        assert_eq!(party.tax_id.as_deref(), Some("91330106MA2B0XYZ7K"));
        assert_eq!(party.bank_account, None);
    }

    #[test]
    fn test_extract_legacy_party() {
        let seg = segment(&[
            ("名称", "名称：北京某某商贸有限公司"),
            ("纳税人识别号", "纳税人识别号：110105123456789"),
            ("开户行及账号", "开户行及账号：中国银行北京分行 3400 1234 5678"),
        ]);

        let party = extract_party(&seg, &["统一社会信用代码", "纳税人识别号"]);

        assert_eq!(party.tax_id.as_deref(), Some("110105123456789"));
        assert_eq!(party.bank_account.as_deref(), Some("中国银行北京分行 3400 1234 5678"));
    }
}
