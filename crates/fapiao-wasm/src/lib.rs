//! WASM bindings for Chinese invoice layout parsing.
//!
//! This crate provides WebAssembly bindings for use in browsers and Node.js.
//! Token dumps go in as JSON strings; parsed documents come back as plain
//! JavaScript objects.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use fapiao_core::invoice::rules::parse_amount as core_parse_amount;
use fapiao_core::invoice::{InvoiceParser, LayoutParser, classify_title as core_classify_title};
use fapiao_core::layout::LayoutCatalog;
use fapiao_core::models::config::{FapiaoConfig, ParserConfig};
use fapiao_core::models::invoice::InvoiceDocument;
use fapiao_core::ocr::TokenSet;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    // Plain objects instead of ES2015 Maps for the segment and row maps
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_with(parser: &LayoutParser, json: &str) -> Result<InvoiceDocument, JsValue> {
    let tokens = TokenSet::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    parser
        .parse_set(&tokens)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Parse an invoice from a JSON token dump with the built-in layouts.
///
/// Accepts a bare token array, `{"tokens": [...]}` or `{"ocr_info": [...]}`.
#[wasm_bindgen]
pub fn parse_tokens(json: &str) -> Result<JsValue, JsValue> {
    let document = parse_with(&LayoutParser::new(), json)?;
    to_js(&document)
}

/// Parse an invoice and return the document as a JSON string.
#[wasm_bindgen]
pub fn parse_tokens_to_json(json: &str) -> Result<String, JsValue> {
    let document = parse_with(&LayoutParser::new(), json)?;
    serde_json::to_string(&document).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Classify an invoice title from its title-line texts.
///
/// Returns the display label, e.g. `电子发票（普通发票）`.
#[wasm_bindgen]
pub fn classify_title(texts: Vec<String>) -> String {
    let markers = ParserConfig::default().title_markers;
    core_classify_title(&texts, &markers).label().to_string()
}

/// Parse an amount such as `¥1,130.00`.
#[wasm_bindgen]
pub fn parse_amount(amount: &str) -> Option<f64> {
    core_parse_amount(amount).and_then(|d| d.to_string().parse().ok())
}

/// Names of the built-in layouts, in selection order.
#[wasm_bindgen]
pub fn layout_names() -> js_sys::Array {
    LayoutCatalog::builtin()
        .variants
        .iter()
        .map(|variant| JsValue::from_str(&variant.name))
        .collect()
}

/// Invoice parser class for browser use.
#[wasm_bindgen]
pub struct InvoiceParserJs {
    parser: LayoutParser,
}

#[wasm_bindgen]
impl InvoiceParserJs {
    /// Create a parser with the built-in layouts.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            parser: LayoutParser::new(),
        }
    }

    /// Create a parser from a JSON configuration (same shape as the CLI config file).
    #[wasm_bindgen(js_name = fromConfig)]
    pub fn from_config(json: &str) -> Result<InvoiceParserJs, JsValue> {
        let config: FapiaoConfig =
            serde_json::from_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        config
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(Self {
            parser: LayoutParser::from_config(&config),
        })
    }

    /// Set the margin kept around the title and closing lines.
    #[wasm_bindgen]
    pub fn set_bounds_margin(&mut self, margin: i32) {
        self.parser = self.parser.clone().with_bounds_margin(margin);
    }

    /// Set the height of the table header band.
    #[wasm_bindgen]
    pub fn set_header_tolerance(&mut self, tolerance: i32) {
        self.parser = self.parser.clone().with_header_tolerance(tolerance);
    }

    /// Parse a JSON token dump.
    #[wasm_bindgen]
    pub fn parse(&self, json: &str) -> Result<JsValue, JsValue> {
        let document = parse_with(&self.parser, json)?;
        to_js(&document)
    }

    /// Parse a JSON token dump and return only the non-fatal issues.
    #[wasm_bindgen]
    pub fn issues(&self, json: &str) -> Result<Vec<String>, JsValue> {
        let document = parse_with(&self.parser, json)?;
        Ok(document.validate())
    }
}

impl Default for InvoiceParserJs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    const LEGACY: &str = r#"[
        {"text": "增值税普通发票", "bbox": [300, 20, 700, 60]},
        {"text": "开户行及账号：工商银行 0200", "bbox": [40, 200, 560, 220]}
    ]"#;

    #[wasm_bindgen_test]
    fn test_parse_tokens_to_json() {
        let json = parse_tokens_to_json(LEGACY).unwrap();
        assert!(json.contains("\"layout\":\"legacy_vat\""));
    }

    #[wasm_bindgen_test]
    fn test_classify_title() {
        assert_eq!(
            classify_title(vec!["电子发票（普通发票）".to_string()]),
            "电子发票（普通发票）"
        );
        assert_eq!(classify_title(vec![]), "未识别发票");
    }

    #[wasm_bindgen_test]
    fn test_parse_amount() {
        let amount = parse_amount("¥1,130.50");
        assert!(amount.is_some());
        assert!((amount.unwrap() - 1130.5).abs() < 0.001);
        assert!(parse_amount("n/a").is_none());
    }

    #[wasm_bindgen_test]
    fn test_parser_issues() {
        let parser = InvoiceParserJs::new();
        let issues = parser.issues(r#"[{"text": "RECEIPT", "bbox": [0, 0, 1, 1]}]"#).unwrap();
        assert_eq!(issues.len(), 1);
    }
}
