//! Layout-driven invoice parser.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::ExtractionError;
use crate::geometry::resolve;
use crate::layout::{BoundsMarkers, LayoutCatalog, SegmentKind, SegmentName, infer_bounds};
use crate::models::config::{FapiaoConfig, ParserConfig};
use crate::models::invoice::{InvoiceDocument, ParseIssue, Table, TitleKind};
use crate::ocr::{Token, TokenSet};

use super::rules::normalize_fields;
use super::segment::{classify_title, extract_segment};
use super::table::{TableSettings, placed_in, reconstruct_table};
use super::Result;

/// Trait for invoice parsing.
pub trait InvoiceParser {
    /// Parse one invoice from its OCR tokens, in scan order.
    fn parse(&self, tokens: &[Token]) -> Result<InvoiceDocument>;

    /// Parse a token dump.
    fn parse_set(&self, set: &TokenSet) -> Result<InvoiceDocument> {
        self.parse(&set.tokens)
    }
}

/// Parser that slices the invoice by a catalog of known layouts.
///
/// Holds only immutable data, so one instance can be shared across threads.
#[derive(Debug, Clone)]
pub struct LayoutParser {
    catalog: Arc<LayoutCatalog>,
    config: ParserConfig,
}

impl LayoutParser {
    /// Create a parser over the built-in catalog with default settings.
    pub fn new() -> Self {
        Self {
            catalog: LayoutCatalog::builtin(),
            config: ParserConfig::default(),
        }
    }

    /// Create a parser from a loaded configuration.
    pub fn from_config(config: &FapiaoConfig) -> Self {
        Self {
            catalog: config.catalog(),
            config: config.parser.clone(),
        }
    }

    /// Use a different layout catalog.
    pub fn with_catalog(mut self, catalog: Arc<LayoutCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Set the bounds margin.
    pub fn with_bounds_margin(mut self, margin: i32) -> Self {
        self.config.bounds_margin = margin;
        self
    }

    /// Set the table header tolerance.
    pub fn with_header_tolerance(mut self, tolerance: i32) -> Self {
        self.config.header_tolerance = tolerance;
        self
    }

    /// Set the pivot column phrase.
    pub fn with_pivot_column(mut self, pivot: impl Into<String>) -> Self {
        self.config.pivot_column = pivot.into();
        self
    }

    pub fn catalog(&self) -> &LayoutCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }
}

impl Default for LayoutParser {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceParser for LayoutParser {
    fn parse(&self, tokens: &[Token]) -> Result<InvoiceDocument> {
        if tokens.is_empty() {
            return Err(ExtractionError::EmptyInput);
        }

        let start = Instant::now();
        info!("Parsing invoice from {} tokens", tokens.len());

        let mut issues: Vec<ParseIssue> = tokens
            .iter()
            .enumerate()
            .filter(|(_, tok)| tok.rect().is_none())
            .map(|(index, _)| ParseIssue::MalformedBox { index })
            .collect();
        if !issues.is_empty() {
            warn!("{} tokens have malformed boxes and will be ignored", issues.len());
        }

        let Some(variant) = self.catalog.select(tokens) else {
            warn!("No known invoice layout recognised");
            return Ok(InvoiceDocument::unrecognized(issues));
        };
        info!("Selected layout {}", variant.name);

        let markers = BoundsMarkers {
            title: &variant.title_marker,
            total: &variant.total_marker,
            margin: self.config.bounds_margin,
        };
        let bounds = infer_bounds(tokens, &markers);
        debug!("Invoice bounds: {:?}", bounds);
        let frame = bounds.unwrap_or_default();

        let mut segments = BTreeMap::new();
        let mut title = TitleKind::Unrecognized;
        let mut table = Table::default();

        for name in SegmentName::ALL {
            let template = variant.segment(name);
            let region = resolve(&frame, template.map(|t| &t.rect));
            let required = template.map(|t| t.required_fields.as_slice()).unwrap_or(&[]);

            let segment = extract_segment(tokens, name, region, required);
            debug!(
                "Segment {} at [{}] holds {} tokens",
                name,
                region,
                segment.tokens.len()
            );

            for field in required.iter().filter(|f| !segment.fields.contains_key(*f)) {
                issues.push(ParseIssue::MissingField {
                    segment: name,
                    field: field.clone(),
                });
            }

            match name.kind() {
                SegmentKind::Fields => {}
                SegmentKind::Title => {
                    title = classify_title(&segment.tokens, &self.config.title_markers);
                    debug!("Title classified as {}", title);
                }
                SegmentKind::Table => {
                    let settings = TableSettings {
                        pivot: &self.config.pivot_column,
                        header_tolerance: self.config.header_tolerance,
                    };
                    match reconstruct_table(&placed_in(tokens, &region), &settings) {
                        Some(rebuilt) => table = rebuilt,
                        None => {
                            warn!("Details region has no {:?} column", self.config.pivot_column);
                            issues.push(ParseIssue::MalformedTable {
                                pivot: self.config.pivot_column.clone(),
                            });
                        }
                    }
                }
            }

            segments.insert(name, segment);
        }

        let fields = normalize_fields(&segments, &table, &self.config.pivot_column);

        debug!(
            "Parsed {} invoice with {} line items and {} issues in {:?}",
            variant.name,
            table.rows.len(),
            issues.len(),
            start.elapsed()
        );

        Ok(InvoiceDocument {
            layout: Some(variant.name.clone()),
            bounds,
            title,
            segments,
            table,
            fields,
            issues,
        })
    }
}
