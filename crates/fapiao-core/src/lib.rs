//! Core library for Chinese invoice (发票) layout parsing.
//!
//! This crate provides:
//! - Axis-aligned geometry over OCR token boxes
//! - A catalog of known invoice layouts selected by keyword
//! - Invoice bounds inference anchored on marker phrases
//! - Per-segment field extraction and title classification
//! - Line-item table reconstruction from token geometry alone
//! - Typed normalisation of extracted fields (dates, amounts, tax ids)

pub mod error;
pub mod geometry;
pub mod invoice;
pub mod layout;
pub mod models;
pub mod ocr;

pub use error::{ExtractionError, FapiaoError, Result};
pub use geometry::{RelativeRect, Rect, resolve};
pub use invoice::{InvoiceParser, LayoutParser};
pub use layout::{LayoutCatalog, LayoutVariant, SegmentName, SegmentTemplate, infer_bounds};
pub use models::config::{FapiaoConfig, ParserConfig};
pub use models::invoice::{
    InvoiceDocument, InvoiceFields, ParseIssue, Party, Segment, Table, TableColumn, TableRow,
    TitleKind,
};
pub use ocr::{Token, TokenSet};
