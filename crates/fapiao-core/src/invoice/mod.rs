//! Invoice parsing: segment extraction, table reconstruction and field rules.

pub mod parser;
pub mod rules;
pub mod segment;
pub mod table;

pub use parser::{InvoiceParser, LayoutParser};
pub use segment::{classify_title, extract_segment, resolve_fields};
pub use table::{PlacedToken, TableSettings, placed_in, reconstruct_table};

use crate::error::ExtractionError;

/// Result type for invoice parsing.
pub type Result<T> = std::result::Result<T, ExtractionError>;
