//! Configuration structures for the layout parser.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{FapiaoError, Result};
use crate::layout::LayoutCatalog;
use crate::models::invoice::TitleKind;

/// Main configuration for fapiao.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FapiaoConfig {
    /// Parser tolerances and marker phrases.
    pub parser: ParserConfig,

    /// Layout catalog replacing the built-in one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layouts: Option<LayoutCatalog>,
}

/// Parser tolerances and marker phrases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Margin added above the title line and below the closing line when
    /// inferring invoice bounds.
    pub bounds_margin: i32,

    /// Tokens whose top is within this distance of the topmost details token
    /// form the table header row.
    pub header_tolerance: i32,

    /// Header phrase of the column that anchors table rows.
    pub pivot_column: String,

    /// Title phrases checked in order; the first hit decides the kind.
    pub title_markers: Vec<TitleMarker>,
}

/// A phrase that classifies the invoice title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleMarker {
    pub phrase: String,
    pub kind: TitleKind,
}

impl TitleMarker {
    pub fn new(phrase: impl Into<String>, kind: TitleKind) -> Self {
        Self {
            phrase: phrase.into(),
            kind,
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            bounds_margin: 20,
            header_tolerance: 10,
            pivot_column: "税额".to_string(),
            title_markers: vec![
                TitleMarker::new("增值税", TitleKind::VatSpecial),
                TitleMarker::new("普通", TitleKind::Ordinary),
            ],
        }
    }
}

impl FapiaoConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the parser cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.parser.pivot_column.is_empty() {
            return Err(FapiaoError::Config("parser.pivot_column must not be empty".to_string()));
        }
        if self.parser.header_tolerance < 0 || self.parser.bounds_margin < 0 {
            return Err(FapiaoError::Config(
                "parser tolerances must not be negative".to_string(),
            ));
        }
        if let Some(catalog) = &self.layouts {
            let issues = catalog.validate();
            if !issues.is_empty() {
                return Err(FapiaoError::Config(issues.join("; ")));
            }
        }
        Ok(())
    }

    /// The layout catalog to parse with.
    pub fn catalog(&self) -> Arc<LayoutCatalog> {
        match &self.layouts {
            Some(catalog) => Arc::new(catalog.clone()),
            None => LayoutCatalog::builtin(),
        }
    }
}
