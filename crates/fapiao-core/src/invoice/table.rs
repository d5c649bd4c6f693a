//! Line-item table reconstruction from token geometry.
//!
//! Invoice tables are printed without reliable grid lines, so the structure is
//! rebuilt from boxes alone: the topmost band of tokens names the columns, the
//! pivot column's values mark where rows start, and each value token is
//! dropped into the row/column cell it overlaps.

use tracing::debug;

use crate::geometry::Rect;
use crate::models::invoice::{Table, TableColumn, TableRow};
use crate::ocr::Token;

/// A token with a well-formed box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedToken<'a> {
    pub text: &'a str,
    pub rect: Rect,
}

impl<'a> PlacedToken<'a> {
    pub fn new(text: &'a str, rect: Rect) -> Self {
        Self { text, rect }
    }
}

/// Tokens inside `region`, in OCR order.
pub fn placed_in<'a>(tokens: &'a [Token], region: &Rect) -> Vec<PlacedToken<'a>> {
    tokens
        .iter()
        .filter_map(|tok| tok.rect().map(|rect| PlacedToken::new(&tok.text, rect)))
        .filter(|placed| region.contains_rect(&placed.rect))
        .collect()
}

/// Settings for one reconstruction.
#[derive(Debug, Clone, Copy)]
pub struct TableSettings<'a> {
    /// Header phrase of the row-anchoring column.
    pub pivot: &'a str,
    /// Height of the header band below the topmost token.
    pub header_tolerance: i32,
}

/// Rebuild the table from the tokens of the details region.
///
/// Returns an empty table when there is nothing to read (no tokens, no header
/// row) and `None` when a header row exists but no column can serve as the
/// pivot, even after merging a split pivot header.
///
/// When several value tokens overlap the same cell, the one latest in OCR
/// order wins.
pub fn reconstruct_table(tokens: &[PlacedToken<'_>], settings: &TableSettings<'_>) -> Option<Table> {
    let Some(head_row) = tokens.iter().map(|tok| tok.rect.top).min() else {
        return Some(Table::default());
    };
    let header_limit = head_row.saturating_add(settings.header_tolerance);

    let (header, values): (Vec<&PlacedToken<'_>>, Vec<&PlacedToken<'_>>) =
        tokens.iter().partition(|tok| tok.rect.top < header_limit);

    if header.is_empty() {
        return Some(Table::default());
    }

    let mut columns: Vec<TableColumn> = header
        .iter()
        .map(|tok| TableColumn {
            name: tok.text.to_string(),
            left: tok.rect.left,
            right: tok.rect.right,
        })
        .collect();
    columns.sort_by_key(|col| col.left);

    let pivot = pivot_column(&mut columns, settings.pivot)?;
    let boundaries = row_boundaries(&values, &columns[pivot]);

    let rows: Vec<TableRow> = boundaries
        .windows(2)
        .map(|band| fill_row(&columns, band[0], band[1], &values))
        .collect();

    debug!(
        "Reconstructed table with {} columns and {} rows",
        columns.len(),
        rows.len()
    );

    Some(Table { columns, rows })
}

/// Index of the pivot column, merging a split pivot header if needed.
///
/// OCR sometimes splits the pivot header into two adjacent tokens at the right
/// edge of the table (`税` + `额`). Columns must be sorted by `left`.
fn pivot_column(columns: &mut Vec<TableColumn>, pivot: &str) -> Option<usize> {
    if let Some(index) = columns.iter().position(|col| col.name.contains(pivot)) {
        return Some(index);
    }

    let n = columns.len();
    if n < 2 {
        debug!("No {:?} column among {} header tokens", pivot, n);
        return None;
    }

    let joined = format!("{}{}", columns[n - 2].name, columns[n - 1].name);
    if joined != pivot {
        debug!("No {:?} column and last two headers do not merge into it", pivot);
        return None;
    }

    let last = columns.remove(n - 1);
    let merged = &mut columns[n - 2];
    debug!(
        "Merged split header {:?} + {:?} into {:?}",
        merged.name, last.name, pivot
    );
    merged.name = pivot.to_string();
    merged.right = merged.right.max(last.right);

    Some(n - 2)
}

/// Sorted row boundaries: the top of every value token overlapping the pivot
/// column, followed by the lowest bottom among them.
fn row_boundaries(values: &[&PlacedToken<'_>], pivot: &TableColumn) -> Vec<i32> {
    let mut boundaries = Vec::new();
    let mut bottom: Option<i32> = None;

    for tok in values {
        if tok.rect.left < pivot.right && tok.rect.right > pivot.left {
            boundaries.push(tok.rect.top);
            bottom = Some(bottom.map_or(tok.rect.bottom, |b| b.max(tok.rect.bottom)));
        }
    }

    if let Some(bottom) = bottom {
        boundaries.push(bottom);
    }
    boundaries.sort_unstable();
    boundaries
}

/// Fill one row band `[top, next_top)`.
fn fill_row(columns: &[TableColumn], top: i32, next_top: i32, values: &[&PlacedToken<'_>]) -> TableRow {
    let mut row: TableRow = columns.iter().map(|col| (col.name.clone(), None)).collect();
    let bottom = next_top.saturating_sub(1);

    for col in columns {
        let cell = Rect::new(col.left, top, col.right, bottom);
        for tok in values {
            if cell.intersects(&tok.rect) {
                row.insert(col.name.clone(), Some(tok.text.to_string()));
            }
        }
    }

    row
}
